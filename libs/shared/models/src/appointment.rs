use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::TimeOfDay;

pub const DEFAULT_SLOT_MINUTES: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    Audio,
    Video,
    Chat,
}

impl ConsultationType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "audio" => Some(ConsultationType::Audio),
            "video" => Some(ConsultationType::Video),
            "chat" => Some(ConsultationType::Chat),
            _ => None,
        }
    }
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsultationType::Audio => "audio",
            ConsultationType::Video => "video",
            ConsultationType::Chat => "chat",
        };
        f.write_str(name)
    }
}

/// A booked (or requested) visit. `time_slot` is the canonical slot START;
/// the display range is always derived from it plus `duration_minutes`,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub time_slot: TimeOfDay,
    pub duration_minutes: i32,
    pub consultation_type: ConsultationType,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Rendered range, e.g. "09:00 - 09:30".
    pub fn slot_label(&self) -> String {
        let end = self.time_slot.advanced_by(self.duration_minutes.max(0) as u16);
        format!("{} - {}", self.time_slot, end)
    }
}

/// Fields a booking supplies; the store assigns id, timestamps, and the
/// initial `pending` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub time_slot: TimeOfDay,
    pub duration_minutes: i32,
    pub consultation_type: ConsultationType,
}

/// Store-side filter; all fields conjunctive, `None` matches everything.
/// Date bounds are inclusive, so a single-day scan sets both to that day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl AppointmentQuery {
    pub fn for_doctor_on(doctor_id: Uuid, date: NaiveDate) -> Self {
        AppointmentQuery {
            doctor_id: Some(doctor_id),
            from_date: Some(date),
            to_date: Some(date),
            ..AppointmentQuery::default()
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        if self.doctor_id.is_some_and(|id| id != appointment.doctor_id) {
            return false;
        }
        if self.patient_id.is_some_and(|id| id != appointment.patient_id) {
            return false;
        }
        if self.status.is_some_and(|status| status != appointment.status) {
            return false;
        }
        if self.from_date.is_some_and(|from| appointment.appointment_date < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| appointment.appointment_date > to) {
            return false;
        }
        true
    }
}
