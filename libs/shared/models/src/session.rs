use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointment::ConsultationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Live => "live",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// One telemedicine encounter, tied to a single confirmed appointment.
///
/// `session_id` is the shareable token handed to participants
/// (`HS-<base36 millis>-<16 hex>`); `id` stays internal. Participant ids and
/// the consultation type are snapshots taken from the appointment when the
/// session is created, not live references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSession {
    pub id: Uuid,
    pub session_id: String,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub consultation_type: ConsultationType,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConsultationSession {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

/// Creation payload; the store assigns id and timestamps, status starts
/// `scheduled` and duration at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub session_id: String,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub consultation_type: ConsultationType,
}

/// Partial update applied by a state transition. `None` leaves a field
/// untouched, so serialized patches omit absent fields entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

impl SessionQuery {
    pub fn matches(&self, session: &ConsultationSession) -> bool {
        if self.doctor_id.is_some_and(|id| id != session.doctor_id) {
            return false;
        }
        if self.patient_id.is_some_and(|id| id != session.patient_id) {
            return false;
        }
        true
    }
}
