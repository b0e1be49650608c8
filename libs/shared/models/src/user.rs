use std::fmt;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::TimeOfDay;

/// Weekday names as they appear on the wire and in stored availability
/// windows ("Monday" .. "Sunday"). Only these seven exact names are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Monday" => Some(DayName::Monday),
            "Tuesday" => Some(DayName::Tuesday),
            "Wednesday" => Some(DayName::Wednesday),
            "Thursday" => Some(DayName::Thursday),
            "Friday" => Some(DayName::Friday),
            "Saturday" => Some(DayName::Saturday),
            "Sunday" => Some(DayName::Sunday),
            _ => None,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayName::Monday,
            Weekday::Tue => DayName::Tuesday,
            Weekday::Wed => DayName::Wednesday,
            Weekday::Thu => DayName::Thursday,
            Weekday::Fri => DayName::Friday,
            Weekday::Sat => DayName::Saturday,
            Weekday::Sun => DayName::Sunday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayName::Monday => "Monday",
            DayName::Tuesday => "Tuesday",
            DayName::Wednesday => "Wednesday",
            DayName::Thursday => "Thursday",
            DayName::Friday => "Friday",
            DayName::Saturday => "Saturday",
            DayName::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recurring weekly window during which a doctor accepts bookings.
///
/// Windows for the same day may overlap; each is checked independently and
/// a match in any one suffices, so they are kept as a flat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day: DayName,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub is_available: bool,
}

impl AvailabilityWindow {
    /// Start inclusive, end exclusive.
    pub fn covers(&self, slot: TimeOfDay) -> bool {
        self.start_time <= slot && slot < self.end_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: i32,
    pub gender: Gender,
    pub village: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub specialization: String,
    pub years_of_experience: i32,
    #[serde(default)]
    pub availability_slots: Vec<AvailabilityWindow>,
}

/// Role-specific payload, tagged by the `role` field on the wire. A user is
/// exactly one of these; fields that only make sense for one role live on
/// that role's variant instead of being optional on every user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Patient(PatientProfile),
    Doctor(DoctorProfile),
    Admin,
}

impl RoleProfile {
    pub fn role_name(&self) -> &'static str {
        match self {
            RoleProfile::Patient(_) => "patient",
            RoleProfile::Doctor(_) => "doctor",
            RoleProfile::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub profile: RoleProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_doctor(&self) -> bool {
        matches!(self.profile, RoleProfile::Doctor(_))
    }

    pub fn is_patient(&self) -> bool {
        matches!(self.profile, RoleProfile::Patient(_))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.profile, RoleProfile::Admin)
    }

    /// A doctor's windows; empty for every other role.
    pub fn availability(&self) -> &[AvailabilityWindow] {
        match &self.profile {
            RoleProfile::Doctor(doctor) => &doctor.availability_slots,
            _ => &[],
        }
    }
}
