use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{AvailabilityWindow, RoleProfile, User};
use shared_models::error::AppError;
use shared_store::StoreError;

fn default_true() -> bool {
    true
}

/// One window as submitted by a doctor. Fields arrive as raw text so the
/// service owns every rejection; a disabled window is stored but inert.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityEntry {
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub availability_slots: Option<Vec<AvailabilityEntry>>,
}

/// Directory listing entry for `GET /available`.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorListing {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialization: String,
    pub years_of_experience: i32,
    pub availability_slots: Vec<AvailabilityWindow>,
}

impl DoctorListing {
    pub fn from_user(user: &User) -> Option<Self> {
        match &user.profile {
            RoleProfile::Doctor(doctor) => Some(Self {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                specialization: doctor.specialization.clone(),
                years_of_experience: doctor.years_of_experience,
                availability_slots: doctor.availability_slots.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("{0}")]
    Validation(String),

    #[error("Doctor not found")]
    NotFound,

    #[error("Only doctors can set availability")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for DoctorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DoctorError::NotFound,
            other => DoctorError::Database(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Forbidden => {
                AppError::Forbidden("Only doctors can set availability".to_string())
            }
            DoctorError::Database(msg) => AppError::Database(msg),
        }
    }
}
