use serde::Deserialize;

use shared_models::error::AppError;
use shared_store::StoreError;

/// Booking payload. Fields arrive as raw text so the booking service owns
/// every rejection category; a missing or malformed field is a 400 from the
/// service, not a framework-level deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub time_slot: Option<String>,
    pub consultation_type: Option<String>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppointmentError::NotFound,
            StoreError::StaleState { expected } => AppointmentError::Conflict(format!(
                "Appointment changed concurrently (was '{}')",
                expected
            )),
            StoreError::Backend(msg) => AppointmentError::Database(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::Conflict(msg) => AppError::Conflict(msg),
            AppointmentError::Database(msg) => AppError::Database(msg),
        }
    }
}
