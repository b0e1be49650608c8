use serde::Deserialize;

use appointment_cell::models::AppointmentError;
use shared_models::error::AppError;
use shared_store::StoreError;

/// Transition payloads. Ids arrive as raw text so the session service owns
/// the missing-field and parse rejections instead of the deserializer.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateSessionRequest {
    pub appointment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelSessionRequest {
    pub session_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for ConsultationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ConsultationError::NotFound("Session not found".to_string()),
            StoreError::StaleState { expected } => ConsultationError::Conflict(format!(
                "Session changed concurrently (was '{}')",
                expected
            )),
            StoreError::Backend(msg) => ConsultationError::Database(msg),
        }
    }
}

impl From<AppointmentError> for ConsultationError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation(msg) => ConsultationError::Validation(msg),
            AppointmentError::NotFound => {
                ConsultationError::NotFound("Appointment not found".to_string())
            }
            AppointmentError::Forbidden(msg) => ConsultationError::Forbidden(msg),
            AppointmentError::Conflict(msg) => ConsultationError::Conflict(msg),
            AppointmentError::Database(msg) => ConsultationError::Database(msg),
        }
    }
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::Validation(msg) => AppError::ValidationError(msg),
            ConsultationError::NotFound(msg) => AppError::NotFound(msg),
            ConsultationError::Forbidden(msg) => AppError::Forbidden(msg),
            ConsultationError::Conflict(msg) => AppError::Conflict(msg),
            ConsultationError::Database(msg) => AppError::Database(msg),
        }
    }
}
