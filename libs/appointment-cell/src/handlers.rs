use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_store::AppState;

use crate::models::{BookAppointmentRequest, UpdateStatusRequest};
use crate::services::booking::AppointmentBookingService;
use crate::services::lifecycle::AppointmentLifecycleService;

fn actor_id(user: &AuthUser) -> Result<Uuid, AppError> {
    user.user_id()
        .ok_or_else(|| AppError::Auth("Invalid token subject".to_string()))
}

fn parse_appointment_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::ValidationError("Invalid appointment_id".to_string()))
}

/// `POST /` — patient books an appointment (201 on success).
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor = actor_id(&user)?;
    if user.role.as_deref() != Some("patient") {
        return Err(AppError::Forbidden(
            "Only patients can book appointments".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let appointment = service.book(actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment requested",
            "appointment": appointment
        })),
    ))
}

/// `GET /` — admin sees all, doctor and patient see their own.
#[axum::debug_handler]
pub async fn get_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let service = AppointmentBookingService::new(&state);
    let appointments = service.appointments_for(&user, actor).await?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// `GET /{appointment_id}` — participants and admins.
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;
    let appointment_id = parse_appointment_id(&appointment_id)?;

    let service = AppointmentBookingService::new(&state);
    let appointment = service.get_appointment(&user, actor, appointment_id).await?;

    Ok(Json(json!({ "appointment": appointment })))
}

/// `PUT /{appointment_id}/status` — assigned doctor only; confirmation
/// re-runs the conflict check.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;
    let appointment_id = parse_appointment_id(&appointment_id)?;

    let service = AppointmentLifecycleService::new(&state);
    let appointment = service
        .update_status(actor, appointment_id, request.status.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Status updated",
        "appointment": appointment
    })))
}

/// `PUT /{appointment_id}/status/admin` — privileged override, no
/// ownership check and no conflict re-check.
#[axum::debug_handler]
pub async fn admin_update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    let appointment_id = parse_appointment_id(&appointment_id)?;

    let service = AppointmentLifecycleService::new(&state);
    let appointment = service
        .admin_update_status(appointment_id, request.status.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Status updated by admin",
        "appointment": appointment
    })))
}
