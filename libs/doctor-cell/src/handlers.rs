use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_store::AppState;

use crate::models::SetAvailabilityRequest;
use crate::services::availability::AvailabilityService;

fn actor_id(user: &AuthUser) -> Result<Uuid, AppError> {
    user.user_id()
        .ok_or_else(|| AppError::Auth("Invalid token subject".to_string()))
}

/// `PUT /availability` — a doctor replaces their own weekly windows.
#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let entries = request.availability_slots.ok_or_else(|| {
        AppError::ValidationError("availability_slots must be an array".to_string())
    })?;

    let service = AvailabilityService::new(&state);
    let windows = service.set_availability(actor, entries).await?;

    Ok(Json(json!({
        "message": "Availability updated",
        "availability_slots": windows
    })))
}

/// `GET /{doctor_id}/availability`
#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id: Uuid = doctor_id
        .parse()
        .map_err(|_| AppError::ValidationError("Invalid doctor_id".to_string()))?;

    let service = AvailabilityService::new(&state);
    let windows = service.doctor_windows(doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "availability_slots": windows
    })))
}

/// `GET /available` — every doctor with their windows.
#[axum::debug_handler]
pub async fn get_available_doctors(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let doctors = service.available_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}
