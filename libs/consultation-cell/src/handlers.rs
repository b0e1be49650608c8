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

use crate::models::{
    CancelSessionRequest, EndSessionRequest, InitiateSessionRequest, StartSessionRequest,
};
use crate::services::session::ConsultationService;

fn actor_id(user: &AuthUser) -> Result<Uuid, AppError> {
    user.user_id()
        .ok_or_else(|| AppError::Auth("Invalid token subject".to_string()))
}

/// `POST /initiate` — assigned doctor creates a scheduled session from a
/// confirmed appointment (201 on success).
#[axum::debug_handler]
pub async fn initiate_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<InitiateSessionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor = actor_id(&user)?;

    let service = ConsultationService::new(&state);
    let session = service
        .initiate(actor, request.appointment_id.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Consultation session created",
            "session_token": session.session_id,
            "session": session
        })),
    ))
}

/// `POST /start` — doctor or patient moves the session to live.
#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let service = ConsultationService::new(&state);
    let session = service.start(actor, request.session_id.as_deref()).await?;

    Ok(Json(json!({ "message": "Session started", "session": session })))
}

/// `POST /end` — doctor completes a live session; the appointment is
/// forced to completed as a side effect.
#[axum::debug_handler]
pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<EndSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let service = ConsultationService::new(&state);
    let session = service
        .end(actor, request.session_id.as_deref(), request.notes)
        .await?;

    Ok(Json(json!({ "message": "Session ended", "session": session })))
}

/// `POST /cancel` — doctor or patient cancels a non-terminal session.
#[axum::debug_handler]
pub async fn cancel_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CancelSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let service = ConsultationService::new(&state);
    let session = service
        .cancel(actor, request.session_id.as_deref(), request.reason)
        .await?;

    Ok(Json(json!({ "message": "Session cancelled", "session": session })))
}

/// `GET /` — admin sees all, doctor and patient see their own, newest
/// first.
#[axum::debug_handler]
pub async fn get_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let service = ConsultationService::new(&state);
    let sessions = service.sessions_for(&user, actor).await?;

    Ok(Json(json!({ "sessions": sessions })))
}

/// `GET /{session_id}` — resolve a shareable session id.
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);
    let session = service.get_session(&session_id).await?;

    Ok(Json(json!({ "session": session })))
}

/// `GET /{session_id}/token` — fresh media token for a live session,
/// participants only.
#[axum::debug_handler]
pub async fn get_session_token(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_id(&user)?;

    let service = ConsultationService::new(&state);
    let access = service.issue_token(actor, &session_id).await?;

    Ok(Json(json!({
        "message": "Session token generated",
        "session_id": access.session_id,
        "consultation_type": access.consultation_type,
        "token": access.token,
        "config": access.config
    })))
}
