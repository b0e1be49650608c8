use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use appointment_cell::services::lifecycle::AppointmentLifecycleService;
use shared_models::auth::AuthUser;
use shared_models::{
    AppointmentStatus, ConsultationSession, ConsultationType, NewSession, SessionPatch,
    SessionQuery, SessionStatus,
};
use shared_store::{AppState, AppointmentStore, EventSink, SessionStore, UserDirectory};

use crate::models::ConsultationError;
use crate::services::token::{generate_session_id, media_access_token, MediaCapabilities};

/// Everything a participant needs to join the media channel for a live
/// session. The token is minted fresh on every issuance.
#[derive(Debug, Clone, Serialize)]
pub struct MediaAccess {
    pub session_id: String,
    pub consultation_type: ConsultationType,
    pub token: String,
    pub config: MediaCapabilities,
}

/// The consultation state machine: scheduled → live → completed, with
/// cancellation out of either non-terminal state. Sessions hang off a
/// confirmed appointment; completing one drags the appointment along.
pub struct ConsultationService {
    sessions: Arc<dyn SessionStore>,
    appointments: Arc<dyn AppointmentStore>,
    lifecycle: AppointmentLifecycleService,
    events: Arc<dyn EventSink>,
}

impl ConsultationService {
    pub fn new(state: &AppState) -> Self {
        Self::with_stores(
            state.users.clone(),
            state.appointments.clone(),
            state.sessions.clone(),
            state.events.clone(),
        )
    }

    pub fn with_stores(
        users: Arc<dyn UserDirectory>,
        appointments: Arc<dyn AppointmentStore>,
        sessions: Arc<dyn SessionStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            sessions,
            appointments: appointments.clone(),
            lifecycle: AppointmentLifecycleService::with_stores(users, appointments, events.clone()),
            events,
        }
    }

    fn required<'a>(
        value: Option<&'a str>,
        message: &str,
    ) -> Result<&'a str, ConsultationError> {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConsultationError::Validation(message.to_string()))
    }

    async fn fetch_by_public_id(
        &self,
        session_id: &str,
    ) -> Result<ConsultationSession, ConsultationError> {
        self.sessions
            .fetch_session_by_public_id(session_id)
            .await?
            .ok_or_else(|| ConsultationError::NotFound("Session not found".to_string()))
    }

    /// Doctor creates a scheduled session from a confirmed appointment.
    /// At most one non-terminal session may exist per appointment.
    pub async fn initiate(
        &self,
        actor: Uuid,
        appointment_id: Option<&str>,
    ) -> Result<ConsultationSession, ConsultationError> {
        let raw = Self::required(appointment_id, "appointment_id is required")?;
        let appointment_id: Uuid = raw
            .parse()
            .map_err(|_| ConsultationError::Validation("Invalid appointment_id".to_string()))?;

        let appointment = self
            .appointments
            .fetch_appointment(appointment_id)
            .await
            .map_err(|e| ConsultationError::Database(e.to_string()))?
            .ok_or_else(|| ConsultationError::NotFound("Appointment not found".to_string()))?;

        if appointment.doctor_id != actor {
            return Err(ConsultationError::Forbidden(
                "Only assigned doctor can initiate consultation".to_string(),
            ));
        }
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(ConsultationError::Conflict(
                "Appointment must be confirmed before starting consultation".to_string(),
            ));
        }

        // Terminal sessions do not block re-initiation; a live or scheduled
        // one does.
        let existing = self.sessions.sessions_for_appointment(appointment_id).await?;
        if existing.iter().any(|s| !s.status.is_terminal()) {
            return Err(ConsultationError::Conflict(
                "Active session already exists for this appointment".to_string(),
            ));
        }

        let session = self
            .sessions
            .create_session(NewSession {
                session_id: generate_session_id(),
                appointment_id,
                patient_id: appointment.patient_id,
                doctor_id: appointment.doctor_id,
                consultation_type: appointment.consultation_type,
            })
            .await?;

        info!(
            "Consultation {} scheduled for appointment {}",
            session.session_id, appointment_id
        );
        self.events.session_created(&session).await;
        Ok(session)
    }

    /// Either participant moves a scheduled session to live.
    pub async fn start(
        &self,
        actor: Uuid,
        session_id: Option<&str>,
    ) -> Result<ConsultationSession, ConsultationError> {
        let raw = Self::required(session_id, "session_id is required")?;
        let session = self.fetch_by_public_id(raw).await?;

        if !session.involves(actor) {
            return Err(ConsultationError::Forbidden(
                "Unauthorized to start this session".to_string(),
            ));
        }
        if session.status != SessionStatus::Scheduled {
            return Err(ConsultationError::Conflict(
                "Session must be in scheduled status to start".to_string(),
            ));
        }

        let updated = self
            .sessions
            .update_session(
                session.id,
                SessionStatus::Scheduled,
                SessionPatch {
                    status: Some(SessionStatus::Live),
                    start_time: Some(Utc::now()),
                    ..SessionPatch::default()
                },
            )
            .await?;

        info!("Consultation {} is live", updated.session_id);
        self.events.session_started(&updated).await;
        Ok(updated)
    }

    /// Doctor ends a live session. Duration is the wall-clock span in
    /// minutes, rounded to nearest. The linked appointment is forced to
    /// completed regardless of its current state.
    pub async fn end(
        &self,
        actor: Uuid,
        session_id: Option<&str>,
        notes: Option<String>,
    ) -> Result<ConsultationSession, ConsultationError> {
        let raw = Self::required(session_id, "session_id is required")?;
        let session = self.fetch_by_public_id(raw).await?;

        if session.doctor_id != actor {
            return Err(ConsultationError::Forbidden(
                "Only assigned doctor can end session".to_string(),
            ));
        }
        if session.status != SessionStatus::Live {
            return Err(ConsultationError::Conflict(
                "Only live sessions can be ended".to_string(),
            ));
        }

        let end_time = Utc::now();
        let duration_minutes = session
            .start_time
            .map(|started| {
                let millis = (end_time - started).num_milliseconds();
                (millis as f64 / 60_000.0).round() as i32
            })
            .unwrap_or(0);

        let updated = self
            .sessions
            .update_session(
                session.id,
                SessionStatus::Live,
                SessionPatch {
                    status: Some(SessionStatus::Completed),
                    end_time: Some(end_time),
                    duration_minutes: Some(duration_minutes),
                    notes,
                    ..SessionPatch::default()
                },
            )
            .await?;

        info!(
            "Consultation {} completed after {} minutes",
            updated.session_id, updated.duration_minutes
        );
        self.events.session_completed(&updated).await;

        // The session's completion stands even if the appointment row has
        // gone missing in the meantime.
        self.lifecycle.force_complete(updated.appointment_id).await?;

        Ok(updated)
    }

    /// Either participant cancels a non-terminal session. The appointment
    /// is left untouched.
    pub async fn cancel(
        &self,
        actor: Uuid,
        session_id: Option<&str>,
        reason: Option<String>,
    ) -> Result<ConsultationSession, ConsultationError> {
        let raw = Self::required(session_id, "session_id is required")?;
        let session = self.fetch_by_public_id(raw).await?;

        if !session.involves(actor) {
            return Err(ConsultationError::Forbidden(
                "Unauthorized to cancel this session".to_string(),
            ));
        }
        if session.status.is_terminal() {
            return Err(ConsultationError::Conflict(
                "Cannot cancel completed or already cancelled sessions".to_string(),
            ));
        }

        let updated = self
            .sessions
            .update_session(
                session.id,
                session.status,
                SessionPatch {
                    status: Some(SessionStatus::Cancelled),
                    notes: reason,
                    ..SessionPatch::default()
                },
            )
            .await?;

        info!("Consultation {} cancelled", updated.session_id);
        self.events.session_cancelled(&updated).await;
        Ok(updated)
    }

    /// Fresh media token for a live session, participants only.
    pub async fn issue_token(
        &self,
        actor: Uuid,
        session_id: &str,
    ) -> Result<MediaAccess, ConsultationError> {
        let session = self.fetch_by_public_id(session_id).await?;

        if !session.involves(actor) {
            return Err(ConsultationError::Forbidden(
                "Unauthorized to access this session".to_string(),
            ));
        }
        if session.status != SessionStatus::Live {
            return Err(ConsultationError::Conflict(
                "Session is not live".to_string(),
            ));
        }

        Ok(MediaAccess {
            session_id: session.session_id,
            consultation_type: session.consultation_type,
            token: media_access_token(),
            config: MediaCapabilities::for_type(session.consultation_type),
        })
    }

    /// Lookup by shareable id. The id itself is the capability; any
    /// authenticated caller may resolve it.
    pub async fn get_session(
        &self,
        session_id: &str,
    ) -> Result<ConsultationSession, ConsultationError> {
        self.fetch_by_public_id(session_id).await
    }

    /// Role-scoped listing, newest first: admin sees all, doctor and
    /// patient see their own.
    pub async fn sessions_for(
        &self,
        user: &AuthUser,
        actor: Uuid,
    ) -> Result<Vec<ConsultationSession>, ConsultationError> {
        let query = match user.role.as_deref() {
            Some("admin") => SessionQuery::default(),
            Some("doctor") => SessionQuery {
                doctor_id: Some(actor),
                ..SessionQuery::default()
            },
            Some("patient") => SessionQuery {
                patient_id: Some(actor),
                ..SessionQuery::default()
            },
            _ => return Err(ConsultationError::Forbidden("Forbidden".to_string())),
        };

        Ok(self.sessions.query_sessions(&query).await?)
    }
}
