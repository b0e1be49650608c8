pub mod events;
pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentQuery, AppointmentStatus, AvailabilityWindow, ConsultationSession,
    NewAppointment, NewSession, SessionPatch, SessionQuery, SessionStatus, User,
};

pub use events::{EventSink, LogSink};
pub use memory::MemoryStore;
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// The compare-and-swap guard failed: the record's status changed
    /// between the caller's read and this write.
    #[error("record state changed concurrently (expected status '{expected}')")]
    StaleState { expected: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Read/write access to user records. Registration lives elsewhere; the
/// one write this system performs on a user is replacing a doctor's
/// availability windows.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn list_users_by_role(&self, role: &str) -> Result<Vec<User>, StoreError>;

    /// Replaces the full window set on a doctor record (no merging).
    /// `NotFound` if there is no user with a doctor profile under `id`.
    async fn replace_availability(
        &self,
        doctor_id: Uuid,
        windows: Vec<AvailabilityWindow>,
    ) -> Result<User, StoreError>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Inserts with status `pending`; the store assigns id and timestamps.
    async fn create_appointment(
        &self,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, StoreError>;

    async fn fetch_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn query_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Status write with an optional compare-and-swap guard: when
    /// `expected` is `Some`, the write only applies if the stored status
    /// still matches, otherwise `StaleState`. `None` writes
    /// unconditionally (the session-completion side effect).
    async fn update_appointment_status(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts with status `scheduled` and zero duration.
    async fn create_session(&self, new_session: NewSession)
        -> Result<ConsultationSession, StoreError>;

    async fn fetch_session(&self, id: Uuid) -> Result<Option<ConsultationSession>, StoreError>;

    /// Lookup by the shareable `session_id` token.
    async fn fetch_session_by_public_id(
        &self,
        session_id: &str,
    ) -> Result<Option<ConsultationSession>, StoreError>;

    /// All sessions ever created for an appointment, terminal ones
    /// included.
    async fn sessions_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Vec<ConsultationSession>, StoreError>;

    /// Filterable listing, newest first.
    async fn query_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<ConsultationSession>, StoreError>;

    /// Patch guarded by the expected current status; `StaleState` when the
    /// stored status no longer matches.
    async fn update_session(
        &self,
        id: Uuid,
        expected: SessionStatus,
        patch: SessionPatch,
    ) -> Result<ConsultationSession, StoreError>;
}

/// Shared handles injected into every router: configuration, the three
/// record stores, and the lifecycle event sink.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserDirectory>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub events: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        users: Arc<dyn UserDirectory>,
        appointments: Arc<dyn AppointmentStore>,
        sessions: Arc<dyn SessionStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            users,
            appointments,
            sessions,
            events,
        }
    }

    /// Everything backed by a single in-memory store with the tracing
    /// event sink; the default wiring for local runs and tests.
    pub fn in_memory(config: Arc<AppConfig>, store: Arc<MemoryStore>) -> Self {
        Self {
            config,
            users: store.clone(),
            appointments: store.clone(),
            sessions: store,
            events: Arc::new(LogSink),
        }
    }

    /// Everything backed by the REST adapter built from `config`.
    pub fn rest_backed(config: Arc<AppConfig>) -> Self {
        let store = Arc::new(RestStore::new(&config));
        Self {
            config,
            users: store.clone(),
            appointments: store.clone(),
            sessions: store,
            events: Arc::new(LogSink),
        }
    }
}
