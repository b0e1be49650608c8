use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus};
use shared_store::{AppState, AppointmentStore, EventSink, StoreError, UserDirectory};

use crate::models::AppointmentError;
use crate::services::conflict::SlotConflictChecker;

/// The appointment state machine: pending → confirmed → completed, with
/// cancellation out of pending or confirmed. Off-path transitions are
/// permitted but discouraged; they go through with a warning.
pub struct AppointmentLifecycleService {
    appointments: Arc<dyn AppointmentStore>,
    checker: SlotConflictChecker,
    events: Arc<dyn EventSink>,
}

impl AppointmentLifecycleService {
    pub fn new(state: &AppState) -> Self {
        Self::with_stores(state.users.clone(), state.appointments.clone(), state.events.clone())
    }

    pub fn with_stores(
        users: Arc<dyn UserDirectory>,
        appointments: Arc<dyn AppointmentStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            appointments: appointments.clone(),
            checker: SlotConflictChecker::new(users, appointments),
            events,
        }
    }

    /// Nominal next states; anything else is off the happy path.
    pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Pending => {
                &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            // Terminal states.
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    fn parse_target(target: Option<&str>) -> Result<AppointmentStatus, AppointmentError> {
        target
            .and_then(AppointmentStatus::from_name)
            .ok_or_else(|| AppointmentError::Validation("Invalid status".to_string()))
    }

    fn warn_if_discouraged(id: Uuid, current: AppointmentStatus, target: AppointmentStatus) {
        if target != current && !Self::valid_transitions(current).contains(&target) {
            warn!(
                "Discouraged appointment transition on {}: {} -> {}",
                id, current, target
            );
        }
    }

    /// Assigned-doctor status update. Confirmation re-runs the conflict
    /// check first; the write itself is guarded against concurrent moves.
    pub async fn update_status(
        &self,
        actor: Uuid,
        id: Uuid,
        target: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let target = Self::parse_target(target)?;

        let appointment = self
            .appointments
            .fetch_appointment(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.doctor_id != actor {
            return Err(AppointmentError::Forbidden(
                "Forbidden: only assigned doctor can update status".to_string(),
            ));
        }

        if target == AppointmentStatus::Confirmed {
            self.checker.check_confirmation(&appointment).await?;
        }

        Self::warn_if_discouraged(id, appointment.status, target);
        self.apply(appointment, target).await
    }

    /// Admin override: same target validation, no ownership check, no
    /// confirmation conflict re-check.
    pub async fn admin_update_status(
        &self,
        id: Uuid,
        target: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let target = Self::parse_target(target)?;

        let appointment = self
            .appointments
            .fetch_appointment(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        Self::warn_if_discouraged(id, appointment.status, target);
        self.apply(appointment, target).await
    }

    async fn apply(
        &self,
        appointment: Appointment,
        target: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let previous = appointment.status;
        let updated = self
            .appointments
            .update_appointment_status(appointment.id, Some(previous), target)
            .await?;

        info!("Appointment {} moved {} -> {}", updated.id, previous, target);
        self.events
            .appointment_status_changed(&updated, previous)
            .await;
        Ok(updated)
    }

    /// Session-completion side effect: force the appointment to `completed`
    /// regardless of its current state. A missing appointment is tolerated
    /// with a warning; the session's own completion stands either way.
    pub async fn force_complete(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Forcing appointment {} to completed", id);
        let previous = match self.appointments.fetch_appointment(id).await? {
            Some(existing) => existing.status,
            None => {
                warn!("Appointment {} missing during session completion", id);
                return Ok(None);
            }
        };
        match self
            .appointments
            .update_appointment_status(id, None, AppointmentStatus::Completed)
            .await
        {
            Ok(updated) => {
                self.events
                    .appointment_status_changed(&updated, previous)
                    .await;
                Ok(Some(updated))
            }
            Err(StoreError::NotFound) => {
                warn!("Appointment {} missing during session completion", id);
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }
}
