use async_trait::async_trait;
use tracing::info;

use shared_models::{Appointment, AppointmentStatus, ConsultationSession};

/// Hook points the booking and session lifecycles publish to. An external
/// notifier subscribes by implementing the methods it cares about; the
/// defaults ignore everything. Sinks run after the state change has been
/// persisted and must not affect the operation's outcome.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn appointment_booked(&self, _appointment: &Appointment) {}

    async fn appointment_status_changed(
        &self,
        _appointment: &Appointment,
        _previous: AppointmentStatus,
    ) {
    }

    async fn session_created(&self, _session: &ConsultationSession) {}

    async fn session_started(&self, _session: &ConsultationSession) {}

    async fn session_completed(&self, _session: &ConsultationSession) {}

    async fn session_cancelled(&self, _session: &ConsultationSession) {}
}

/// Log-only sink standing in for real delivery channels.
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn appointment_booked(&self, appointment: &Appointment) {
        info!(
            "notify: appointment {} requested with doctor {} on {} at {}",
            appointment.id,
            appointment.doctor_id,
            appointment.appointment_date,
            appointment.slot_label()
        );
    }

    async fn appointment_status_changed(
        &self,
        appointment: &Appointment,
        previous: AppointmentStatus,
    ) {
        info!(
            "notify: appointment {} moved {} -> {}",
            appointment.id, previous, appointment.status
        );
    }

    async fn session_created(&self, session: &ConsultationSession) {
        info!(
            "notify: consultation {} scheduled for appointment {}",
            session.session_id, session.appointment_id
        );
    }

    async fn session_started(&self, session: &ConsultationSession) {
        info!("notify: consultation {} is live", session.session_id);
    }

    async fn session_completed(&self, session: &ConsultationSession) {
        info!(
            "notify: consultation {} completed after {} minutes",
            session.session_id, session.duration_minutes
        );
    }

    async fn session_cancelled(&self, session: &ConsultationSession) {
        info!("notify: consultation {} cancelled", session.session_id);
    }
}
