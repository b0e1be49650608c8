use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::{
    Appointment, AppointmentQuery, ConsultationType, NewAppointment, DEFAULT_SLOT_MINUTES,
};
use shared_store::{AppState, AppointmentStore, EventSink, UserDirectory};

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::services::conflict::SlotConflictChecker;

/// Booking orchestration and role-scoped reads over the appointment store.
pub struct AppointmentBookingService {
    appointments: Arc<dyn AppointmentStore>,
    checker: SlotConflictChecker,
    events: Arc<dyn EventSink>,
}

impl AppointmentBookingService {
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

    /// Patient books: parse the raw request, run the booking-time conflict
    /// check, insert as `pending`.
    pub async fn book(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (doctor_id, date_text, slot_text, type_text) = match (
            &request.doctor_id,
            &request.appointment_date,
            &request.time_slot,
            &request.consultation_type,
        ) {
            (Some(doctor), Some(date), Some(slot), Some(kind)) => (doctor, date, slot, kind),
            _ => {
                return Err(AppointmentError::Validation(
                    "doctor_id, appointment_date, time_slot, consultation_type are required"
                        .to_string(),
                ))
            }
        };

        let doctor_id: Uuid = doctor_id
            .parse()
            .map_err(|_| AppointmentError::Validation("Invalid doctor_id".to_string()))?;
        let date: NaiveDate = date_text
            .parse()
            .map_err(|_| AppointmentError::Validation("Invalid appointment_date".to_string()))?;
        let consultation_type = ConsultationType::from_name(type_text).ok_or_else(|| {
            AppointmentError::Validation("Invalid consultation_type".to_string())
        })?;
        let duration_minutes = request.duration_minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
        if duration_minutes <= 0 {
            return Err(AppointmentError::Validation(
                "duration_minutes must be positive".to_string(),
            ));
        }

        // The raw slot text goes through the checker so a malformed slot is
        // rejected as "not available", per the window-matching fallback.
        let (time_slot, _doctor) = self.checker.check_booking(doctor_id, date, slot_text).await?;

        let appointment = self
            .appointments
            .create_appointment(NewAppointment {
                patient_id,
                doctor_id,
                appointment_date: date,
                time_slot,
                duration_minutes,
                consultation_type,
            })
            .await?;

        info!(
            "Appointment {} requested: patient {} with doctor {} on {} at {}",
            appointment.id,
            patient_id,
            doctor_id,
            date,
            appointment.slot_label()
        );
        self.events.appointment_booked(&appointment).await;

        Ok(appointment)
    }

    /// Role-scoped listing: admin sees all, doctor and patient see their own.
    pub async fn appointments_for(
        &self,
        auth: &AuthUser,
        actor: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let query = match auth.role.as_deref() {
            Some("admin") => AppointmentQuery::default(),
            Some("doctor") => AppointmentQuery {
                doctor_id: Some(actor),
                ..AppointmentQuery::default()
            },
            Some("patient") => AppointmentQuery {
                patient_id: Some(actor),
                ..AppointmentQuery::default()
            },
            _ => return Err(AppointmentError::Forbidden("Forbidden".to_string())),
        };

        debug!("Listing appointments for {} ({:?})", actor, auth.role);
        Ok(self.appointments.query_appointments(&query).await?)
    }

    /// Fetch one appointment; participants and admins only.
    pub async fn get_appointment(
        &self,
        auth: &AuthUser,
        actor: Uuid,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .fetch_appointment(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let is_admin = auth.role.as_deref() == Some("admin");
        let is_participant = appointment.patient_id == actor || appointment.doctor_id == actor;
        if !is_admin && !is_participant {
            return Err(AppointmentError::Forbidden("Forbidden".to_string()));
        }

        Ok(appointment)
    }
}
