use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::services::availability::doctor_available_at;
use shared_models::{Appointment, AppointmentQuery, AppointmentStatus, TimeOfDay, User};
use shared_store::{AppointmentStore, UserDirectory};

use crate::models::AppointmentError;

/// Decides whether a requested (doctor, date, slot) may become a new
/// appointment, and whether a pending appointment may be confirmed.
///
/// Booking and confirmation are two independent race windows: several
/// pending holds on one slot are legal, so confirmation re-checks against
/// other confirmed appointments to resolve the last-mile race.
pub struct SlotConflictChecker {
    users: Arc<dyn UserDirectory>,
    appointments: Arc<dyn AppointmentStore>,
}

impl SlotConflictChecker {
    pub fn new(users: Arc<dyn UserDirectory>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self {
            users,
            appointments,
        }
    }

    /// Booking-time check, first failure wins:
    /// 1. the date must be strictly in the future,
    /// 2. the doctor must exist and hold the doctor role,
    /// 3. an enabled window must cover the slot on that weekday,
    /// 4. no non-cancelled appointment may already hold the slot.
    ///
    /// Returns the parsed slot and the doctor record on success. A slot
    /// that fails to parse as "HH:mm" matches no window and is rejected at
    /// step 3, never as a parse error.
    pub async fn check_booking(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot_text: &str,
    ) -> Result<(TimeOfDay, User), AppointmentError> {
        debug!(
            "Booking check: doctor {} on {} at '{}'",
            doctor_id, date, slot_text
        );

        if date <= Utc::now().date_naive() {
            return Err(AppointmentError::Validation(
                "Appointment must be in the future".to_string(),
            ));
        }

        let doctor = match self.users.fetch_user(doctor_id).await? {
            Some(user) if user.is_doctor() => user,
            _ => {
                return Err(AppointmentError::Validation(
                    "Specified doctor not found".to_string(),
                ))
            }
        };

        let slot = TimeOfDay::parse(slot_text)
            .filter(|slot| doctor_available_at(&doctor, date, *slot))
            .ok_or_else(|| {
                AppointmentError::Validation(
                    "Doctor not available at requested day/time".to_string(),
                )
            })?;

        let same_day = self
            .appointments
            .query_appointments(&AppointmentQuery::for_doctor_on(doctor_id, date))
            .await?;
        let taken = same_day.iter().any(|existing| {
            existing.time_slot == slot && existing.status != AppointmentStatus::Cancelled
        });
        if taken {
            warn!(
                "Slot conflict: doctor {} already booked on {} at {}",
                doctor_id, date, slot
            );
            return Err(AppointmentError::Conflict(
                "Time slot already booked for this doctor".to_string(),
            ));
        }

        Ok((slot, doctor))
    }

    /// Confirmation-time check: no OTHER appointment for the same doctor,
    /// day, and slot may already be confirmed.
    pub async fn check_confirmation(
        &self,
        appointment: &Appointment,
    ) -> Result<(), AppointmentError> {
        let same_day = self
            .appointments
            .query_appointments(&AppointmentQuery::for_doctor_on(
                appointment.doctor_id,
                appointment.appointment_date,
            ))
            .await?;

        let already_confirmed = same_day.iter().any(|other| {
            other.id != appointment.id
                && other.time_slot == appointment.time_slot
                && other.status == AppointmentStatus::Confirmed
        });
        if already_confirmed {
            warn!(
                "Confirmation conflict: doctor {} slot {} on {} already confirmed elsewhere",
                appointment.doctor_id, appointment.time_slot, appointment.appointment_date
            );
            return Err(AppointmentError::Conflict(
                "Conflict: another appointment already confirmed for this slot".to_string(),
            ));
        }

        Ok(())
    }
}
