use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{AvailabilityWindow, DayName, TimeOfDay, User};
use shared_store::{AppState, UserDirectory};

use crate::models::{AvailabilityEntry, DoctorError, DoctorListing};

/// A doctor's recurring weekly windows: the all-or-nothing setter and the
/// matcher the booking conflict checker calls.
pub struct AvailabilityService {
    users: Arc<dyn UserDirectory>,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
        }
    }

    pub fn with_directory(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Validates every submitted window before anything is written. The
    /// first bad entry rejects the whole list.
    pub fn parse_windows(
        entries: &[AvailabilityEntry],
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let mut windows = Vec::with_capacity(entries.len());
        for entry in entries {
            let (day, start_time, end_time) =
                match (&entry.day, &entry.start_time, &entry.end_time) {
                    (Some(day), Some(start), Some(end)) => (day, start, end),
                    _ => {
                        return Err(DoctorError::Validation(
                            "Each slot requires day, start_time and end_time".to_string(),
                        ))
                    }
                };

            let day = DayName::from_name(day)
                .ok_or_else(|| DoctorError::Validation(format!("Invalid day: {}", day)))?;

            let start = TimeOfDay::parse(start_time).ok_or_else(|| {
                DoctorError::Validation("start_time/end_time must be HH:mm".to_string())
            })?;
            let end = TimeOfDay::parse(end_time).ok_or_else(|| {
                DoctorError::Validation("start_time/end_time must be HH:mm".to_string())
            })?;

            if start >= end {
                return Err(DoctorError::Validation(
                    "start_time must be before end_time".to_string(),
                ));
            }

            windows.push(AvailabilityWindow {
                day,
                start_time: start,
                end_time: end,
                is_available: entry.is_available,
            });
        }
        Ok(windows)
    }

    /// Replaces the doctor's full window set. Overlapping windows for the
    /// same day are legal; each is checked independently at booking time.
    pub async fn set_availability(
        &self,
        actor: Uuid,
        entries: Vec<AvailabilityEntry>,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Setting availability for {} ({} slots)", actor, entries.len());

        let windows = Self::parse_windows(&entries)?;

        let user = self.users.fetch_user(actor).await?;
        match user {
            Some(user) if user.is_doctor() => {}
            _ => return Err(DoctorError::Forbidden),
        }

        let updated = self.users.replace_availability(actor, windows).await?;
        info!(
            "Doctor {} now has {} availability window(s)",
            actor,
            updated.availability().len()
        );
        Ok(updated.availability().to_vec())
    }

    pub async fn doctor_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let user = self.users.fetch_user(doctor_id).await?;
        match user {
            Some(user) if user.is_doctor() => Ok(user.availability().to_vec()),
            _ => Err(DoctorError::NotFound),
        }
    }

    /// Every doctor in the directory with their windows, name-ordered.
    pub async fn available_doctors(&self) -> Result<Vec<DoctorListing>, DoctorError> {
        let doctors = self.users.list_users_by_role("doctor").await?;
        Ok(doctors.iter().filter_map(DoctorListing::from_user).collect())
    }
}

/// Does any enabled window cover `slot` on the weekday of `date`?
/// Start inclusive, end exclusive.
pub fn doctor_available_at(doctor: &User, date: NaiveDate, slot: TimeOfDay) -> bool {
    let day = DayName::from_weekday(date.weekday());
    doctor
        .availability()
        .iter()
        .any(|window| window.day == day && window.is_available && window.covers(slot))
}
