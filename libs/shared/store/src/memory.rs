use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentQuery, AppointmentStatus, AvailabilityWindow, ConsultationSession,
    ConsultationType, DayName, DoctorProfile, Gender, NewAppointment, NewSession, PatientProfile,
    RoleProfile, SessionPatch, SessionQuery, SessionStatus, TimeOfDay, User,
    DEFAULT_SLOT_MINUTES,
};

use crate::{AppointmentStore, SessionStore, StoreError, UserDirectory};

/// Stable ids for the seeded demo accounts, so local clients can log in
/// against known records.
pub const DEMO_PATIENT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
pub const DEMO_DOCTOR_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
pub const DEMO_ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0003);

/// Process-local store used for local runs and tests. All three record
/// collections live behind their own lock; the compare-and-swap status
/// guards run under the corresponding write lock.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    sessions: RwLock<HashMap<Uuid, ConsultationSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the demo patient, doctor (Monday 09:00-17:00 window), admin,
    /// and two confirmed appointments for tomorrow.
    pub async fn with_demo_data() -> Self {
        let store = Self::new();
        let now = Utc::now();

        store
            .insert_user(User {
                id: DEMO_PATIENT_ID,
                name: "Demo Patient".to_string(),
                email: "patient@demo.com".to_string(),
                phone: Some("9000000001".to_string()),
                profile: RoleProfile::Patient(PatientProfile {
                    age: 30,
                    gender: Gender::Female,
                    village: "Demo Village".to_string(),
                }),
                created_at: now,
                updated_at: now,
            })
            .await;
        store
            .insert_user(User {
                id: DEMO_DOCTOR_ID,
                name: "Demo Doctor".to_string(),
                email: "doctor@demo.com".to_string(),
                phone: Some("9000000002".to_string()),
                profile: RoleProfile::Doctor(DoctorProfile {
                    specialization: "General Practitioner".to_string(),
                    years_of_experience: 5,
                    availability_slots: vec![AvailabilityWindow {
                        day: DayName::Monday,
                        start_time: TimeOfDay::parse("09:00").unwrap_or_else(|| TimeOfDay::parse("00:00").expect("midnight parses")),
                        end_time: TimeOfDay::parse("17:00").unwrap_or_else(|| TimeOfDay::parse("00:00").expect("midnight parses")),
                        is_available: true,
                    }],
                }),
                created_at: now,
                updated_at: now,
            })
            .await;
        store
            .insert_user(User {
                id: DEMO_ADMIN_ID,
                name: "Demo Admin".to_string(),
                email: "admin@demo.com".to_string(),
                phone: Some("9000000003".to_string()),
                profile: RoleProfile::Admin,
                created_at: now,
                updated_at: now,
            })
            .await;

        let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
        for (slot, id_tail) in [("09:00", 0xa1u128), ("10:00", 0xa2u128)] {
            if let Some(time_slot) = TimeOfDay::parse(slot) {
                let mut appointments = store.appointments.write().await;
                let id = Uuid::from_u128(id_tail);
                appointments.insert(
                    id,
                    Appointment {
                        id,
                        patient_id: DEMO_PATIENT_ID,
                        doctor_id: DEMO_DOCTOR_ID,
                        appointment_date: tomorrow,
                        time_slot,
                        duration_minutes: DEFAULT_SLOT_MINUTES,
                        consultation_type: ConsultationType::Audio,
                        status: AppointmentStatus::Confirmed,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }

        info!("In-memory store initialized with demo data");
        store
    }

    /// Seeding door for demo data and tests; the directory trait itself
    /// has no user-creation operation.
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn fetch_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_users_by_role(&self, role: &str) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|user| user.profile.role_name() == role)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }

    async fn replace_availability(
        &self,
        doctor_id: Uuid,
        windows: Vec<AvailabilityWindow>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&doctor_id).ok_or(StoreError::NotFound)?;
        match &mut user.profile {
            RoleProfile::Doctor(doctor) => {
                doctor.availability_slots = windows;
                user.updated_at = Utc::now();
                Ok(user.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn create_appointment(
        &self,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: new_appointment.patient_id,
            doctor_id: new_appointment.doctor_id,
            appointment_date: new_appointment.appointment_date,
            time_slot: new_appointment.time_slot,
            duration_minutes: new_appointment.duration_minutes,
            consultation_type: new_appointment.consultation_type,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn fetch_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn query_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| query.matches(appointment))
            .cloned()
            .collect();
        matching.sort_by_key(|appointment| (appointment.appointment_date, appointment.time_slot));
        Ok(matching)
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(expected) = expected {
            if appointment.status != expected {
                return Err(StoreError::StaleState {
                    expected: expected.to_string(),
                });
            }
        }
        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(
        &self,
        new_session: NewSession,
    ) -> Result<ConsultationSession, StoreError> {
        let now = Utc::now();
        let session = ConsultationSession {
            id: Uuid::new_v4(),
            session_id: new_session.session_id,
            appointment_id: new_session.appointment_id,
            patient_id: new_session.patient_id,
            doctor_id: new_session.doctor_id,
            consultation_type: new_session.consultation_type,
            status: SessionStatus::Scheduled,
            start_time: None,
            end_time: None,
            duration_minutes: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn fetch_session(&self, id: Uuid) -> Result<Option<ConsultationSession>, StoreError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn fetch_session_by_public_id(
        &self,
        session_id: &str,
    ) -> Result<Option<ConsultationSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|session| session.session_id == session_id)
            .cloned())
    }

    async fn sessions_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Vec<ConsultationSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|session| session.appointment_id == appointment_id)
            .cloned()
            .collect())
    }

    async fn query_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<ConsultationSession>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<ConsultationSession> = sessions
            .values()
            .filter(|session| query.matches(session))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update_session(
        &self,
        id: Uuid,
        expected: SessionStatus,
        patch: SessionPatch,
    ) -> Result<ConsultationSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        if session.status != expected {
            return Err(StoreError::StaleState {
                expected: expected.to_string(),
            });
        }
        if let Some(status) = patch.status {
            session.status = status;
        }
        if let Some(start_time) = patch.start_time {
            session.start_time = Some(start_time);
        }
        if let Some(end_time) = patch.end_time {
            session.end_time = Some(end_time);
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            session.duration_minutes = duration_minutes;
        }
        if let Some(notes) = patch.notes {
            session.notes = Some(notes);
        }
        session.updated_at = Utc::now();
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn new_appointment(doctor_id: Uuid, date: NaiveDate, slot: &str) -> NewAppointment {
        NewAppointment {
            patient_id: Uuid::new_v4(),
            doctor_id,
            appointment_date: date,
            time_slot: TimeOfDay::parse(slot).unwrap(),
            duration_minutes: DEFAULT_SLOT_MINUTES,
            consultation_type: ConsultationType::Video,
        }
    }

    #[test]
    fn create_starts_pending_and_cas_guards_status() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let doctor_id = Uuid::new_v4();
            let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

            let appointment = store
                .create_appointment(new_appointment(doctor_id, date, "09:00"))
                .await
                .unwrap();
            assert_eq!(appointment.status, AppointmentStatus::Pending);

            // Guard holds when the expectation matches.
            let confirmed = store
                .update_appointment_status(
                    appointment.id,
                    Some(AppointmentStatus::Pending),
                    AppointmentStatus::Confirmed,
                )
                .await
                .unwrap();
            assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

            // A second writer still expecting `pending` loses.
            let stale = store
                .update_appointment_status(
                    appointment.id,
                    Some(AppointmentStatus::Pending),
                    AppointmentStatus::Cancelled,
                )
                .await;
            assert_matches!(stale, Err(StoreError::StaleState { .. }));

            // Unconditional write ignores the current state.
            let forced = store
                .update_appointment_status(appointment.id, None, AppointmentStatus::Completed)
                .await
                .unwrap();
            assert_eq!(forced.status, AppointmentStatus::Completed);
        });
    }

    #[test]
    fn appointment_query_filters_by_doctor_and_day() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let doctor_id = Uuid::new_v4();
            let other_doctor = Uuid::new_v4();
            let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

            store
                .create_appointment(new_appointment(doctor_id, date, "09:00"))
                .await
                .unwrap();
            store
                .create_appointment(new_appointment(doctor_id, date.succ_opt().unwrap(), "09:00"))
                .await
                .unwrap();
            store
                .create_appointment(new_appointment(other_doctor, date, "09:00"))
                .await
                .unwrap();

            let same_day = store
                .query_appointments(&AppointmentQuery::for_doctor_on(doctor_id, date))
                .await
                .unwrap();
            assert_eq!(same_day.len(), 1);
            assert_eq!(same_day[0].doctor_id, doctor_id);
            assert_eq!(same_day[0].appointment_date, date);
        });
    }

    #[test]
    fn session_update_rejects_wrong_expected_status() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let session = store
                .create_session(NewSession {
                    session_id: "HS-demo-1".to_string(),
                    appointment_id: Uuid::new_v4(),
                    patient_id: Uuid::new_v4(),
                    doctor_id: Uuid::new_v4(),
                    consultation_type: ConsultationType::Chat,
                })
                .await
                .unwrap();
            assert_eq!(session.status, SessionStatus::Scheduled);
            assert_eq!(session.duration_minutes, 0);

            let result = store
                .update_session(
                    session.id,
                    SessionStatus::Live,
                    SessionPatch {
                        status: Some(SessionStatus::Completed),
                        ..SessionPatch::default()
                    },
                )
                .await;
            assert_matches!(result, Err(StoreError::StaleState { .. }));
        });
    }

    #[test]
    fn session_listing_is_newest_first() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let patient_id = Uuid::new_v4();
            for n in 0..3 {
                store
                    .create_session(NewSession {
                        session_id: format!("HS-demo-{}", n),
                        appointment_id: Uuid::new_v4(),
                        patient_id,
                        doctor_id: Uuid::new_v4(),
                        consultation_type: ConsultationType::Audio,
                    })
                    .await
                    .unwrap();
                tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            }

            let listed = store
                .query_sessions(&SessionQuery {
                    patient_id: Some(patient_id),
                    ..SessionQuery::default()
                })
                .await
                .unwrap();
            assert_eq!(listed.len(), 3);
            assert!(listed[0].created_at >= listed[1].created_at);
            assert!(listed[1].created_at >= listed[2].created_at);
        });
    }

    #[test]
    fn replace_availability_requires_a_doctor_record() {
        tokio_test::block_on(async {
            let store = MemoryStore::with_demo_data().await;

            let updated = store
                .replace_availability(DEMO_DOCTOR_ID, vec![])
                .await
                .unwrap();
            assert!(updated.availability().is_empty());

            let not_a_doctor = store.replace_availability(DEMO_PATIENT_ID, vec![]).await;
            assert_matches!(not_a_doctor, Err(StoreError::NotFound));

            let missing = store.replace_availability(Uuid::new_v4(), vec![]).await;
            assert_matches!(missing, Err(StoreError::NotFound));
        });
    }
}
