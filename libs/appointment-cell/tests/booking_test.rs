use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, BookAppointmentRequest};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_models::auth::AuthUser;
use shared_models::{AppointmentStatus, DayName};
use shared_store::{AppointmentStore, LogSink, MemoryStore};
use shared_utils::test_utils::{doctor_with_windows, window, TestUser};

fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive().succ_opt().unwrap();
    while date.weekday() != Weekday::Mon {
        date = date.succ_opt().unwrap();
    }
    date
}

fn booking(doctor_id: Uuid, date: NaiveDate, slot: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: Some(doctor_id.to_string()),
        appointment_date: Some(date.to_string()),
        time_slot: Some(slot.to_string()),
        consultation_type: Some("video".to_string()),
        duration_minutes: None,
    }
}

fn auth(user: &TestUser) -> AuthUser {
    AuthUser {
        id: user.id.to_string(),
        email: Some(user.email.clone()),
        role: Some(user.role.clone()),
        created_at: None,
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    service: AppointmentBookingService,
    doctor: TestUser,
    patient: TestUser,
}

/// Doctor with a Monday 09:00-17:00 window plus a patient.
async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let doctor = TestUser::doctor("doc@example.com");
    let patient = TestUser::patient("pat@example.com");
    store
        .insert_user(doctor_with_windows(
            &doctor,
            vec![window(DayName::Monday, "09:00", "17:00")],
        ))
        .await;
    store.insert_user(patient.to_domain_user()).await;
    let service =
        AppointmentBookingService::with_stores(store.clone(), store.clone(), Arc::new(LogSink));
    Fixture {
        store,
        service,
        doctor,
        patient,
    }
}

#[tokio::test]
async fn booking_inside_a_window_is_accepted_as_pending() {
    let fx = fixture().await;
    let appointment = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, next_monday(), "09:00"))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.time_slot.to_string(), "09:00");
    assert_eq!(appointment.slot_label(), "09:00 - 09:30");
}

#[tokio::test]
async fn booking_respects_window_boundaries() {
    let fx = fixture().await;
    let monday = next_monday();

    // End-exclusive boundary.
    let at_end = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "17:00"))
        .await;
    assert_matches!(
        at_end,
        Err(AppointmentError::Validation(msg)) if msg == "Doctor not available at requested day/time"
    );

    let before_start = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "08:59"))
        .await;
    assert_matches!(before_start, Err(AppointmentError::Validation(_)));

    // Tuesday has no window at all.
    let tuesday = monday.succ_opt().unwrap();
    let wrong_day = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, tuesday, "09:00"))
        .await;
    assert_matches!(wrong_day, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn booking_rejects_past_and_today() {
    let fx = fixture().await;
    let today = Utc::now().date_naive();

    for date in [today, today.pred_opt().unwrap()] {
        let result = fx
            .service
            .book(fx.patient.id, booking(fx.doctor.id, date, "09:00"))
            .await;
        assert_matches!(
            result,
            Err(AppointmentError::Validation(msg)) if msg == "Appointment must be in the future"
        );
    }
}

#[tokio::test]
async fn booking_requires_a_real_doctor() {
    let fx = fixture().await;

    let unknown = fx
        .service
        .book(fx.patient.id, booking(Uuid::new_v4(), next_monday(), "09:00"))
        .await;
    assert_matches!(
        unknown,
        Err(AppointmentError::Validation(msg)) if msg == "Specified doctor not found"
    );

    // A patient id in the doctor_id field is not a doctor.
    let not_a_doctor = fx
        .service
        .book(fx.patient.id, booking(fx.patient.id, next_monday(), "09:00"))
        .await;
    assert_matches!(not_a_doctor, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn malformed_slot_text_is_rejected_as_unavailable() {
    let fx = fixture().await;

    for bad_slot in ["9am", "garbage", "09:00 - 09:30", ""] {
        let result = fx
            .service
            .book(fx.patient.id, booking(fx.doctor.id, next_monday(), bad_slot))
            .await;
        assert_matches!(
            result,
            Err(AppointmentError::Validation(msg)) if msg == "Doctor not available at requested day/time"
        );
    }
}

#[tokio::test]
async fn missing_fields_and_bad_ids_are_validation_errors() {
    let fx = fixture().await;

    let mut missing = booking(fx.doctor.id, next_monday(), "09:00");
    missing.consultation_type = None;
    assert_matches!(
        fx.service.book(fx.patient.id, missing).await,
        Err(AppointmentError::Validation(_))
    );

    let mut bad_id = booking(fx.doctor.id, next_monday(), "09:00");
    bad_id.doctor_id = Some("not-a-uuid".to_string());
    assert_matches!(
        fx.service.book(fx.patient.id, bad_id).await,
        Err(AppointmentError::Validation(msg)) if msg == "Invalid doctor_id"
    );

    let mut bad_date = booking(fx.doctor.id, next_monday(), "09:00");
    bad_date.appointment_date = Some("not-a-date".to_string());
    assert_matches!(
        fx.service.book(fx.patient.id, bad_date).await,
        Err(AppointmentError::Validation(msg)) if msg == "Invalid appointment_date"
    );

    let mut bad_type = booking(fx.doctor.id, next_monday(), "09:00");
    bad_type.consultation_type = Some("telepathy".to_string());
    assert_matches!(
        fx.service.book(fx.patient.id, bad_type).await,
        Err(AppointmentError::Validation(_))
    );
}

#[tokio::test]
async fn double_booking_is_a_conflict_until_the_first_is_cancelled() {
    let fx = fixture().await;
    let monday = next_monday();

    let first = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "10:00"))
        .await
        .unwrap();

    // Pending blocks a second booking of the same slot.
    let second = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "10:00"))
        .await;
    assert_matches!(second, Err(AppointmentError::Conflict(_)));

    // Confirmed still blocks.
    fx.store
        .update_appointment_status(first.id, None, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    let second = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "10:00"))
        .await;
    assert_matches!(second, Err(AppointmentError::Conflict(_)));

    // A different slot on the same day is fine.
    fx.service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "11:00"))
        .await
        .unwrap();

    // Cancelling frees the slot.
    fx.store
        .update_appointment_status(first.id, None, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    let rebooked = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "10:00"))
        .await
        .unwrap();
    assert_eq!(rebooked.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn listing_is_role_scoped() {
    let fx = fixture().await;
    let monday = next_monday();
    let other_patient = TestUser::patient("other@example.com");
    fx.store.insert_user(other_patient.to_domain_user()).await;

    fx.service
        .book(fx.patient.id, booking(fx.doctor.id, monday, "09:00"))
        .await
        .unwrap();
    fx.service
        .book(other_patient.id, booking(fx.doctor.id, monday, "10:00"))
        .await
        .unwrap();

    let admin = TestUser::admin("admin@example.com");
    let all = fx
        .service
        .appointments_for(&auth(&admin), admin.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let doctors_own = fx
        .service
        .appointments_for(&auth(&fx.doctor), fx.doctor.id)
        .await
        .unwrap();
    assert_eq!(doctors_own.len(), 2);

    let patients_own = fx
        .service
        .appointments_for(&auth(&fx.patient), fx.patient.id)
        .await
        .unwrap();
    assert_eq!(patients_own.len(), 1);

    let mut no_role = auth(&fx.patient);
    no_role.role = None;
    let refused = fx.service.appointments_for(&no_role, fx.patient.id).await;
    assert_matches!(refused, Err(AppointmentError::Forbidden(_)));
}

#[tokio::test]
async fn fetch_is_for_participants_and_admins_only() {
    let fx = fixture().await;
    let appointment = fx
        .service
        .book(fx.patient.id, booking(fx.doctor.id, next_monday(), "09:00"))
        .await
        .unwrap();

    let stranger = TestUser::patient("stranger@example.com");
    let refused = fx
        .service
        .get_appointment(&auth(&stranger), stranger.id, appointment.id)
        .await;
    assert_matches!(refused, Err(AppointmentError::Forbidden(_)));

    let admin = TestUser::admin("admin@example.com");
    let fetched = fx
        .service
        .get_appointment(&auth(&admin), admin.id, appointment.id)
        .await
        .unwrap();
    assert_eq!(fetched.id, appointment.id);

    let missing = fx
        .service
        .get_appointment(&auth(&admin), admin.id, Uuid::new_v4())
        .await;
    assert_matches!(missing, Err(AppointmentError::NotFound));
}
