use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use doctor_cell::models::{AvailabilityEntry, DoctorError};
use doctor_cell::services::availability::{doctor_available_at, AvailabilityService};
use shared_models::{DayName, TimeOfDay};
use shared_store::{MemoryStore, UserDirectory};
use shared_utils::test_utils::{doctor_with_windows, window, TestUser};

fn entry(day: &str, start: &str, end: &str) -> AvailabilityEntry {
    AvailabilityEntry {
        day: Some(day.to_string()),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        is_available: true,
    }
}

async fn service_with_doctor(store: &Arc<MemoryStore>) -> (AvailabilityService, Uuid) {
    let doctor = TestUser::doctor("doc@example.com");
    store.insert_user(doctor.to_domain_user()).await;
    let service = AvailabilityService::with_directory(store.clone());
    (service, doctor.id)
}

#[tokio::test]
async fn setter_accepts_a_valid_list_and_replaces_in_full() {
    let store = Arc::new(MemoryStore::new());
    let (service, doctor_id) = service_with_doctor(&store).await;

    let windows = service
        .set_availability(
            doctor_id,
            vec![entry("Monday", "09:00", "17:00"), entry("Friday", "10:00", "12:00")],
        )
        .await
        .unwrap();
    assert_eq!(windows.len(), 2);

    // A second write replaces, never merges.
    let windows = service
        .set_availability(doctor_id, vec![entry("Tuesday", "08:00", "09:00")])
        .await
        .unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].day, DayName::Tuesday);
}

#[tokio::test]
async fn setter_rejects_the_whole_list_on_any_bad_entry() {
    let store = Arc::new(MemoryStore::new());
    let (service, doctor_id) = service_with_doctor(&store).await;

    let bad_lists = vec![
        // Missing end_time.
        vec![AvailabilityEntry {
            day: Some("Monday".to_string()),
            start_time: Some("09:00".to_string()),
            end_time: None,
            is_available: true,
        }],
        // Day outside the seven-value enum.
        vec![entry("Funday", "09:00", "17:00")],
        vec![entry("monday", "09:00", "17:00")],
        // Non-HH:mm times.
        vec![entry("Monday", "9:00", "17:00")],
        vec![entry("Monday", "09:00", "5pm")],
        // start >= end, strictly.
        vec![entry("Monday", "17:00", "09:00")],
        vec![entry("Monday", "09:00", "09:00")],
        // One good entry does not save a bad list.
        vec![entry("Monday", "09:00", "17:00"), entry("Monday", "11:00", "11:00")],
    ];

    for list in bad_lists {
        let result = service.set_availability(doctor_id, list).await;
        assert_matches!(result, Err(DoctorError::Validation(_)));
    }

    // Nothing was written by any of the rejected lists.
    let windows = service.doctor_windows(doctor_id).await.unwrap();
    assert!(windows.is_empty());
}

#[tokio::test]
async fn setter_is_doctor_only() {
    let store = Arc::new(MemoryStore::new());
    let patient = TestUser::patient("pat@example.com");
    store.insert_user(patient.to_domain_user()).await;
    let service = AvailabilityService::with_directory(store.clone());

    let result = service
        .set_availability(patient.id, vec![entry("Monday", "09:00", "17:00")])
        .await;
    assert_matches!(result, Err(DoctorError::Forbidden));

    let unknown = service
        .set_availability(Uuid::new_v4(), vec![entry("Monday", "09:00", "17:00")])
        .await;
    assert_matches!(unknown, Err(DoctorError::Forbidden));
}

#[tokio::test]
async fn disabled_and_overlapping_windows_are_stored_as_given() {
    let store = Arc::new(MemoryStore::new());
    let (service, doctor_id) = service_with_doctor(&store).await;

    let mut disabled = entry("Monday", "09:00", "12:00");
    disabled.is_available = false;

    let windows = service
        .set_availability(
            doctor_id,
            vec![disabled, entry("Monday", "09:00", "17:00"), entry("Monday", "10:00", "11:00")],
        )
        .await
        .unwrap();
    // Flat list, no dedup or merging of the overlaps.
    assert_eq!(windows.len(), 3);
    assert!(!windows[0].is_available);
}

#[test]
fn matcher_is_day_aware_and_half_open() {
    let doctor = TestUser::doctor("doc@example.com");
    let record = doctor_with_windows(&doctor, vec![window(DayName::Monday, "09:00", "17:00")]);

    // 2026-03-02 is a Monday.
    let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let tuesday = monday.succ_opt().unwrap();
    let at = |s: &str| TimeOfDay::parse(s).unwrap();

    assert!(doctor_available_at(&record, monday, at("09:00")));
    assert!(doctor_available_at(&record, monday, at("16:59")));
    assert!(!doctor_available_at(&record, monday, at("17:00")));
    assert!(!doctor_available_at(&record, monday, at("08:59")));
    assert!(!doctor_available_at(&record, tuesday, at("09:00")));
}

#[test]
fn matcher_ignores_disabled_windows_but_any_enabled_overlap_matches() {
    let doctor = TestUser::doctor("doc@example.com");
    let mut disabled = window(DayName::Monday, "09:00", "17:00");
    disabled.is_available = false;
    let record = doctor_with_windows(
        &doctor,
        vec![disabled, window(DayName::Monday, "10:00", "11:00")],
    );

    let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let at = |s: &str| TimeOfDay::parse(s).unwrap();

    assert!(!doctor_available_at(&record, monday, at("09:30")));
    assert!(doctor_available_at(&record, monday, at("10:30")));
}

#[tokio::test]
async fn listing_returns_doctors_with_windows() {
    let store = Arc::new(MemoryStore::new());
    let (service, doctor_id) = service_with_doctor(&store).await;
    store
        .insert_user(TestUser::patient("pat@example.com").to_domain_user())
        .await;

    service
        .set_availability(doctor_id, vec![entry("Wednesday", "13:00", "15:00")])
        .await
        .unwrap();

    let doctors = service.available_doctors().await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, doctor_id);
    assert_eq!(doctors[0].availability_slots.len(), 1);

    // The fetched record agrees with the directory write.
    let stored = store.fetch_user(doctor_id).await.unwrap().unwrap();
    assert_eq!(stored.availability().len(), 1);
}
