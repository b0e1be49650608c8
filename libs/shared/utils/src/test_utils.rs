use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    AvailabilityWindow, DayName, DoctorProfile, Gender, PatientProfile, RoleProfile, TimeOfDay,
    User,
};

pub struct TestConfig {
    pub jwt_secret: String,
    pub listen_addr: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            listen_addr: self.listen_addr.clone(),
            rest_base_url: None,
            rest_service_key: String::new(),
            seed_demo_data: false,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    /// The matching directory record, so a minted token's subject resolves
    /// to a stored user. Doctors get no windows; add them with
    /// [`doctor_with_windows`].
    pub fn to_domain_user(&self) -> User {
        let profile = match self.role.as_str() {
            "doctor" => RoleProfile::Doctor(DoctorProfile {
                specialization: "General Practitioner".to_string(),
                years_of_experience: 5,
                availability_slots: vec![],
            }),
            "admin" => RoleProfile::Admin,
            _ => RoleProfile::Patient(PatientProfile {
                age: 30,
                gender: Gender::Other,
                village: "Test Village".to_string(),
            }),
        };
        let now = Utc::now();
        User {
            id: self.id,
            name: format!("Test {}", self.role),
            email: self.email.clone(),
            phone: None,
            profile,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A doctor record carrying the given weekly windows.
pub fn doctor_with_windows(test_user: &TestUser, windows: Vec<AvailabilityWindow>) -> User {
    let mut user = test_user.to_domain_user();
    if let RoleProfile::Doctor(doctor) = &mut user.profile {
        doctor.availability_slots = windows;
    }
    user
}

/// Shorthand for one enabled window, panicking on bad literals (test-only).
pub fn window(day: DayName, start: &str, end: &str) -> AvailabilityWindow {
    AvailabilityWindow {
        day,
        start_time: TimeOfDay::parse(start).unwrap(),
        end_time: TimeOfDay::parse(end).unwrap(),
        is_available: true,
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}
