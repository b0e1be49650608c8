use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentQuery, AppointmentStatus, AvailabilityWindow, ConsultationSession,
    NewAppointment, NewSession, SessionPatch, SessionQuery, SessionStatus, User,
};

use crate::{AppointmentStore, SessionStore, StoreError, UserDirectory};

/// PostgREST-dialect adapter over the `users`, `appointments`, and
/// `consultation_sessions` tables. The compare-and-swap status guard rides
/// the PATCH filter: `status=eq.<expected>` matching zero rows means the
/// record moved underneath the caller.
pub struct RestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl RestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.rest_base_url.clone().unwrap_or_default(),
            service_key: config.rest_service_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request {} {}", method, url);

        let mut headers = self.get_headers();
        if matches!(method, Method::POST | Method::PATCH) {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store API error ({}): {}", status, error_text);
            return Err(StoreError::Backend(format!(
                "store API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn fetch_one<T>(&self, path: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut rows: Vec<T> = self.request(Method::GET, path, None).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }
}

fn appointment_filter(query: &AppointmentQuery) -> String {
    let mut filters = Vec::new();
    if let Some(doctor_id) = query.doctor_id {
        filters.push(format!("doctor_id=eq.{}", doctor_id));
    }
    if let Some(patient_id) = query.patient_id {
        filters.push(format!("patient_id=eq.{}", patient_id));
    }
    if let Some(status) = query.status {
        filters.push(format!("status=eq.{}", status));
    }
    if let Some(from) = query.from_date {
        filters.push(format!("appointment_date=gte.{}", from));
    }
    if let Some(to) = query.to_date {
        filters.push(format!("appointment_date=lte.{}", to));
    }
    filters.push("order=appointment_date.asc,time_slot.asc".to_string());
    filters.join("&")
}

#[async_trait]
impl UserDirectory for RestStore {
    async fn fetch_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.fetch_one(&format!("/users?id=eq.{}", id)).await
    }

    async fn list_users_by_role(&self, role: &str) -> Result<Vec<User>, StoreError> {
        let path = format!("/users?role=eq.{}&order=name.asc", urlencoding::encode(role));
        self.request(Method::GET, &path, None).await
    }

    async fn replace_availability(
        &self,
        doctor_id: Uuid,
        windows: Vec<AvailabilityWindow>,
    ) -> Result<User, StoreError> {
        let path = format!("/users?id=eq.{}&role=eq.doctor", doctor_id);
        let body = json!({
            "availability_slots": windows,
            "updated_at": Utc::now(),
        });
        let mut rows: Vec<User> = self.request(Method::PATCH, &path, Some(body)).await?;
        if rows.is_empty() {
            // No doctor record under that id, whatever else may exist there.
            return Err(StoreError::NotFound);
        }
        Ok(rows.remove(0))
    }
}

#[async_trait]
impl AppointmentStore for RestStore {
    async fn create_appointment(
        &self,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let body = json!({
            "patient_id": new_appointment.patient_id,
            "doctor_id": new_appointment.doctor_id,
            "appointment_date": new_appointment.appointment_date,
            "time_slot": new_appointment.time_slot,
            "duration_minutes": new_appointment.duration_minutes,
            "consultation_type": new_appointment.consultation_type,
            "status": AppointmentStatus::Pending,
        });
        let mut rows: Vec<Appointment> = self
            .request(Method::POST, "/appointments", Some(body))
            .await?;
        if rows.is_empty() {
            return Err(StoreError::Backend(
                "appointment insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn fetch_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.fetch_one(&format!("/appointments?id=eq.{}", id)).await
    }

    async fn query_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("/appointments?{}", appointment_filter(query));
        self.request(Method::GET, &path, None).await
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let path = match expected {
            Some(expected) => format!("/appointments?id=eq.{}&status=eq.{}", id, expected),
            None => format!("/appointments?id=eq.{}", id),
        };
        let body = json!({
            "status": status,
            "updated_at": Utc::now(),
        });
        let mut rows: Vec<Appointment> = self.request(Method::PATCH, &path, Some(body)).await?;
        if let Some(appointment) = rows.pop() {
            return Ok(appointment);
        }
        // Zero rows: either the record is gone or the guard lost the race.
        match (expected, self.fetch_appointment(id).await?) {
            (Some(expected), Some(_)) => Err(StoreError::StaleState {
                expected: expected.to_string(),
            }),
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl SessionStore for RestStore {
    async fn create_session(
        &self,
        new_session: NewSession,
    ) -> Result<ConsultationSession, StoreError> {
        let body = json!({
            "session_id": new_session.session_id,
            "appointment_id": new_session.appointment_id,
            "patient_id": new_session.patient_id,
            "doctor_id": new_session.doctor_id,
            "consultation_type": new_session.consultation_type,
            "status": SessionStatus::Scheduled,
            "duration_minutes": 0,
        });
        let mut rows: Vec<ConsultationSession> = self
            .request(Method::POST, "/consultation_sessions", Some(body))
            .await?;
        if rows.is_empty() {
            return Err(StoreError::Backend(
                "session insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn fetch_session(&self, id: Uuid) -> Result<Option<ConsultationSession>, StoreError> {
        self.fetch_one(&format!("/consultation_sessions?id=eq.{}", id))
            .await
    }

    async fn fetch_session_by_public_id(
        &self,
        session_id: &str,
    ) -> Result<Option<ConsultationSession>, StoreError> {
        let path = format!(
            "/consultation_sessions?session_id=eq.{}",
            urlencoding::encode(session_id)
        );
        self.fetch_one(&path).await
    }

    async fn sessions_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Vec<ConsultationSession>, StoreError> {
        let path = format!("/consultation_sessions?appointment_id=eq.{}", appointment_id);
        self.request(Method::GET, &path, None).await
    }

    async fn query_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<ConsultationSession>, StoreError> {
        let mut filters = Vec::new();
        if let Some(doctor_id) = query.doctor_id {
            filters.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(patient_id) = query.patient_id {
            filters.push(format!("patient_id=eq.{}", patient_id));
        }
        filters.push("order=created_at.desc".to_string());
        let path = format!("/consultation_sessions?{}", filters.join("&"));
        self.request(Method::GET, &path, None).await
    }

    async fn update_session(
        &self,
        id: Uuid,
        expected: SessionStatus,
        patch: SessionPatch,
    ) -> Result<ConsultationSession, StoreError> {
        let path = format!("/consultation_sessions?id=eq.{}&status=eq.{}", id, expected);
        let mut body = serde_json::to_value(&patch).map_err(|e| StoreError::Backend(e.to_string()))?;
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), json!(Utc::now()));
        }
        let mut rows: Vec<ConsultationSession> =
            self.request(Method::PATCH, &path, Some(body)).await?;
        if let Some(session) = rows.pop() {
            return Ok(session);
        }
        match self.fetch_session(id).await? {
            Some(_) => Err(StoreError::StaleState {
                expected: expected.to_string(),
            }),
            None => Err(StoreError::NotFound),
        }
    }
}
