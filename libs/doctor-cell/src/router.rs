use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_store::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    Router::new()
        .route("/available", get(handlers::get_available_doctors))
        .route("/availability", put(handlers::set_availability))
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
