use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_store::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn consultation_routes(state: AppState) -> Router {
    Router::new()
        .route("/initiate", post(handlers::initiate_session))
        .route("/start", post(handlers::start_session))
        .route("/end", post(handlers::end_session))
        .route("/cancel", post(handlers::cancel_session))
        .route("/", get(handlers::get_sessions))
        .route("/{session_id}", get(handlers::get_session))
        .route("/{session_id}/token", get(handlers::get_session_token))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
