use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::AppConfig;
use shared_store::{AppState, MemoryStore};

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HealthVillage API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // REST-backed stores when configured, otherwise in-memory.
    let state = if config.is_rest_store_configured() {
        info!("Using REST-backed stores");
        AppState::rest_backed(config.clone())
    } else {
        warn!("REST store not configured, falling back to in-memory stores");
        let store = if config.seed_demo_data {
            MemoryStore::with_demo_data().await
        } else {
            MemoryStore::new()
        };
        AppState::in_memory(config.clone(), Arc::new(store))
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    info!("Listening on {}", config.listen_addr);

    let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
