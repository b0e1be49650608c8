use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub listen_addr: String,
    pub rest_base_url: Option<String>,
    pub rest_service_key: String,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            listen_addr: env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| {
                    warn!("LISTEN_ADDR not set, using default");
                    "0.0.0.0:3000".to_string()
                }),
            rest_base_url: env::var("REST_BASE_URL").ok().filter(|v| !v.is_empty()),
            rest_service_key: env::var("REST_SERVICE_KEY")
                .unwrap_or_else(|_| String::new()),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(true),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn is_rest_store_configured(&self) -> bool {
        self.rest_base_url.is_some()
    }
}
