//! Mock backend configuration.
//!
//! Built from environment variables at startup and injected into Axum
//! handlers via [`axum::extract::State`].

/// Global configuration shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to listen on (default `3001`).
    pub listen_port: u16,
    /// Secret used to sign and verify HS256 access tokens.
    pub jwt_secret: String,
    /// Realtime bus to publish change events on. `None` disables the
    /// realtime plane (queries and mutations still work).
    pub nats_url: Option<String>,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable          | Default                  | Description                     |
    /// |-------------------|--------------------------|---------------------------------|
    /// | `MOCK_PORT`       | `3001`                   | HTTP listen port                |
    /// | `MOCK_JWT_SECRET` | `kollabx-dev-secret`     | HS256 access-token secret       |
    /// | `MOCK_NATS_URL`   | `nats://localhost:4222`  | Realtime bus (`none` to disable)|
    pub fn from_env() -> Self {
        let listen_port: u16 = std::env::var("MOCK_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3001);

        let jwt_secret = std::env::var("MOCK_JWT_SECRET")
            .unwrap_or_else(|_| "kollabx-dev-secret".to_string());

        let nats_url = match std::env::var("MOCK_NATS_URL") {
            Ok(v) if v.eq_ignore_ascii_case("none") => None,
            Ok(v) => Some(v),
            Err(_) => Some("nats://localhost:4222".to_string()),
        };

        Self {
            listen_port,
            jwt_secret,
            nats_url,
        }
    }
}
