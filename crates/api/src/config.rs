use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`, above the
    /// pipeline execution ceiling so processor invocations are not cut
    /// short by the HTTP layer).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Externally reachable base URL of this server, used for
    /// continuation self-invocations (default: `http://127.0.0.1:{port}`).
    pub public_base_url: String,
    /// Shared secret for signing job-scoped continuation tokens.
    pub internal_token_secret: String,
    /// JWT token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Required | Default                  |
    /// |-------------------------|----------|--------------------------|
    /// | `HOST`                  | no       | `0.0.0.0`                |
    /// | `PORT`                  | no       | `3000`                   |
    /// | `CORS_ORIGINS`          | no       | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`  | no       | `600`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | no       | `30`                     |
    /// | `PUBLIC_BASE_URL`       | no       | `http://127.0.0.1:{port}`|
    /// | `INTERNAL_TOKEN_SECRET` | **yes**  | --                       |
    ///
    /// # Panics
    ///
    /// Panics on malformed values or a missing secret.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{port}"));

        let internal_token_secret = std::env::var("INTERNAL_TOKEN_SECRET")
            .expect("INTERNAL_TOKEN_SECRET must be set in the environment");
        assert!(
            !internal_token_secret.is_empty(),
            "INTERNAL_TOKEN_SECRET must not be empty"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            public_base_url,
            internal_token_secret,
            jwt,
        }
    }
}
