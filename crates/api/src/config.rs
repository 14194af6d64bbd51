/// Server configuration loaded from environment variables.
///
/// All fields except the shared secret have defaults suitable for
/// local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `90`, above the
    /// processor's invocation budget).
    pub request_timeout_secs: u64,
    /// Shared secret expected in the `Authorization: Bearer` header of
    /// every internal endpoint. Required, no default.
    pub processor_secret: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `HOST`                 | `0.0.0.0`   |
    /// | `PORT`                 | `3000`      |
    /// | `REQUEST_TIMEOUT_SECS` | `90`        |
    /// | `PROCESSOR_SECRET`     | (required)  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "90".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let processor_secret =
            std::env::var("PROCESSOR_SECRET").expect("PROCESSOR_SECRET must be set");

        Self {
            host,
            port,
            request_timeout_secs,
            processor_secret,
        }
    }
}
