use std::time::Duration;

use crate::errors::AskError;

const DEFAULT_ASK_PATH: &str = "/v1/ask";

/// Configuration for the HTTP ask client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the ask service, for example `http://localhost:8080`.
    pub base_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Path of the ask endpoint relative to `base_url`.
    pub ask_path: String,
    /// Timeout for non-streamed requests.
    ///
    /// Streamed responses are bounded by the per-call deadline instead, since
    /// a healthy stream can outlive any fixed request timeout.
    pub timeout: Duration,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Creates a config with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            ask_path: DEFAULT_ASK_PATH.to_string(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Builds a config from the environment.
    ///
    /// - `ASKSTREAM_BASE_URL` (required)
    /// - `ASKSTREAM_API_KEY` (optional bearer token)
    /// - `ASKSTREAM_TIMEOUT_SECS` (optional)
    pub fn from_env() -> Result<Self, AskError> {
        let base_url = std::env::var("ASKSTREAM_BASE_URL").unwrap_or_default();
        if base_url.trim().is_empty() {
            return Err(AskError::Config("missing ASKSTREAM_BASE_URL".into()));
        }
        let mut config = Self::new(base_url.trim());
        if let Ok(key) = std::env::var("ASKSTREAM_API_KEY")
            && !key.trim().is_empty()
        {
            config.api_key = Some(key.trim().to_string());
        }
        if let Ok(raw) = std::env::var("ASKSTREAM_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AskError::Config(format!("ASKSTREAM_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn ask_path(mut self, path: impl Into<String>) -> Self {
        self.ask_path = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Checks the config before a client is built from it.
    pub fn validate(&self) -> Result<(), AskError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(AskError::Config("base_url must not be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AskError::Config(format!(
                "base_url must start with http:// or https://, got {base}"
            )));
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(AskError::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }

    pub(crate) fn ask_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            self.ask_path.trim_start_matches('/')
        )
    }
}
