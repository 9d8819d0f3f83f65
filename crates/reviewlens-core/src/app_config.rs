use std::net::SocketAddr;
use std::time::Duration;

use crate::provider::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub google_maps_api_key: Option<String>,
    pub outscraper_api_key: Option<String>,
    pub serpapi_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub provider_order: Vec<ProviderKind>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_jitter_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_budget_secs: u64,
    pub request_deadline_secs: u64,
    pub max_reviews: usize,
    pub reviews_per_request: u32,
    /// Bearer tokens accepted by the HTTP server.
    pub api_keys: Vec<String>,
    /// Requests each client may make per minute on protected routes.
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn poll_budget(&self) -> Duration {
        Duration::from_secs(self.poll_budget_secs)
    }

    #[must_use]
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("google_maps_api_key", &redact(&self.google_maps_api_key))
            .field("outscraper_api_key", &redact(&self.outscraper_api_key))
            .field("serpapi_key", &redact(&self.serpapi_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("provider_order", &self.provider_order)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_jitter_ms", &self.retry_max_jitter_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_budget_secs", &self.poll_budget_secs)
            .field("request_deadline_secs", &self.request_deadline_secs)
            .field("max_reviews", &self.max_reviews)
            .field("reviews_per_request", &self.reviews_per_request)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
