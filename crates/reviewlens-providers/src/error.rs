use reviewlens_core::ErrorKind;
use thiserror::Error;

/// Failures raised by the place lookup and review adapters.
///
/// `provider` names are static labels (`outscraper`, `places_lookup`, ...)
/// so errors stay cheap to build inside retry loops.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured: {var} is missing")]
    ConfigurationMissing {
        provider: &'static str,
        var: &'static str,
    },

    #[error("HTTP error from {provider}: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    #[error("unexpected HTTP status {status} from {provider}: {body}")]
    UnexpectedStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} reported an error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} found no match for \"{query}\"")]
    NotFound {
        provider: &'static str,
        query: String,
    },

    #[error("{provider} results were not ready after {elapsed_ms}ms")]
    Timeout {
        provider: &'static str,
        elapsed_ms: u64,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Longest provider body kept for diagnostics.
const MAX_BODY_CHARS: usize = 300;

impl ProviderError {
    /// Wraps a transport error, stripping the request URL so credentials
    /// passed as query parameters never reach logs or API responses.
    pub(crate) fn http(provider: &'static str, source: reqwest::Error) -> Self {
        ProviderError::Http {
            provider,
            source: source.without_url(),
        }
    }

    pub(crate) fn status(provider: &'static str, status: u16, body: &str) -> Self {
        ProviderError::UnexpectedStatus {
            provider,
            status,
            body: truncate_body(body),
        }
    }

    /// Maps the detailed error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            ProviderError::NotFound { .. } => ErrorKind::NotFound,
            ProviderError::Timeout { .. } => ErrorKind::Timeout,
            ProviderError::Http { source, .. } if source.is_timeout() => ErrorKind::Timeout,
            ProviderError::Http { .. }
            | ProviderError::RateLimited { .. }
            | ProviderError::UnexpectedStatus { .. }
            | ProviderError::Deserialize { .. }
            | ProviderError::Api { .. }
            | ProviderError::InvalidUrl { .. } => ErrorKind::ProviderError,
        }
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_CHARS {
        return trimmed.to_owned();
    }
    let mut cut: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
    cut.push('…');
    cut
}
