use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse failure taxonomy shared by every stage of the pipeline.
///
/// Library errors carry their own detail but always map onto one of these
/// kinds so callers can make fallback and status-code decisions without
/// matching on provider-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required credential or env value is absent.
    ConfigurationMissing,
    /// The lookup or provider legitimately found nothing.
    NotFound,
    /// Non-2xx or unusable response from a collaborator after local retries.
    ProviderError,
    /// A polling loop or request deadline ran out.
    Timeout,
    /// Every fallback attempt completed but none produced reviews.
    NoReviewsFound,
    /// The caller supplied an unusable period or empty input.
    MalformedInput,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ConfigurationMissing => "configuration_missing",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NoReviewsFound => "no_reviews_found",
            ErrorKind::MalformedInput => "malformed_input",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
