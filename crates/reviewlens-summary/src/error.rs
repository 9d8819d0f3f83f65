use reviewlens_core::ErrorKind;
use reviewlens_providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summarizer is not configured: {var} is missing")]
    ConfigurationMissing { var: &'static str },

    #[error("no reviews to summarize")]
    NoReviews,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("completion response had no message content")]
    EmptyCompletion,

    #[error("could not read an analysis from the completion: {0}")]
    Unparseable(String),
}

impl SummaryError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummaryError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            SummaryError::NoReviews => ErrorKind::MalformedInput,
            SummaryError::Provider(e) => e.kind(),
            SummaryError::EmptyCompletion | SummaryError::Unparseable(_) => {
                ErrorKind::ProviderError
            }
        }
    }
}
