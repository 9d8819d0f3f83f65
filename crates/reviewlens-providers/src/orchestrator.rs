//! Normalize → resolve → ordered provider attempts → sanitize.

use std::sync::Arc;
use std::time::Duration;

use reviewlens_core::{AppConfig, ErrorKind, Identifier, InvalidPeriod, ProviderKind, ReviewPeriod};
use serde::Serialize;
use thiserror::Error;

use crate::adapters::{build_providers, ReviewProvider};
use crate::error::ProviderError;
use crate::normalize::{normalize, NormalizedInput};
use crate::resolver::{PlaceResolver, ResolutionResult};
use crate::sanitize::{sanitize, DEFAULT_MAX_REVIEWS};

/// Diagnostics for one provider call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAttemptOutcome {
    pub provider: ProviderKind,
    pub key: String,
    pub succeeded: bool,
    pub review_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Successful pipeline result.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewFetch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub provider: ProviderKind,
    pub reviews: Vec<String>,
    pub attempts: Vec<ProviderAttemptOutcome>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("no reviews found for \"{query}\"")]
    NoReviewsFound {
        query: String,
        attempts: Vec<ProviderAttemptOutcome>,
    },

    #[error("all review providers failed")]
    AllProvidersFailed { attempts: Vec<ProviderAttemptOutcome> },

    #[error("request exceeded the {deadline_ms}ms deadline")]
    Timeout {
        deadline_ms: u64,
        attempts: Vec<ProviderAttemptOutcome>,
    },
}

impl PipelineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MalformedInput(_) => ErrorKind::MalformedInput,
            PipelineError::NoReviewsFound { .. } => ErrorKind::NoReviewsFound,
            PipelineError::AllProvidersFailed { .. } => ErrorKind::ProviderError,
            PipelineError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Per-attempt outcomes gathered before the failure.
    #[must_use]
    pub fn attempts(&self) -> &[ProviderAttemptOutcome] {
        match self {
            PipelineError::MalformedInput(_) => &[],
            PipelineError::NoReviewsFound { attempts, .. }
            | PipelineError::AllProvidersFailed { attempts }
            | PipelineError::Timeout { attempts, .. } => attempts,
        }
    }
}

impl From<InvalidPeriod> for PipelineError {
    fn from(e: InvalidPeriod) -> Self {
        PipelineError::MalformedInput(e.to_string())
    }
}

/// The fallback orchestrator. Holds injected collaborators only; each call
/// is independent.
#[derive(Clone)]
pub struct ReviewPipeline {
    resolver: PlaceResolver,
    providers: Vec<Arc<dyn ReviewProvider>>,
    max_reviews: usize,
    deadline: Duration,
}

impl ReviewPipeline {
    #[must_use]
    pub fn new(
        resolver: PlaceResolver,
        providers: Vec<Arc<dyn ReviewProvider>>,
        deadline: Duration,
    ) -> Self {
        Self {
            resolver,
            providers,
            max_reviews: DEFAULT_MAX_REVIEWS,
            deadline,
        }
    }

    #[must_use]
    pub fn with_max_reviews(mut self, max_reviews: usize) -> Self {
        self.max_reviews = max_reviews.max(1);
        self
    }

    /// Wires the resolver and adapters described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(
            PlaceResolver::from_config(config)?,
            build_providers(config)?,
            config.request_deadline(),
        )
        .with_max_reviews(config.max_reviews))
    }

    /// Provider priority order, for diagnostics.
    #[must_use]
    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// Normalizes `input` and, when no identifier can be extracted offline,
    /// resolves it through the place lookup.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MalformedInput`] for blank input,
    /// [`PipelineError::Timeout`] past the request deadline.
    pub async fn resolve_place(&self, input: &str) -> Result<ResolutionResult, PipelineError> {
        let normalized = validate(input)?;
        match tokio::time::timeout(self.deadline, self.identify(&normalized)).await {
            Ok(resolution) => Ok(resolution),
            Err(_) => Err(self.timed_out(Vec::new())),
        }
    }

    /// Resolves `input` and returns the first non-empty sanitized review
    /// list, trying each provider in priority order.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::MalformedInput`] for blank input.
    /// - [`PipelineError::NoReviewsFound`] when no attempt yielded reviews
    ///   and at least one succeeded empty.
    /// - [`PipelineError::AllProvidersFailed`] when every attempt errored.
    /// - [`PipelineError::Timeout`] past the request deadline.
    pub async fn resolve_and_fetch(
        &self,
        input: &str,
        period: ReviewPeriod,
    ) -> Result<ReviewFetch, PipelineError> {
        let normalized = validate(input)?;
        let mut attempts = Vec::new();
        let outcome =
            tokio::time::timeout(self.deadline, self.fetch(&normalized, period, &mut attempts))
                .await;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(attempts)),
        }
    }

    async fn identify(&self, normalized: &NormalizedInput) -> ResolutionResult {
        if let Some(identifier) = &normalized.candidate {
            return ResolutionResult::direct(identifier.clone());
        }
        self.resolver.resolve(normalized.lookup_text()).await
    }

    async fn fetch(
        &self,
        normalized: &NormalizedInput,
        period: ReviewPeriod,
        attempts: &mut Vec<ProviderAttemptOutcome>,
    ) -> Result<ReviewFetch, PipelineError> {
        let resolution = self.identify(normalized).await;
        let keys = attempt_keys(resolution.identifier.as_ref(), &normalized.cleaned_text);

        for provider in &self.providers {
            for key in &keys {
                let kind = provider.kind();
                let outcome = provider.fetch_reviews(key, period).await;
                let reviews = match outcome {
                    Ok(batch) => sanitize(&batch.payload, self.max_reviews),
                    Err(e) => {
                        tracing::warn!(provider = %kind, key = %key, error = %e, "provider attempt failed");
                        let error_kind = e.kind();
                        attempts.push(ProviderAttemptOutcome {
                            provider: kind,
                            key: key.to_string(),
                            succeeded: false,
                            review_count: 0,
                            error_kind: Some(error_kind),
                            error: Some(e.to_string()),
                        });
                        if error_kind == ErrorKind::ConfigurationMissing {
                            break;
                        }
                        continue;
                    }
                };

                tracing::info!(provider = %kind, key = %key, count = reviews.len(), "provider attempt finished");
                attempts.push(ProviderAttemptOutcome {
                    provider: kind,
                    key: key.to_string(),
                    succeeded: true,
                    review_count: reviews.len(),
                    error_kind: None,
                    error: None,
                });

                if !reviews.is_empty() {
                    return Ok(ReviewFetch {
                        identifier: resolution.identifier.clone(),
                        display_name: resolution.display_name.clone(),
                        provider: kind,
                        reviews,
                        attempts: std::mem::take(attempts),
                    });
                }
            }
        }

        let attempts = std::mem::take(attempts);
        if !attempts.is_empty() && attempts.iter().all(|a| !a.succeeded) {
            tracing::warn!(attempts = attempts.len(), "every provider attempt failed");
            return Err(PipelineError::AllProvidersFailed { attempts });
        }
        Err(PipelineError::NoReviewsFound {
            query: resolution
                .identifier
                .as_ref()
                .map_or_else(|| normalized.cleaned_text.clone(), ToString::to_string),
            attempts,
        })
    }

    fn timed_out(&self, attempts: Vec<ProviderAttemptOutcome>) -> PipelineError {
        let deadline_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX);
        tracing::warn!(deadline_ms, "request deadline exceeded");
        PipelineError::Timeout {
            deadline_ms,
            attempts,
        }
    }
}

fn validate(input: &str) -> Result<NormalizedInput, PipelineError> {
    if input.trim().is_empty() {
        return Err(PipelineError::MalformedInput("input is required".to_owned()));
    }
    let normalized = normalize(input);
    if normalized.cleaned_text.is_empty() {
        return Err(PipelineError::MalformedInput(
            "input contains no usable text".to_owned(),
        ));
    }
    Ok(normalized)
}

/// Identifier first, then the cleaned text unless it names the same thing.
fn attempt_keys(identifier: Option<&Identifier>, cleaned_text: &str) -> Vec<Identifier> {
    let mut keys = Vec::with_capacity(2);
    if let Some(id) = identifier {
        keys.push(id.clone());
    }
    let raw = Identifier::Query(cleaned_text.to_owned());
    if identifier.is_none_or(|id| id.to_string() != cleaned_text) {
        keys.push(raw);
    }
    keys
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
