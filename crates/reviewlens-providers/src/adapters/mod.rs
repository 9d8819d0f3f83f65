//! One adapter per review-data provider, all behind [`ReviewProvider`].

mod google_places;
mod outscraper;
mod serpapi;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewlens_core::{AppConfig, Identifier, ProviderKind, ReviewPeriod};
use serde_json::Value;

use crate::error::ProviderError;
use crate::http::build_client;
use crate::poll::PollConfig;
use crate::retry::RetryPolicy;

pub use google_places::GooglePlacesProvider;
pub use outscraper::OutscraperProvider;
pub use serpapi::SerpApiProvider;

/// Provider-shaped JSON, handed unchanged to [`crate::sanitize::sanitize`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawReviewBatch {
    pub payload: Value,
}

impl RawReviewBatch {
    #[must_use]
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }
}

/// Uniform contract every review source implements.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Fetches reviews for `key` restricted to `period`.
    ///
    /// Zero reviews is a valid, empty batch rather than an error.
    ///
    /// # Errors
    ///
    /// [`ProviderError::ConfigurationMissing`] when the provider's credential
    /// is absent, [`ProviderError::Timeout`] when polling runs out of time,
    /// and the other variants for transport or payload failures.
    async fn fetch_reviews(
        &self,
        key: &Identifier,
        period: ReviewPeriod,
    ) -> Result<RawReviewBatch, ProviderError>;
}

/// Settings shared by every adapter built from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub retry: RetryPolicy,
    pub poll: PollConfig,
    pub reviews_limit: u32,
}

impl AdapterSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            poll: PollConfig::from_config(config),
            reviews_limit: config.reviews_per_request.max(1),
        }
    }
}

/// Builds the adapters named in `config.provider_order`, in that order.
/// Adapters whose credential is missing are still built; they report
/// `ConfigurationMissing` when called.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if an HTTP client cannot be built.
pub fn build_providers(config: &AppConfig) -> Result<Vec<Arc<dyn ReviewProvider>>, ProviderError> {
    let settings = AdapterSettings::from_config(config);
    config
        .provider_order
        .iter()
        .map(|kind| {
            let client = build_client(config.http_timeout_secs, &config.user_agent)?;
            let provider: Arc<dyn ReviewProvider> = match kind {
                ProviderKind::Outscraper => Arc::new(OutscraperProvider::new(
                    client,
                    config.outscraper_api_key.clone(),
                    settings.clone(),
                )),
                ProviderKind::SerpApi => Arc::new(SerpApiProvider::new(
                    client,
                    config.serpapi_key.clone(),
                    settings.clone(),
                )),
                ProviderKind::GooglePlaces => Arc::new(GooglePlacesProvider::new(
                    client,
                    config.google_maps_api_key.clone(),
                    settings.clone(),
                )),
            };
            Ok::<_, ProviderError>(provider)
        })
        .collect()
}

/// Keeps entries of `items` whose `field` timestamp is on or after `cutoff`.
/// Entries with a missing or unparseable timestamp are kept.
pub(crate) fn retain_since(items: &mut Vec<Value>, field: &str, cutoff: Option<DateTime<Utc>>) {
    let Some(cutoff) = cutoff else {
        return;
    };
    items.retain(|item| published_at(item, field).is_none_or(|at| at >= cutoff));
}

pub(crate) fn published_at(item: &Value, field: &str) -> Option<DateTime<Utc>> {
    item.get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}
