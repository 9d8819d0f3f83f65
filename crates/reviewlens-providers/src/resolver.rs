//! Free-text place resolution via the Google "Find Place From Text" API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reviewlens_core::{AppConfig, ErrorKind, Identifier};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{build_client, send_json};
use crate::retry::RetryPolicy;

const PROVIDER: &str = "places_lookup";
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// First match returned by a place lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub name: Option<String>,
}

/// External service that turns free text into a place.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Returns the top candidate for `text`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotFound`] when nothing matches; any other variant
    /// for transport, status, or payload failures.
    async fn find_place(&self, text: &str) -> Result<PlaceCandidate, ProviderError>;
}

/// Outcome of resolving one input. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ResolutionResult {
    #[must_use]
    pub fn direct(identifier: Identifier) -> Self {
        Self {
            identifier: Some(identifier),
            ..Self::default()
        }
    }

    fn failed(kind: ErrorKind) -> Self {
        Self {
            error: Some(kind),
            ..Self::default()
        }
    }
}

/// Resolves free text to a canonical identifier. Every failure is folded
/// into [`ResolutionResult::error`]; resolution is never fatal.
#[derive(Clone)]
pub struct PlaceResolver {
    lookup: Option<Arc<dyn PlaceLookup>>,
}

impl PlaceResolver {
    #[must_use]
    pub fn new(lookup: Option<Arc<dyn PlaceLookup>>) -> Self {
        Self { lookup }
    }

    /// Builds a resolver backed by [`GooglePlacesLookup`], or an inert one
    /// when `GOOGLE_MAPS_API_KEY` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let lookup = match config.google_maps_api_key.as_deref() {
            Some(key) => {
                let client = build_client(config.http_timeout_secs, &config.user_agent)?;
                let lookup: Arc<dyn PlaceLookup> = Arc::new(GooglePlacesLookup::new(
                    client,
                    key,
                    RetryPolicy::from_config(config),
                ));
                Some(lookup)
            }
            None => None,
        };
        Ok(Self::new(lookup))
    }

    pub async fn resolve(&self, text: &str) -> ResolutionResult {
        let text = text.trim();
        if text.is_empty() {
            return ResolutionResult::failed(ErrorKind::MalformedInput);
        }
        let Some(lookup) = &self.lookup else {
            tracing::debug!("place lookup not configured; skipping resolution");
            return ResolutionResult::failed(ErrorKind::ConfigurationMissing);
        };

        match lookup.find_place(text).await {
            Ok(candidate) => {
                tracing::debug!(place_id = %candidate.place_id, "resolved place");
                ResolutionResult {
                    identifier: Some(Identifier::PlaceId(candidate.place_id)),
                    display_name: candidate.name,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "place resolution failed");
                ResolutionResult::failed(e.kind())
            }
        }
    }
}

/// [`PlaceLookup`] against `findplacefromtext/json`.
pub struct GooglePlacesLookup {
    client: Client,
    api_key: String,
    base_url: String,
    policy: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    #[serde(default)]
    candidates: Vec<FindPlaceCandidate>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindPlaceCandidate {
    place_id: Option<String>,
    name: Option<String>,
}

impl GooglePlacesLookup {
    #[must_use]
    pub fn new(client: Client, api_key: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            policy,
        }
    }

    /// Points the lookup at a different host (mock servers in tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[async_trait]
impl PlaceLookup for GooglePlacesLookup {
    async fn find_place(&self, text: &str) -> Result<PlaceCandidate, ProviderError> {
        let url = format!("{}/maps/api/place/findplacefromtext/json", self.base_url);
        let value = send_json(&self.policy, PROVIDER, || {
            self.client.get(&url).query(&[
                ("input", text),
                ("inputtype", "textquery"),
                ("fields", "place_id,name"),
                ("key", self.api_key.as_str()),
            ])
        })
        .await?;

        let response: FindPlaceResponse =
            serde_json::from_value(value).map_err(|source| ProviderError::Deserialize {
                context: "findplacefromtext response".to_owned(),
                source,
            })?;

        match response.status.as_deref().unwrap_or("OK") {
            "OK" => {}
            "ZERO_RESULTS" => {
                return Err(ProviderError::NotFound {
                    provider: PROVIDER,
                    query: text.to_owned(),
                })
            }
            other => {
                let message = match response.error_message {
                    Some(detail) => format!("{other}: {detail}"),
                    None => other.to_owned(),
                };
                return Err(ProviderError::Api {
                    provider: PROVIDER,
                    message,
                });
            }
        }

        response
            .candidates
            .into_iter()
            .find_map(|c| {
                let place_id = c.place_id.filter(|id| !id.trim().is_empty())?;
                Some(PlaceCandidate {
                    place_id,
                    name: c.name.filter(|n| !n.trim().is_empty()),
                })
            })
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER,
                query: text.to_owned(),
            })
    }
}
