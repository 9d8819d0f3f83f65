use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reviewlens_core::{Identifier, ProviderKind, ReviewPeriod};
use serde_json::{json, Value};

use super::{retain_since, AdapterSettings, RawReviewBatch, ReviewProvider};
use crate::error::ProviderError;
use crate::http::send_json;

const PROVIDER: &str = "google_places";
const DEFAULT_BASE_URL: &str = "https://places.googleapis.com";
const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

/// Google Places API (New). Returns at most the handful of reviews Google
/// exposes per place, filtered client-side by `publishTime`.
pub struct GooglePlacesProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    settings: AdapterSettings,
}

impl GooglePlacesProvider {
    #[must_use]
    pub fn new(client: Client, api_key: Option<String>, settings: AdapterSettings) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_owned(),
            settings,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn search_text(&self, api_key: &str, text: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/places:searchText", self.base_url);
        let body = json!({ "textQuery": text });
        let value = send_json(&self.settings.retry, PROVIDER, || {
            self.client
                .post(&url)
                .header(API_KEY_HEADER, api_key)
                .header(FIELD_MASK_HEADER, "places.id,places.displayName")
                .json(&body)
        })
        .await?;

        value
            .pointer("/places/0/id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER,
                query: text.to_owned(),
            })
    }

    async fn details(&self, api_key: &str, place_id: &str) -> Result<Value, ProviderError> {
        let url = format!("{}/v1/places/{place_id}", self.base_url);
        send_json(&self.settings.retry, PROVIDER, || {
            self.client
                .get(&url)
                .header(API_KEY_HEADER, api_key)
                .header(FIELD_MASK_HEADER, "id,displayName,reviews")
        })
        .await
    }
}

#[async_trait]
impl ReviewProvider for GooglePlacesProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GooglePlaces
    }

    async fn fetch_reviews(
        &self,
        key: &Identifier,
        period: ReviewPeriod,
    ) -> Result<RawReviewBatch, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::ConfigurationMissing {
                provider: PROVIDER,
                var: "GOOGLE_MAPS_API_KEY",
            })?;

        // Knowledge-graph (`g/...`) ids and cids have no Places resource.
        let place_id = match key {
            Identifier::PlaceId(id) if !id.starts_with("g/") => id.clone(),
            Identifier::Query(text) => self.search_text(api_key, text).await?,
            Identifier::PlaceId(_) | Identifier::Cid(_) => {
                return Err(ProviderError::NotFound {
                    provider: PROVIDER,
                    query: key.to_string(),
                })
            }
        };

        let mut details = self.details(api_key, &place_id).await?;
        let cutoff = period.cutoff(Utc::now());
        if let Some(Value::Array(reviews)) = details.get_mut("reviews") {
            retain_since(reviews, "publishTime", cutoff);
        }
        Ok(RawReviewBatch::new(details))
    }
}
