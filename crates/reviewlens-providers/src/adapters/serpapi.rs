use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reviewlens_core::{Identifier, ProviderKind, ReviewPeriod};
use serde_json::{json, Value};

use super::{published_at, AdapterSettings, RawReviewBatch, ReviewProvider};
use crate::error::ProviderError;
use crate::http::send_json;

const PROVIDER: &str = "serp_api";
const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// Upper bound on review pages fetched per request. Guards against cycling
/// pagination tokens.
const MAX_PAGES: usize = 10;

/// SerpApi Google Maps: a `google_maps` search to find the place's
/// `data_id`, then paginated `google_maps_reviews` sorted newest first.
pub struct SerpApiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    settings: AdapterSettings,
}

impl SerpApiProvider {
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

    async fn search(&self, api_key: &str, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let url = format!("{}/search.json", self.base_url);
        let value = send_json(&self.settings.retry, PROVIDER, || {
            self.client
                .get(&url)
                .query(params)
                .query(&[("api_key", api_key)])
        })
        .await?;

        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message: message.to_owned(),
            });
        }
        Ok(value)
    }

    async fn find_data_id(&self, api_key: &str, key: &Identifier) -> Result<String, ProviderError> {
        let mut params = vec![("engine", "google_maps"), ("hl", "en")];
        match key {
            Identifier::PlaceId(id) => params.push(("place_id", id.as_str())),
            Identifier::Cid(cid) => params.push(("data_cid", cid.as_str())),
            Identifier::Query(text) => {
                params.push(("type", "search"));
                params.push(("q", text.as_str()));
            }
        }

        let value = match self.search(api_key, &params).await {
            Err(ProviderError::Api { message, .. }) if is_no_results(&message) => {
                return Err(not_found(key));
            }
            other => other?,
        };

        value
            .pointer("/place_results/data_id")
            .or_else(|| value.pointer("/local_results/0/data_id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| not_found(key))
    }
}

fn is_no_results(message: &str) -> bool {
    message.to_ascii_lowercase().contains("hasn't returned any results")
}

fn not_found(key: &Identifier) -> ProviderError {
    ProviderError::NotFound {
        provider: PROVIDER,
        query: key.to_string(),
    }
}

fn next_page_token(page: &Value) -> Option<&str> {
    page.pointer("/serpapi_pagination/next_page_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl ReviewProvider for SerpApiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SerpApi
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
                var: "SERPAPI_KEY",
            })?;

        let data_id = self.find_data_id(api_key, key).await?;
        let cutoff = period.cutoff(Utc::now());
        let limit = usize::try_from(self.settings.reviews_limit).unwrap_or(usize::MAX);

        let mut reviews: Vec<Value> = Vec::new();
        let mut token: Option<String> = None;

        for page_number in 1..=MAX_PAGES {
            let mut params = vec![
                ("engine", "google_maps_reviews"),
                ("data_id", data_id.as_str()),
                ("sort_by", "newestFirst"),
                ("hl", "en"),
            ];
            if let Some(t) = token.as_deref() {
                params.push(("next_page_token", t));
            }
            let page = match self.search(api_key, &params).await {
                Ok(page) => page,
                // SerpApi reports an exhausted or empty review list as an error.
                Err(ProviderError::Api { message, .. }) if is_no_results(&message) => break,
                Err(e) if page_number > 1 => {
                    tracing::warn!(
                        provider = PROVIDER,
                        page = page_number,
                        collected = reviews.len(),
                        error = %e,
                        "review page failed; keeping earlier pages"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            let mut reached_cutoff = false;
            if let Some(items) = page.get("reviews").and_then(Value::as_array) {
                for item in items {
                    let too_old = cutoff
                        .zip(published_at(item, "iso_date"))
                        .is_some_and(|(cutoff, at)| at < cutoff);
                    if too_old {
                        reached_cutoff = true;
                        break;
                    }
                    reviews.push(item.clone());
                }
            }

            tracing::debug!(
                provider = PROVIDER,
                page = page_number,
                collected = reviews.len(),
                "fetched review page"
            );

            if reached_cutoff || reviews.len() >= limit {
                break;
            }
            match next_page_token(&page) {
                Some(next) => token = Some(next.to_owned()),
                None => break,
            }
        }

        reviews.truncate(limit);
        Ok(RawReviewBatch::new(json!({
            "data_id": data_id,
            "reviews": reviews,
        })))
    }
}
