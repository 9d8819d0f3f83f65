use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use reviewlens_core::{Identifier, ProviderKind, ReviewPeriod};
use serde_json::{json, Value};

use super::{AdapterSettings, RawReviewBatch, ReviewProvider};
use crate::error::ProviderError;
use crate::http::send_json;
use crate::poll::poll_until_ready;

const PROVIDER: &str = "outscraper";
const DEFAULT_BASE_URL: &str = "https://api.app.outscraper.com";
const API_KEY_HEADER: &str = "X-API-KEY";

/// Outscraper Google Maps reviews, submitted asynchronously and polled via
/// `results_location`.
///
/// The v3 `GET /maps/reviews-v3` endpoint is tried first; a 404 or 405
/// falls back to the legacy `POST /api/google_maps/reviews`.
pub struct OutscraperProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    settings: AdapterSettings,
}

impl OutscraperProvider {
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

    fn authed(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, api_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn submit(
        &self,
        api_key: &str,
        query: &str,
        cutoff: Option<i64>,
    ) -> Result<Value, ProviderError> {
        let url = format!("{}/maps/reviews-v3", self.base_url);
        let limit = self.settings.reviews_limit.to_string();
        let cutoff_param = cutoff.map(|c| c.to_string());

        let v3 = send_json(&self.settings.retry, PROVIDER, || {
            let mut params = vec![
                ("query", query),
                ("reviewsLimit", limit.as_str()),
                ("async", "true"),
                ("sort", "newest"),
            ];
            if let Some(cutoff) = cutoff_param.as_deref() {
                params.push(("cutoff", cutoff));
            }
            self.authed(self.client.get(&url), api_key).query(&params)
        })
        .await;

        match v3 {
            Err(ProviderError::UnexpectedStatus {
                status: 404 | 405, ..
            }) => {
                tracing::info!(provider = PROVIDER, "v3 endpoint unavailable; using legacy endpoint");
                self.submit_legacy(api_key, query, cutoff).await
            }
            other => other,
        }
    }

    async fn submit_legacy(
        &self,
        api_key: &str,
        query: &str,
        cutoff: Option<i64>,
    ) -> Result<Value, ProviderError> {
        let url = format!("{}/api/google_maps/reviews", self.base_url);
        let mut body = json!({
            "query": [query],
            "reviewsLimit": self.settings.reviews_limit,
            "async": true,
            "sort": "newest",
        });
        if let Some(cutoff) = cutoff {
            body["cutoff"] = json!(cutoff);
        }
        send_json(&self.settings.retry, PROVIDER, || {
            self.authed(self.client.post(&url), api_key).json(&body)
        })
        .await
    }
}

/// What a submission response tells us to do next.
#[derive(Debug, PartialEq, Eq)]
enum Submission<'a> {
    /// Results are in the body.
    Inline,
    /// Poll this handle.
    Deferred(&'a str),
    /// Neither finished nor pollable.
    Stalled(String),
}

fn classify_submission(submission: &Value) -> Submission<'_> {
    if submission.is_array() {
        return Submission::Inline;
    }
    let status = submission.get("status").and_then(Value::as_str);
    if status.is_some_and(|s| s.eq_ignore_ascii_case("success"))
        || (status.is_none() && submission.get("data").is_some())
    {
        return Submission::Inline;
    }
    match submission
        .get("results_location")
        .and_then(Value::as_str)
        .filter(|loc| !loc.trim().is_empty())
    {
        Some(location) => Submission::Deferred(location),
        None => Submission::Stalled(status.unwrap_or("missing").to_owned()),
    }
}

fn submission_failure(submission: &Value) -> Option<String> {
    let status = submission.get("status").and_then(Value::as_str)?;
    if !(status.eq_ignore_ascii_case("error") || status.eq_ignore_ascii_case("failed")) {
        return None;
    }
    let message = submission
        .get("error")
        .or_else(|| submission.get("errorMessage"))
        .and_then(Value::as_str)
        .unwrap_or(status);
    Some(message.to_owned())
}

#[async_trait]
impl ReviewProvider for OutscraperProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Outscraper
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
                var: "OUTSCRAPER_API_KEY",
            })?;

        let query = key.to_string();
        let cutoff = period.cutoff_unix(Utc::now());
        let submission = self.submit(api_key, &query, cutoff).await?;

        if let Some(message) = submission_failure(&submission) {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message,
            });
        }

        let location = match classify_submission(&submission) {
            Submission::Inline => return Ok(RawReviewBatch::new(submission)),
            Submission::Deferred(location) => location.to_owned(),
            Submission::Stalled(status) => {
                return Err(ProviderError::Api {
                    provider: PROVIDER,
                    message: format!("submission deferred without results_location (status {status})"),
                });
            }
        };

        tracing::debug!(provider = PROVIDER, %query, "submission deferred; polling results");
        let payload = poll_until_ready(PROVIDER, self.settings.poll, || {
            self.authed(self.client.get(&location), api_key)
        })
        .await?;
        Ok(RawReviewBatch::new(payload))
    }
}
