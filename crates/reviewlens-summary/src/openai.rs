//! Chat-completions summarizer (OpenAI-compatible APIs).

use async_trait::async_trait;
use reqwest::Client;
use reviewlens_core::AppConfig;
use reviewlens_providers::{http::build_client, http::send_json, RetryPolicy};
use serde_json::{json, Value};

use crate::analysis::{parse_analysis, Analysis};
use crate::error::SummaryError;

const PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Reviews included in one prompt.
const MAX_PROMPT_REVIEWS: usize = 250;

/// Longest single review kept in the prompt, in characters.
const MAX_REVIEW_CHARS: usize = 1_000;

const SYSTEM_PROMPT: &str = "Return only valid JSON. No prose.";

/// Text-in, structured-text-out summarization of a review list.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SummaryError`] when the completion fails or cannot be
    /// parsed into an [`Analysis`].
    async fn analyze(&self, reviews: &[String]) -> Result<Analysis, SummaryError>;
}

pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    policy: RetryPolicy,
}

impl OpenAiSummarizer {
    #[must_use]
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            policy,
        }
    }

    /// # Errors
    ///
    /// [`SummaryError::ConfigurationMissing`] without `OPENAI_API_KEY`, or a
    /// provider error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, SummaryError> {
        let api_key = config
            .openai_api_key
            .as_deref()
            .ok_or(SummaryError::ConfigurationMissing {
                var: "OPENAI_API_KEY",
            })?;
        let client = build_client(config.http_timeout_secs, &config.user_agent)?;
        Ok(Self::new(
            client,
            api_key,
            config.openai_model.clone(),
            RetryPolicy::from_config(config),
        ))
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

fn build_prompt(reviews: &[String]) -> String {
    let mut prompt = String::from(
        "Return STRICT JSON only with keys: positives, negatives, actions, summary.\n\
         - positives: top 5 short positive recurring themes\n\
         - negatives: top 5 short negative recurring themes\n\
         - actions: 6-10 practical steps\n\
         - summary: 2-3 sentences\n\nREVIEWS:\n",
    );
    for review in reviews.iter().take(MAX_PROMPT_REVIEWS) {
        let clipped: String = review.chars().take(MAX_REVIEW_CHARS).collect();
        prompt.push_str("- ");
        prompt.push_str(&clipped.replace('\n', " "));
        prompt.push('\n');
    }
    prompt
}

fn completion_content(response: &Value) -> Option<&str> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn analyze(&self, reviews: &[String]) -> Result<Analysis, SummaryError> {
        if reviews.is_empty() {
            return Err(SummaryError::NoReviews);
        }

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(reviews)},
            ],
        });

        let response = send_json(&self.policy, PROVIDER, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let content = completion_content(&response).ok_or(SummaryError::EmptyCompletion)?;
        let analysis = parse_analysis(content)?;
        tracing::info!(
            reviews = reviews.len(),
            positives = analysis.positives.len(),
            negatives = analysis.negatives.len(),
            actions = analysis.actions.len(),
            "summarized reviews"
        );
        Ok(analysis)
    }
}
