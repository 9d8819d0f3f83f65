//! Command handlers. Each prints one pretty JSON document to stdout.

use reviewlens_core::{AppConfig, ReviewPeriod};
use reviewlens_providers::{PipelineError, ReviewFetch, ReviewPipeline};
use reviewlens_summary::{Analysis, OpenAiSummarizer, Summarizer};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    #[serde(flatten)]
    fetch: ReviewFetch,
    analysis: Analysis,
}

pub(crate) async fn run_resolve(config: &AppConfig, input: &str) -> anyhow::Result<()> {
    let pipeline = ReviewPipeline::from_config(config)?;
    let resolution = pipeline.resolve_place(input).await.map_err(report)?;
    if let Some(kind) = resolution.error {
        tracing::warn!(code = kind.as_str(), "place could not be resolved");
    }
    print_json(&resolution)
}

pub(crate) async fn run_reviews(
    config: &AppConfig,
    input: &str,
    period: ReviewPeriod,
) -> anyhow::Result<()> {
    let pipeline = ReviewPipeline::from_config(config)?;
    let fetch = pipeline
        .resolve_and_fetch(input, period)
        .await
        .map_err(report)?;
    tracing::info!(provider = %fetch.provider, count = fetch.reviews.len(), "reviews fetched");
    print_json(&fetch)
}

/// Unlike the HTTP endpoint, a missing or failing summarizer fails the
/// command outright; use `reviews` to get the raw list.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    input: &str,
    period: ReviewPeriod,
) -> anyhow::Result<()> {
    let summarizer = OpenAiSummarizer::from_config(config)?;
    let pipeline = ReviewPipeline::from_config(config)?;
    let fetch = pipeline
        .resolve_and_fetch(input, period)
        .await
        .map_err(report)?;
    let analysis = summarizer.analyze(&fetch.reviews).await?;
    print_json(&AnalyzeOutput { fetch, analysis })
}

/// Logs each provider attempt before handing the error to `anyhow`.
fn report(error: PipelineError) -> anyhow::Error {
    for attempt in error.attempts() {
        tracing::warn!(
            provider = %attempt.provider,
            key = %attempt.key,
            succeeded = attempt.succeeded,
            reviews = attempt.review_count,
            error = attempt.error.as_deref().unwrap_or(""),
            "attempt"
        );
    }
    anyhow::anyhow!("{} ({})", error, error.kind())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
