mod api;
mod middleware;

use std::sync::Arc;

use reviewlens_providers::ReviewPipeline;
use reviewlens_summary::{OpenAiSummarizer, Summarizer, SummaryError};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = reviewlens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = ReviewPipeline::from_config(&config)?;
    let summarizer: Option<Arc<dyn Summarizer>> = match OpenAiSummarizer::from_config(&config) {
        Ok(summarizer) => Some(Arc::new(summarizer)),
        Err(SummaryError::ConfigurationMissing { var }) => {
            tracing::warn!(var, "summarizer not configured; analysis will be skipped");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let auth = AuthState::from_config(&config)?;
    let state = AppState {
        pipeline: Arc::new(pipeline),
        summarizer,
    };
    let app = build_app(state, auth, RateLimitState::from_config(&config));

    tracing::info!(addr = %config.bind_addr, providers = ?config.provider_order, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
