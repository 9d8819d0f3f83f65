mod lookup;

use clap::{Parser, Subcommand};
use reviewlens_core::ReviewPeriod;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "reviewlens-cli")]
#[command(about = "Resolve places and pull their recent reviews")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a Maps URL, embed snippet, identifier, or name to a place identifier
    Resolve {
        /// Anything a user might paste: URL, iframe, `place_id:...`, or free text
        input: String,
    },
    /// Fetch sanitized reviews through the provider fallback chain
    Reviews {
        input: String,

        /// Review window in days: 1, 30, 60, 90, 365, or `all`
        #[arg(long, default_value = "90", value_parser = parse_period)]
        period: ReviewPeriod,
    },
    /// Fetch reviews and summarize them into positives, negatives, and actions
    Analyze {
        input: String,

        #[arg(long, default_value = "90", value_parser = parse_period)]
        period: ReviewPeriod,
    },
}

fn parse_period(raw: &str) -> Result<ReviewPeriod, String> {
    raw.parse().map_err(|e: reviewlens_core::InvalidPeriod| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("reviewlens-cli: run with --help to list commands");
        return Ok(());
    };

    let config = reviewlens_core::load_app_config()?;
    // stdout carries JSON output; logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Resolve { input } => lookup::run_resolve(&config, &input).await,
        Commands::Reviews { input, period } => lookup::run_reviews(&config, &input, period).await,
        Commands::Analyze { input, period } => lookup::run_analyze(&config, &input, period).await,
    }
}
