//! IndexSwap CLI
//!
//! Converts between index funds, indices and index futures using ratios
//! refreshed from the remote ratio service.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use indexswap_common::ConversionPair;
use indexswap_ratios::config::parse_endpoints;
use indexswap_ratios::{ConversionEngine, RatioEngineConfig, RefreshOutcome};

/// IndexSwap CLI
#[derive(Parser, Debug)]
#[command(name = "indexswap")]
#[command(about = "Convert between QQQ, NDX, NQ, SPY and ES")]
struct Args {
    /// Ratio service base URL
    #[arg(long, env = "INDEXSWAP_BASE_URL")]
    base_url: Option<String>,

    /// Comma-separated endpoint paths, tried in order
    #[arg(long)]
    endpoints: Option<String>,

    /// Attempts per endpoint before moving on
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Base backoff delay in milliseconds
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an amount, e.g. `convert qqq_to_ndx 100`
    Convert {
        /// Conversion pair (qqq_to_ndx, QQQ->NDX, qqq-ndx, ...)
        pair: ConversionPair,
        /// Amount of the source instrument
        value: String,
        /// Print the full conversion record as JSON
        #[arg(long)]
        detailed: bool,
    },
    /// Print the current ratio snapshot as JSON
    Ratios {
        /// Refresh from the ratio service first
        #[arg(long)]
        refresh: bool,
    },
    /// Refresh ratios and report each attempt
    Refresh,
    /// Convert 100 QQQ to NDX and 100 SPY to ES
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            args.json_logs
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!args.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let config = load_config(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        base_url = %config.source.base_url,
        endpoints = config.source.endpoints.len(),
        "IndexSwap engine initialized with default ratios"
    );
    let engine = ConversionEngine::from_config(&config)?;

    match args.command {
        Command::Convert { pair, value, detailed } => {
            let conversion = engine.convert_detailed(pair, value).await?;
            if detailed {
                println!("{}", serde_json::to_string_pretty(&conversion)?);
            } else {
                println!("{}", conversion.output);
            }
        }
        Command::Ratios { refresh } => {
            if refresh {
                engine.refresher().refresh().await;
            }
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        Command::Refresh => {
            let report = engine.refresher().refresh_with_report().await;
            for record in &report.attempts {
                match &record.error {
                    Some(e) => println!("{} attempt {}: {}", record.endpoint, record.attempt + 1, e),
                    None => println!("{} attempt {}: ok", record.endpoint, record.attempt + 1),
                }
            }
            let waited: Duration = report.backoffs.iter().sum();
            match report.outcome {
                RefreshOutcome::Updated(ratios) => println!("updated: {ratios} (waited {waited:?})"),
                RefreshOutcome::Exhausted => {
                    println!("all endpoints failed, keeping {} (waited {waited:?})", engine.ratios())
                }
            }
        }
        Command::Demo => {
            let ndx = engine.convert_qqq_to_ndx(100).await?;
            println!("100 QQQ = {ndx} NDX");
            let es = engine.convert_spy_to_es(100).await?;
            println!("100 SPY = {es} ES");
        }
    }

    let metrics = engine.metrics();
    info!(
        refreshes = metrics.refreshes_started,
        refreshes_succeeded = metrics.refreshes_succeeded,
        fetch_attempts = metrics.fetch_attempts,
        backoffs = metrics.backoffs,
        "Done"
    );

    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn load_config(args: &Args) -> RatioEngineConfig {
    let mut config = RatioEngineConfig::from_env();

    if let Some(url) = &args.base_url {
        config.source.base_url = url.clone();
    }
    if let Some(endpoints) = &args.endpoints {
        config.source.endpoints = parse_endpoints(endpoints);
    }
    if let Some(attempts) = args.max_attempts {
        config.retry.max_attempts_per_endpoint = attempts;
    }
    if let Some(ms) = args.backoff_ms {
        config.retry.backoff_base = Duration::from_millis(ms);
    }

    config
}
