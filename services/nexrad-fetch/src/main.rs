//! NEXRAD fetch tool.
//!
//! Catalogs Level II volumes or Level III products published for one radar
//! site in the public AWS buckets:
//! - List a day of objects
//! - Refresh once, or keep refreshing until Ctrl+C
//! - Find the object valid at a time
//! - Load and summarise objects as JSON

mod summary;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use nexrad_provider::{AwsNexradDataProvider, ProviderConfig, RefreshScheduler, S3ObjectSource};
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use summary::FileSummary;

#[derive(Parser, Debug)]
#[command(name = "nexrad-fetch")]
#[command(about = "Catalog and decode NEXRAD data from the public AWS buckets")]
struct Args {
    /// Provider configuration file (YAML); overrides --site/--product
    #[arg(long, env = "NEXRAD_CONFIG")]
    config: Option<PathBuf>,

    /// Radar site ICAO identifier
    #[arg(short, long, env = "NEXRAD_SITE", default_value = "KLSX")]
    site: String,

    /// Level III product code (Level II volumes when omitted)
    #[arg(short, long, env = "NEXRAD_PRODUCT")]
    product: Option<String>,

    /// Bucket override
    #[arg(long, env = "NEXRAD_BUCKET")]
    bucket: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the objects published on a day (YYYY-MM-DD, default today)
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Refresh the catalog once and print the latest key
    Refresh,

    /// Find the object valid at a time (RFC 3339)
    Find {
        #[arg(long)]
        time: DateTime<Utc>,
    },

    /// Load objects and print a summary of each
    Load {
        /// Object key (default: the latest objects)
        #[arg(long)]
        key: Option<String>,

        /// Number of latest objects to load when no key is given
        #[arg(long, default_value = "1")]
        latest: usize,

        /// Maximum concurrent loads
        #[arg(long, default_value = "4")]
        max_concurrent: usize,
    },

    /// List the Level III products available for the site
    Products,

    /// Refresh on an interval until Ctrl+C
    Watch {
        /// Refresh interval in seconds (default from the configuration)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = provider_config(&args)?;
    info!(
        site = %config.site,
        level = %config.level,
        bucket = %config.bucket(),
        "Starting NEXRAD fetch"
    );

    let source = Arc::new(S3ObjectSource::new(&config.region).await);
    let provider = Arc::new(AwsNexradDataProvider::new(&config, source));

    match args.command {
        Command::List { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let (new, total) = provider.list_objects(date).await;
            info!(date = %date, new, total, "Listed objects");

            for time in provider.time_points_by_date(date).await {
                if let Some(key) = provider.find_key(time).await {
                    println!("{}\t{}", time.to_rfc3339(), key);
                }
            }
        }
        Command::Refresh => {
            let (new, total) = provider.refresh().await;
            info!(new, total, "Refreshed catalog");

            match provider.find_latest_key().await {
                Some(key) => println!("{}", key),
                None => warn!("No objects found"),
            }
            if let Some(period) = provider.update_period().await {
                info!(update_period_secs = period.num_seconds(), "Estimated update period");
            }
        }
        Command::Find { time } => {
            let date = time.date_naive();
            provider.list_objects(date).await;
            if let Some(previous) = date.pred_opt() {
                provider.list_objects(previous).await;
            }

            match provider.find_key(time).await {
                Some(key) => println!("{}", key),
                None => warn!(time = %time, "No object at or before time"),
            }
        }
        Command::Load {
            key,
            latest,
            max_concurrent,
        } => {
            let keys = match key {
                Some(key) => vec![key],
                None => latest_keys(&provider, latest).await,
            };
            if keys.is_empty() {
                warn!("No objects to load");
            }

            let results: Vec<(String, Result<FileSummary>)> = stream::iter(keys)
                .map(|key| {
                    let provider = provider.clone();
                    async move {
                        let summary = provider
                            .load_object_by_key(&key)
                            .await
                            .with_context(|| format!("Failed to load {}", key))
                            .map(|file| FileSummary::new(&key, &file));
                        (key, summary)
                    }
                })
                .buffer_unordered(max_concurrent.max(1))
                .collect()
                .await;

            for (key, result) in results {
                match result {
                    Ok(summary) => println!("{}", serde_json::to_string(&summary)?),
                    Err(e) => warn!(key = %key, error = %e, "Load failed"),
                }
            }
        }
        Command::Products => {
            for product in provider.request_available_products().await {
                println!("{}", product);
            }
        }
        Command::Watch { interval_secs } => {
            let interval = Duration::from_secs(interval_secs.unwrap_or(config.refresh_interval_secs));
            let scheduler = RefreshScheduler::new(provider.clone(), interval);

            // Shutdown signal
            let (shutdown_tx, _) = broadcast::channel::<()>(1);

            // Handle Ctrl+C
            let shutdown_tx_clone = shutdown_tx.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received shutdown signal");
                shutdown_tx_clone.send(()).ok();
            });

            scheduler.run_forever(shutdown_tx.subscribe()).await;

            info!(
                cached = provider.cache_size().await,
                latest = ?provider.find_latest_key().await,
                "Watch session complete"
            );
        }
    }

    Ok(())
}

fn provider_config(args: &Args) -> Result<ProviderConfig> {
    let mut config = match &args.config {
        Some(path) => ProviderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match &args.product {
            Some(product) => ProviderConfig::level3(&args.site, product),
            None => ProviderConfig::level2(&args.site),
        },
    };

    if let Some(bucket) = &args.bucket {
        config.bucket = Some(bucket.clone());
    }
    config.validate().context("Invalid provider configuration")?;
    Ok(config)
}

/// Keys of the `count` newest objects, after a refresh.
async fn latest_keys(provider: &AwsNexradDataProvider, count: usize) -> Vec<String> {
    provider.refresh().await;

    let today = Utc::now().date_naive();
    let mut times = Vec::new();
    if let Some(yesterday) = today.pred_opt() {
        times.extend(provider.time_points_by_date(yesterday).await);
    }
    times.extend(provider.time_points_by_date(today).await);

    let mut keys = Vec::new();
    for time in times.iter().rev().take(count) {
        if let Some(key) = provider.find_key(*time).await {
            keys.push(key);
        }
    }
    keys
}
