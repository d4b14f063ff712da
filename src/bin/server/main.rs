//! Data Explorer HTTP Server
//!
//! Serves the four dashboard tabs as a JSON API. See
//! [`data_explorer::server`] for the endpoint list.
//!
//! # CLI Commands
//!
//! - `start` - Start the HTTP server (default if no command specified)
//! - `check-config` - Validate configuration file
//! - `outliers` - Print the outlier report for one variable
//! - `filter` - Print the DocDB filter for the given criteria
//! - `classify` - Print the media kind of an object key
//! - `describe` - Look up and presign one S3 object
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `--config` flag
//! 2. `EXPLORER_CONFIG` environment variable (path to TOML file)
//! 3. `./explorer.toml` in current directory
//! 4. Default configuration

mod config;

use clap::{Parser, Subcommand};
use data_explorer::{
    config::ApplicationConfig,
    dashboard::Dashboard,
    docdb::build_filter,
    metrics,
    objects::{classify, describe, download_to_temp, ObjectView, S3ObjectStore},
    server::{self, AppState},
    timeseries::{compute_outliers, Dataset},
};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};

// =============================================================================
// CLI Definition
// =============================================================================

/// Data Explorer - rolling outliers, metadata search and object previews
#[derive(Parser)]
#[command(name = "data-explorer")]
#[command(version)]
#[command(about = "Interactive data-exploration dashboard backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (overrides EXPLORER_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override listen address (e.g., 0.0.0.0:5006)
    #[arg(short, long, global = true)]
    listen: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Validate configuration file without starting the server
    CheckConfig,

    /// Compute rolling average and outliers for one variable
    Outliers {
        /// Variable (column) name
        #[arg(short, long)]
        variable: Option<String>,

        /// Rolling window size
        #[arg(short, long)]
        window: Option<usize>,

        /// Outlier threshold multiplier
        #[arg(short, long)]
        sigma: Option<f64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the DocDB filter for the given criteria
    Filter {
        /// Project name (repeatable)
        #[arg(short, long = "project")]
        projects: Vec<String>,

        /// Subject id
        #[arg(short, long, default_value = "")]
        subject: String,
    },

    /// Print the media kind of an object key
    Classify {
        /// Object key
        key: String,
    },

    /// Fetch metadata and a presigned URL for one object
    Describe {
        /// Bucket name (defaults to object_store.default_bucket)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Object key
        #[arg(short, long)]
        key: String,

        /// Also download the object to a temp file
        #[arg(long)]
        download: bool,
    },
}

// =============================================================================
// CLI Command Handlers
// =============================================================================

/// Validate configuration and print summary
fn cmd_check_config(config: &ApplicationConfig) {
    println!("Configuration is valid!");
    println!();
    println!("Server Settings:");
    println!("  Listen address: {}", config.server.listen_addr);
    println!("  Log level: {}", config.server.log_level);
    println!();
    println!("Dataset:");
    println!("  Path: {}", config.dataset.path.display());
    println!(
        "  Defaults: variable={}, window={}, sigma={}",
        config.dataset.default_variable, config.dataset.default_window, config.dataset.default_sigma
    );
    println!();
    println!("DocDB:");
    println!("  Endpoint: {}", config.docdb.collection_url());
    println!("  Timeout: {}s", config.docdb.request_timeout_secs);
    println!();
    println!("Object Store:");
    println!("  Region: {}", config.object_store.region);
    println!(
        "  Endpoint: {}",
        config.object_store.endpoint.as_deref().unwrap_or("default")
    );
    println!("  Credentials: {:?}", config.object_store.credentials);
    println!("  Presign expiry: {}s", config.object_store.presign_expiry_secs);
}

/// Print the outlier report for one variable
fn cmd_outliers(
    config: &ApplicationConfig,
    variable: Option<String>,
    window: Option<usize>,
    sigma: Option<f64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let variable = variable.unwrap_or_else(|| config.dataset.default_variable.clone());
    let window = window.unwrap_or(config.dataset.default_window);
    let sigma = sigma.unwrap_or(config.dataset.default_sigma);

    let series = Dataset::from_path(&config.dataset.path).get()?;
    let report = compute_outliers(&series, &variable, window, sigma)?;

    if format == "json" {
        let json = serde_json::json!({
            "variable": report.variable,
            "window": report.window,
            "sigma": report.sigma,
            "points": series.len(),
            "defined_average": report.defined_average_count(),
            "outliers": report.outliers,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("Outlier Report");
        println!("==============");
        println!();
        println!("Variable: {}", report.variable);
        println!("Window: {}  Sigma: {}", report.window, report.sigma);
        println!("Points: {}", series.len());
        println!("Defined averages: {}", report.defined_average_count());
        println!("Outliers: {}", report.outliers.len());
        for point in &report.outliers {
            let when = point
                .datetime()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| point.timestamp.to_string());
            println!("  {}  {:.4}", when, point.value);
        }
    }

    Ok(())
}

/// Fetch metadata and a presigned URL for one object
async fn cmd_describe(
    config: &ApplicationConfig,
    bucket: Option<String>,
    key: &str,
    download: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bucket = bucket.unwrap_or_else(|| config.object_store.default_bucket.clone());
    let store = S3ObjectStore::new(&config.object_store).await?;

    let descriptor = describe(&store, &bucket, key, config.object_store.presign_expiry()).await;
    let url = descriptor.valid_url().map(str::to_string);
    let view = ObjectView::from(descriptor);

    println!("Status: {}", view.status_text());
    println!("{}", serde_json::to_string_pretty(&view.info_json())?);
    if let Some(url) = &url {
        println!("URL: {}", url);
        if download {
            let path = download_to_temp(&store, key, url).await?;
            println!("Downloaded to: {}", path.display());
        }
    }

    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut app_config = config::load_config(cli.config.as_deref())?;
    if let Some(listen) = &cli.listen {
        app_config.server.listen_addr = listen.clone();
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&app_config.server.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Route to appropriate command handler
    match cli.command {
        Some(Commands::CheckConfig) => {
            cmd_check_config(&app_config);
            return Ok(());
        },
        Some(Commands::Outliers {
            variable,
            window,
            sigma,
            format,
        }) => return cmd_outliers(&app_config, variable, window, sigma, &format),
        Some(Commands::Filter { projects, subject }) => {
            let filter = build_filter(&projects, &subject);
            if filter.is_empty() {
                eprintln!("No criteria given; no query would be issued");
            }
            println!("{}", serde_json::to_string_pretty(&filter.to_json())?);
            return Ok(());
        },
        Some(Commands::Classify { key }) => {
            println!("{}", classify(&key));
            return Ok(());
        },
        Some(Commands::Describe {
            bucket,
            key,
            download,
        }) => return cmd_describe(&app_config, bucket, &key, download).await,
        Some(Commands::Start) | None => {
            // Continue with server startup below
        },
    }

    info!("Starting Data Explorer v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Configuration: listen_addr={}, dataset={}",
        app_config.server.listen_addr,
        app_config.dataset.path.display()
    );

    metrics::init();

    let dashboard = Dashboard::from_config(&app_config).await?;
    let state = Arc::new(AppState {
        dashboard,
        config: app_config.server.clone(),
    });

    server::serve(state).await?;
    Ok(())
}
