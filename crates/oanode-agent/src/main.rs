// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OANode Telemetry Agent CLI
//!
//! Samples on a fixed period and uploads to the collector, buffering
//! to disk across network outages.
//!
//! # Usage
//!
//! ```bash
//! # Run with the default config.json
//! oanode-agent
//!
//! # Explicit config and buffer directory
//! oanode-agent --config /etc/oanode/config.json --data-dir /var/lib/oanode/data
//!
//! # Override the collector for a staging run
//! oanode-agent --endpoint http://staging-collector:8080 --period 1.5
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use oanode_agent::{ClockSampleSource, Config, HttpUplink, Scheduler};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "oanode-agent")]
#[command(about = "OANode telemetry agent - store-and-forward uploader", long_about = None)]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Override the buffer directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the collector base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Override the polling period in seconds (fractional allowed)
    #[arg(long)]
    period: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(period) = args.period {
        config.polling_period = Config::polling_period_from_secs(period)?;
    }

    tracing::info!("OANode agent starting...");
    tracing::info!("  Collector: {}", config.collector_url());
    tracing::info!("  Polling period: {:?}", config.polling_period);
    tracing::info!("  Buffer dir: {}", config.data_dir.display());
    if config.strict_status {
        tracing::info!("  Strict status checking enabled");
    }

    let uplink = Arc::new(
        HttpUplink::new(
            config.collector_url(),
            config.request_timeout,
            config.strict_status,
        )
        .context("building HTTP client")?,
    );

    let scheduler = Scheduler::new(config, ClockSampleSource, uplink)
        .context("opening ledger directory")?;

    tokio::select! {
        res = scheduler.run() => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
