use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use monitor_core::common::utils::parse_tickers;
use monitor_core::portfolio::{read_holdings, Holding};
use monitor_core::{ErrCode, Monitor, MonitorConfig, MonitorError, RefreshRequest};

mod cli;
mod display;
mod yahoo;

use yahoo::YahooProvider;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-monitor/0.1";

fn preprocess() {
    // grant access to .env
    dotenv::dotenv().ok();

    // initialise logger
    env_logger::init();
}

fn load_config(cli: &cli::Cli) -> Result<MonitorConfig> {
    let mut map: HashMap<String, serde_json::Value> = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("config {} is not a JSON object", path.display()))?
        }
        None => HashMap::new(),
    };
    map.extend(cli.overrides());
    Ok(MonitorConfig::new(Some(map))?)
}

fn open_holdings(path: &Path) -> Result<Vec<Holding>, MonitorError> {
    let file = File::open(path).map_err(|e| {
        MonitorError::new(
            format!("cannot open {}: {e}", path.display()),
            ErrCode::CsvFormat,
        )
    })?;
    read_holdings(file)
}

/// A bad upload is reported and the run falls back to the ticker list
fn load_holdings(path: Option<&Path>) -> Option<Vec<Holding>> {
    let path = path?;
    match open_holdings(path) {
        Ok(holdings) => {
            log::info!("loaded {} holding(s) from {}", holdings.len(), path.display());
            Some(holdings)
        }
        Err(e) => {
            eprintln!(
                "Failed to read the uploaded file. Make sure it has 'Symbol', 'Quantity', 'Purchase Price' columns. ({e})"
            );
            None
        }
    }
}

fn build_request(cli: &cli::Cli) -> RefreshRequest {
    RefreshRequest {
        tickers: parse_tickers(&cli.tickers),
        holdings: load_holdings(cli.portfolio.as_deref()),
    }
}

async fn refresh_once(
    monitor: &Monitor<YahooProvider>,
    request: &RefreshRequest,
    json: bool,
) -> Result<()> {
    let report = monitor.run(request).await;
    display::print_report(&report, json)
}

#[tokio::main]
async fn main() -> Result<()> {
    preprocess();
    let cli = cli::Cli::parse();
    log::debug!("Command line input recorded: {cli:#?}");

    let config = load_config(&cli)?;
    let request = build_request(&cli);

    let user_agent =
        std::env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
    let provider = YahooProvider::new(&user_agent, &config.history_range)?;
    let monitor = Monitor::new(provider, config);

    let Some(secs) = cli.watch else {
        return refresh_once(&monitor, &request, cli.json).await;
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh_once(&monitor, &request, cli.json).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, stopping");
                break;
            }
        }
    }
    Ok(())
}
