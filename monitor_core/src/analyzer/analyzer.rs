use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::common::enums::Signal;
use crate::common::utils::normalize_symbol;
use crate::config::MonitorConfig;
use crate::math::rsi::compute_rsi;
use crate::portfolio::{merge, portfolio_symbols, Holding, PortfolioRow};
use crate::provider::PriceProvider;
use crate::signal::classify_row;
use crate::stock::{SignalRow, StockRecord};

/// Inputs of one refresh cycle
#[derive(Debug, Clone, Default)]
pub struct RefreshRequest {
    pub tickers: Vec<String>,
    /// When present, the tickers come from here instead
    pub holdings: Option<Vec<Holding>>,
}

impl RefreshRequest {
    pub fn symbols(&self) -> Vec<String> {
        match &self.holdings {
            Some(holdings) => portfolio_symbols(holdings),
            None => self.tickers.clone(),
        }
    }
}

/// Output of one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "rows", rename_all = "snake_case")]
pub enum Report {
    /// Nothing was requested
    Empty,
    Signals(Vec<SignalRow>),
    Portfolio(Vec<PortfolioRow>),
}

/// Runs fetch, RSI and classification for every requested symbol
pub struct Monitor<P> {
    provider: P,
    config: MonitorConfig,
}

impl<P: PriceProvider + Sync> Monitor<P> {
    pub fn new(provider: P, config: MonitorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch one symbol. Provider failures end up inside the record.
    pub async fn fetch_record(&self, symbol: &str) -> StockRecord {
        let symbol = normalize_symbol(symbol);
        let symbol = symbol.as_str();
        match self.provider.fetch(symbol).await {
            Ok(quote) => {
                let rsi = match &quote.history {
                    Ok(closes) => compute_rsi(closes, self.config.rsi_period),
                    Err(e) => {
                        log::warn!("[{symbol}] no price history, RSI left undefined: {e}");
                        None
                    }
                };
                StockRecord::fetched(symbol, quote.snapshot, rsi)
            }
            Err(e) => {
                log::warn!("[{symbol}] data fetch failed: {e}");
                StockRecord::failed(symbol, e)
            }
        }
    }

    /// Classified rows in the order of `tickers`
    pub async fn refresh(&self, tickers: &[String]) -> Vec<SignalRow> {
        let rows: Vec<SignalRow> = stream::iter(tickers)
            .map(|symbol| async move {
                classify_row(self.fetch_record(symbol).await, &self.config.signal_conf)
            })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let failed = rows.iter().filter(|r| r.signal == Signal::Error).count();
        log::info!("refreshed {} symbol(s), {failed} failed", rows.len());
        rows
    }

    pub async fn run(&self, request: &RefreshRequest) -> Report {
        let symbols = request.symbols();
        if symbols.is_empty() {
            log::debug!("no symbols requested");
            return Report::Empty;
        }

        let rows = self.refresh(&symbols).await;
        match &request.holdings {
            Some(holdings) => Report::Portfolio(merge(&rows, holdings)),
            None => Report::Signals(rows),
        }
    }
}
