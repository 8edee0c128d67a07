use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

/// Live prices, RSI signals and unrealized P&L for a small portfolio.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Stock symbols, comma-separated. Ignored when a portfolio is given.
    #[arg(short, long, default_value = "AAPL, MSFT, NVDA")]
    pub tickers: String,

    /// Portfolio CSV with Symbol, Quantity and Purchase Price columns.
    #[arg(short, long)]
    pub portfolio: Option<PathBuf>,

    /// JSON file of configuration overrides.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// RSI period.
    #[arg(long)]
    pub period: Option<usize>,

    /// Buy when RSI is below this.
    #[arg(long)]
    pub buy_below: Option<f64>,

    /// Sell when RSI is above this.
    #[arg(long)]
    pub sell_above: Option<f64>,

    /// Price history range requested from the provider (e.g. 1mo, 3mo).
    #[arg(long)]
    pub range: Option<String>,

    /// Maximum number of symbols fetched at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Refresh every SECS seconds until interrupted.
    #[arg(short, long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Flags that were given, keyed like the config file
    pub fn overrides(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        if let Some(period) = self.period {
            map.insert("rsi_period".to_string(), Value::from(period));
        }
        if let Some(buy_below) = self.buy_below {
            map.insert("buy_below".to_string(), Value::from(buy_below));
        }
        if let Some(sell_above) = self.sell_above {
            map.insert("sell_above".to_string(), Value::from(sell_above));
        }
        if let Some(range) = &self.range {
            map.insert("history_range".to_string(), Value::from(range.as_str()));
        }
        if let Some(concurrency) = self.concurrency {
            map.insert("concurrency".to_string(), Value::from(concurrency));
        }
        map
    }
}
