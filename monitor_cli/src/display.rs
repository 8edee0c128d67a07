use colored::Colorize;
use monitor_core::common::utils::round_to;
use monitor_core::portfolio::PortfolioRow;
use monitor_core::stock::SignalRow;
use monitor_core::{Report, Signal};

pub const EMPTY_HINT: &str =
    "Enter at least one stock symbol or upload a portfolio CSV to get started.";

const SIGNAL_HEADERS: [&str; 9] = [
    "symbol", "name", "price", "change", "rsi", "pe_ratio", "sector", "market_cap", "signal",
];

const PORTFOLIO_HEADERS: [&str; 9] = [
    "symbol",
    "name",
    "price",
    "Quantity",
    "Purchase Price",
    "Investment Value",
    "Unrealized PnL",
    "PnL %",
    "signal",
];

/// Plain-text table; the last column always holds the signal
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub signals: Vec<Signal>,
}

impl Table {
    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Render as lines; `colorize` only touches the signal column
    pub fn render(&self, colorize: bool) -> String {
        let widths = self.widths();
        let pad = |s: &str, w: usize| format!("{s}{}", " ".repeat(w - s.chars().count()));

        let mut out = String::new();
        if colorize {
            out.push_str(&format!("{}\n", self.title.bold()));
        } else {
            out.push_str(&format!("{}\n", self.title));
        }
        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(*h, *w))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        out.push('\n');

        for (row, signal) in self.rows.iter().zip(&self.signals) {
            let last = row.len() - 1;
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, w))| {
                    let cell = pad(cell.as_str(), *w);
                    if colorize && i == last {
                        paint(&cell, *signal)
                    } else {
                        cell
                    }
                })
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}

fn paint(cell: &str, signal: Signal) -> String {
    match signal {
        Signal::Buy => cell.green().to_string(),
        Signal::Sell => cell.red().to_string(),
        Signal::Hold => cell.yellow().to_string(),
        Signal::Error => cell.magenta().to_string(),
    }
}

fn num(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}", round_to(v, 2))).unwrap_or_default()
}

fn plain(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

pub fn signals_table(rows: &[SignalRow]) -> Table {
    let cells = rows
        .iter()
        .map(|row| {
            let rec = &row.record;
            let snap = rec.snapshot();
            vec![
                rec.symbol.clone(),
                rec.name().unwrap_or_default().to_string(),
                num(rec.price()),
                snap.and_then(|s| s.change_percent)
                    .map(|c| format!("{:.2}%", c))
                    .unwrap_or_default(),
                num(rec.rsi()),
                num(snap.and_then(|s| s.pe_ratio)),
                snap.and_then(|s| s.sector.clone()).unwrap_or_default(),
                snap.and_then(|s| s.market_cap)
                    .map(|m| m.to_string())
                    .unwrap_or_default(),
                row.signal.label().to_string(),
            ]
        })
        .collect();
    Table {
        title: "📊 Stock Signals",
        headers: SIGNAL_HEADERS.to_vec(),
        rows: cells,
        signals: rows.iter().map(|r| r.signal).collect(),
    }
}

pub fn portfolio_table(rows: &[PortfolioRow]) -> Table {
    let cells = rows
        .iter()
        .map(|row| {
            let rec = &row.stock.record;
            let holding = row.holding.as_ref();
            vec![
                rec.symbol.clone(),
                rec.name().unwrap_or_default().to_string(),
                num(rec.price()),
                plain(holding.map(|h| h.quantity)),
                num(holding.and_then(|h| h.purchase_price)),
                num(row.investment_value),
                num(row.unrealized_pnl),
                num(row.pnl_percent),
                row.stock.signal.label().to_string(),
            ]
        })
        .collect();
    Table {
        title: "📦 Portfolio Overview",
        headers: PORTFOLIO_HEADERS.to_vec(),
        rows: cells,
        signals: rows.iter().map(|r| r.stock.signal).collect(),
    }
}

/// Table for the report, or `None` when nothing was requested
pub fn report_table(report: &Report) -> Option<Table> {
    match report {
        Report::Empty => None,
        Report::Signals(rows) => Some(signals_table(rows)),
        Report::Portfolio(rows) => Some(portfolio_table(rows)),
    }
}

pub fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    match report_table(report) {
        Some(table) => print!("{}", table.render(true)),
        None => println!("{EMPTY_HINT}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::portfolio::{merge, Holding};
    use monitor_core::stock::{Snapshot, StockRecord};
    use monitor_core::{ErrCode, MonitorError};

    fn aapl() -> SignalRow {
        let snap = Snapshot {
            name: Some("Apple Inc.".to_string()),
            price: Some(200.0),
            change_percent: Some(1.25),
            sector: Some("Technology".to_string()),
            market_cap: Some(3_000),
            pe_ratio: Some(29.456),
        };
        SignalRow {
            record: StockRecord::fetched("AAPL", snap, Some(72.345_6)),
            signal: Signal::Sell,
        }
    }

    fn msft_failed() -> SignalRow {
        SignalRow {
            record: StockRecord::failed("MSFT", MonitorError::new("down", ErrCode::Http)),
            signal: Signal::Error,
        }
    }

    #[test]
    fn test_signals_table_cells() {
        let table = signals_table(&[aapl(), msft_failed()]);
        assert_eq!(
            table.rows[0],
            vec![
                "AAPL",
                "Apple Inc.",
                "200.00",
                "1.25%",
                "72.35",
                "29.46",
                "Technology",
                "3000",
                "🔴 Sell"
            ]
        );
        // failed fetch: blank fields, error signal
        assert_eq!(table.rows[1][0], "MSFT");
        assert!(table.rows[1][1..8].iter().all(String::is_empty));
        assert_eq!(table.rows[1][8], "⚠️ Error");
    }

    #[test]
    fn test_portfolio_table_cells() {
        let rows = merge(&[aapl()], &[Holding::new("AAPL", 10.0, Some(150.0))]);
        let table = portfolio_table(&rows);
        assert_eq!(table.headers.len(), 9);
        assert_eq!(
            table.rows[0],
            vec![
                "AAPL",
                "Apple Inc.",
                "200.00",
                "10",
                "150.00",
                "2000.00",
                "500.00",
                "33.33",
                "🔴 Sell"
            ]
        );
    }

    #[test]
    fn test_render_aligns_columns() {
        let rendered = signals_table(&[aapl(), msft_failed()]).render(false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("symbol  name"));
        assert!(lines[3].starts_with("AAPL    Apple Inc."));
        assert!(lines[4].starts_with("MSFT"));
    }

    #[test]
    fn test_empty_report() {
        assert!(report_table(&Report::Empty).is_none());
    }
}
