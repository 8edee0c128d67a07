use std::io::Read;

use serde::Serialize;

use crate::common::monitor_error::{ErrCode, MonitorError};
use crate::common::utils::normalize_symbol;

pub const SYMBOL_COLUMN: &str = "Symbol";
pub const QUANTITY_COLUMN: &str = "Quantity";
pub const PURCHASE_PRICE_COLUMN: &str = "Purchase Price";

/// One line of an uploaded portfolio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    /// Cost basis per share; blank cells are kept as `None`
    pub purchase_price: Option<f64>,
}

impl Holding {
    pub fn new(symbol: &str, quantity: f64, purchase_price: Option<f64>) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            quantity,
            purchase_price,
        }
    }
}

/// Read holdings from CSV with `Symbol`, `Quantity` and `Purchase Price`
/// columns. Extra columns are ignored and duplicate symbols are kept.
pub fn read_holdings<R: Read>(reader: R) -> Result<Vec<Holding>, MonitorError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (symbol_idx, quantity_idx, price_idx) = match (
        column(SYMBOL_COLUMN),
        column(QUANTITY_COLUMN),
        column(PURCHASE_PRICE_COLUMN),
    ) {
        (Some(s), Some(q), Some(p)) => (s, q, p),
        _ => {
            let missing: Vec<&str> = [SYMBOL_COLUMN, QUANTITY_COLUMN, PURCHASE_PRICE_COLUMN]
                .into_iter()
                .filter(|c| column(*c).is_none())
                .collect();
            return Err(MonitorError::new(
                format!("missing column(s): {}", missing.join(", ")),
                ErrCode::MissingColumn,
            ));
        }
    };

    let mut holdings = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let symbol = normalize_symbol(cell(symbol_idx));
        if symbol.is_empty() {
            return Err(bad_row(line, "empty symbol"));
        }
        let quantity = parse_amount(cell(quantity_idx), QUANTITY_COLUMN, line)?
            .ok_or_else(|| bad_row(line, "empty Quantity"))?;
        if quantity <= 0.0 {
            return Err(bad_row(line, &format!("{QUANTITY_COLUMN} must be positive")));
        }
        let purchase_price = parse_amount(cell(price_idx), PURCHASE_PRICE_COLUMN, line)?;

        holdings.push(Holding {
            symbol,
            quantity,
            purchase_price,
        });
    }
    Ok(holdings)
}

/// Distinct symbols in first-seen order
pub fn portfolio_symbols(holdings: &[Holding]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for h in holdings {
        if !symbols.contains(&h.symbol) {
            symbols.push(h.symbol.clone());
        }
    }
    symbols
}

fn parse_amount(raw: &str, column: &str, line: u64) -> Result<Option<f64>, MonitorError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let v: f64 = raw
        .parse()
        .map_err(|_| bad_row(line, &format!("{column} {raw:?} is not a number")))?;
    if !v.is_finite() || v < 0.0 {
        return Err(bad_row(line, &format!("{column} must be a non-negative number, got {raw}")));
    }
    Ok(Some(v))
}

fn bad_row(line: u64, reason: &str) -> MonitorError {
    MonitorError::new(format!("line {line}: {reason}"), ErrCode::BadRow)
}
