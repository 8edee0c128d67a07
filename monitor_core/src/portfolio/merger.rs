use serde::Serialize;

use crate::common::utils::{nonzero, normalize_symbol};
use crate::portfolio::holding::Holding;
use crate::stock::SignalRow;

/// A classified row joined with (at most) one holding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRow {
    #[serde(flatten)]
    pub stock: SignalRow,
    pub holding: Option<Holding>,
    pub investment_value: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub pnl_percent: Option<f64>,
}

impl PortfolioRow {
    pub fn new(stock: SignalRow, holding: Option<Holding>) -> Self {
        let price = nonzero(stock.record.price());
        let quantity = holding.as_ref().map(|h| h.quantity);
        let cost = nonzero(holding.as_ref().and_then(|h| h.purchase_price));

        // all three need a price and a cost basis
        let basis = price.zip(cost);
        let investment_value = basis.zip(quantity).map(|((p, _), q)| p * q);
        let unrealized_pnl = basis.zip(quantity).map(|((p, c), q)| (p - c) * q);
        let pnl_percent = basis.map(|(p, c)| (p - c) / c * 100.0);

        Self {
            stock,
            holding,
            investment_value,
            unrealized_pnl,
            pnl_percent,
        }
    }
}

/// Left join of `rows` with `holdings` on the uppercased symbol.
///
/// Every row comes out at least once; a row with N matching holdings comes
/// out N times, in holding order.
pub fn merge(rows: &[SignalRow], holdings: &[Holding]) -> Vec<PortfolioRow> {
    let mut merged = Vec::with_capacity(rows.len().max(holdings.len()));
    for row in rows {
        let symbol = normalize_symbol(&row.record.symbol);
        let mut matched = false;
        for holding in holdings
            .iter()
            .filter(|h| normalize_symbol(&h.symbol) == symbol)
        {
            matched = true;
            merged.push(PortfolioRow::new(row.clone(), Some(holding.clone())));
        }
        if !matched {
            merged.push(PortfolioRow::new(row.clone(), None));
        }
    }
    merged
}
