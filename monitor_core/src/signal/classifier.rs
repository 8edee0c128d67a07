use crate::common::enums::Signal;
use crate::signal::signal_config::SignalConfig;
use crate::stock::{SignalRow, StockRecord};

/// Map a record to its trading signal.
///
/// A failed fetch is `Error` whatever else the record holds; an undefined
/// RSI holds.
pub fn classify(record: &StockRecord, conf: &SignalConfig) -> Signal {
    if record.is_error() {
        return Signal::Error;
    }
    match record.rsi() {
        None => Signal::Hold,
        Some(rsi) if rsi < conf.buy_below => Signal::Buy,
        Some(rsi) if rsi > conf.sell_above => Signal::Sell,
        Some(_) => Signal::Hold,
    }
}

pub fn classify_row(record: StockRecord, conf: &SignalConfig) -> SignalRow {
    let signal = classify(&record, conf);
    SignalRow { record, signal }
}
