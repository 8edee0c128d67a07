use serde::{Serialize, Serializer};

use crate::common::enums::Signal;
use crate::common::monitor_error::MonitorError;
use crate::common::utils::{normalize_symbol, round_to};

/// Point-in-time fields reported by the provider. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub sector: Option<String>,
    pub market_cap: Option<u64>,
    pub pe_ratio: Option<f64>,
}

/// Per-symbol outcome of one refresh.
///
/// Either the provider answered (`snapshot` set, `error` empty) or it failed
/// (`error` set, everything else empty); the constructors keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    pub symbol: String,
    #[serde(flatten)]
    snapshot: Option<Snapshot>,
    #[serde(serialize_with = "ser_rsi")]
    rsi: Option<f64>,
    #[serde(serialize_with = "ser_error")]
    error: Option<MonitorError>,
}

impl StockRecord {
    pub fn fetched(symbol: &str, snapshot: Snapshot, rsi: Option<f64>) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            snapshot: Some(snapshot),
            rsi,
            error: None,
        }
    }

    pub fn failed(symbol: &str, error: MonitorError) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            snapshot: None,
            rsi: None,
            error: Some(error),
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Full-precision RSI; `None` when undefined or when the fetch failed.
    pub fn rsi(&self) -> Option<f64> {
        self.rsi
    }

    pub fn error(&self) -> Option<&MonitorError> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn price(&self) -> Option<f64> {
        self.snapshot.as_ref().and_then(|s| s.price)
    }

    pub fn name(&self) -> Option<&str> {
        self.snapshot.as_ref().and_then(|s| s.name.as_deref())
    }
}

/// A record together with the signal it classified to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    #[serde(flatten)]
    pub record: StockRecord,
    pub signal: Signal,
}

fn ser_rsi<S: Serializer>(rsi: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match rsi {
        Some(v) => s.serialize_some(&round_to(*v, 2)),
        None => s.serialize_none(),
    }
}

fn ser_error<S: Serializer>(err: &Option<MonitorError>, s: S) -> Result<S::Ok, S::Error> {
    match err {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::monitor_error::ErrCode;

    #[test]
    fn test_failed_record_has_no_fields() {
        let rec = StockRecord::failed("msft", MonitorError::new("boom", ErrCode::Http));
        assert_eq!(rec.symbol, "MSFT");
        assert!(rec.is_error());
        assert!(rec.snapshot().is_none());
        assert_eq!(rec.rsi(), None);
        assert_eq!(rec.price(), None);
    }

    #[test]
    fn test_fetched_record() {
        let snap = Snapshot {
            name: Some("Apple Inc.".to_string()),
            price: Some(190.5),
            ..Default::default()
        };
        let rec = StockRecord::fetched(" aapl", snap, Some(55.123));
        assert_eq!(rec.symbol, "AAPL");
        assert!(!rec.is_error());
        assert_eq!(rec.price(), Some(190.5));
        assert_eq!(rec.name(), Some("Apple Inc."));
        assert_eq!(rec.rsi(), Some(55.123));
    }

    #[test]
    fn test_serialized_row_flattens_and_rounds() {
        let snap = Snapshot {
            price: Some(10.0),
            ..Default::default()
        };
        let row = SignalRow {
            record: StockRecord::fetched("AAPL", snap, Some(55.126)),
            signal: Signal::Hold,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["price"], 10.0);
        assert_eq!(json["rsi"], 55.13);
        assert_eq!(json["signal"], "Hold");
        assert!(json["error"].is_null());
    }
}
