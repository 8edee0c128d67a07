//! Market data boundary. The engine only sees this trait; the HTTP client
//! lives with the front end.

use std::future::Future;

use crate::common::monitor_error::MonitorError;
use crate::stock::Snapshot;

/// What a provider returns for one symbol.
///
/// `history` failing on its own is a partial success: the snapshot is still
/// shown and the RSI is treated as undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuote {
    pub snapshot: Snapshot,
    /// Daily closing prices, oldest first.
    pub history: Result<Vec<f64>, MonitorError>,
}

pub trait PriceProvider {
    fn fetch(
        &self,
        symbol: &str,
    ) -> impl Future<Output = Result<ProviderQuote, MonitorError>> + Send;
}
