use crate::common::monitor_error::{ErrCode, MonitorError};

/// RSI thresholds. Both comparisons are strict, so a value sitting exactly
/// on a threshold holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConfig {
    /// Buy when RSI is below this
    pub buy_below: f64,
    /// Sell when RSI is above this
    pub sell_above: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            buy_below: 30.0,
            sell_above: 70.0,
        }
    }
}

impl SignalConfig {
    pub fn new(buy_below: f64, sell_above: f64) -> Result<Self, MonitorError> {
        let conf = Self {
            buy_below,
            sell_above,
        };
        conf.check()?;
        Ok(conf)
    }

    pub fn check(&self) -> Result<(), MonitorError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.buy_below) || !in_range(self.sell_above) {
            return Err(MonitorError::new(
                format!(
                    "thresholds must lie in [0, 100], got buy_below={} sell_above={}",
                    self.buy_below, self.sell_above
                ),
                ErrCode::ParaError,
            ));
        }
        if self.buy_below > self.sell_above {
            return Err(MonitorError::new(
                format!(
                    "buy_below={} must not exceed sell_above={}",
                    self.buy_below, self.sell_above
                ),
                ErrCode::ParaError,
            ));
        }
        Ok(())
    }
}
