use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::common::monitor_error::{ErrCode, MonitorError};
use crate::signal::signal_config::SignalConfig;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Wilder period of the RSI
    pub rsi_period: usize,
    pub signal_conf: SignalConfig,
    /// History window requested from the provider, e.g. "1mo"
    pub history_range: String,
    /// Upper bound on in-flight provider calls
    pub concurrency: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            signal_conf: SignalConfig::default(),
            history_range: "1mo".to_string(),
            concurrency: 4,
        }
    }
}

impl MonitorConfig {
    pub fn new(conf: Option<HashMap<String, serde_json::Value>>) -> Result<Self, MonitorError> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());
        let default = Self::default();

        let config = Self {
            rsi_period: conf.get("rsi_period")?.unwrap_or(default.rsi_period),
            signal_conf: SignalConfig {
                buy_below: conf.get("buy_below")?.unwrap_or(default.signal_conf.buy_below),
                sell_above: conf.get("sell_above")?.unwrap_or(default.signal_conf.sell_above),
            },
            history_range: conf.get("history_range")?.unwrap_or(default.history_range),
            concurrency: conf.get("concurrency")?.unwrap_or(default.concurrency),
        };
        conf.check()?;
        config.check()?;
        Ok(config)
    }

    /// Parse a JSON object of overrides
    pub fn from_json_str(s: &str) -> Result<Self, MonitorError> {
        let map: HashMap<String, serde_json::Value> = serde_json::from_str(s).map_err(|e| {
            MonitorError::new(format!("config is not a JSON object: {e}"), ErrCode::ConfigError)
        })?;
        Self::new(Some(map))
    }

    pub fn check(&self) -> Result<(), MonitorError> {
        if self.rsi_period < 1 {
            return Err(MonitorError::new("rsi_period must be >= 1", ErrCode::ParaError));
        }
        if self.concurrency < 1 {
            return Err(MonitorError::new("concurrency must be >= 1", ErrCode::ParaError));
        }
        if self.history_range.trim().is_empty() {
            return Err(MonitorError::new("history_range must not be empty", ErrCode::ParaError));
        }
        self.signal_conf.check()
    }
}

/// Key/value overrides where every key must be read exactly once.
pub struct ConfigWithCheck {
    conf: HashMap<String, serde_json::Value>,
}

impl ConfigWithCheck {
    pub fn new(conf: HashMap<String, serde_json::Value>) -> Self {
        Self { conf }
    }

    /// Take `key` out of the map, decoding it as `T`
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, MonitorError> {
        match self.conf.remove(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
                MonitorError::new(format!("invalid value {v} for {key}: {e}"), ErrCode::ConfigError)
            }),
        }
    }

    /// Fail on any key nobody asked for
    pub fn check(&self) -> Result<(), MonitorError> {
        if self.conf.is_empty() {
            return Ok(());
        }
        let mut unknown: Vec<&str> = self.conf.keys().map(String::as_str).collect();
        unknown.sort_unstable();
        Err(MonitorError::new(
            format!("unknown para = {}", unknown.join(", ")),
            ErrCode::ParaError,
        ))
    }
}
