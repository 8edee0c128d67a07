pub mod analyzer;
pub mod common;
pub mod config;
pub mod math;
pub mod portfolio;
pub mod provider;
pub mod signal;
pub mod stock;

pub use analyzer::{Monitor, RefreshRequest, Report};
pub use common::enums::Signal;
pub use common::monitor_error::{ErrCode, MonitorError};
pub use config::MonitorConfig;
pub use provider::{PriceProvider, ProviderQuote};
