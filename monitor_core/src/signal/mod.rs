pub mod classifier;
pub mod signal_config;

pub use classifier::{classify, classify_row};
pub use signal_config::SignalConfig;
