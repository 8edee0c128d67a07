pub mod analyzer;

pub use analyzer::{Monitor, RefreshRequest, Report};
