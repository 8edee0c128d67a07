pub mod enums;
pub mod monitor_error;
pub mod utils;
