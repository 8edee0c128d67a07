pub mod stock_record;

pub use stock_record::{SignalRow, Snapshot, StockRecord};
