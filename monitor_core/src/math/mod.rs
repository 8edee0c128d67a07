pub mod rsi;

pub use rsi::{compute_rsi, Rsi};
