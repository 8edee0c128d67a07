pub mod holding;
pub mod merger;

pub use holding::{portfolio_symbols, read_holdings, Holding};
pub use merger::{merge, PortfolioRow};
