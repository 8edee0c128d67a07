use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Trading recommendation derived from the RSI of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum Signal {
    #[strum(serialize = "Buy")]
    Buy,
    #[strum(serialize = "Sell")]
    Sell,
    #[strum(serialize = "Hold")]
    Hold,
    #[strum(serialize = "Error")]
    Error,
}

impl Signal {
    /// Dashboard label, icon included
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Buy => "🟢 Buy",
            Signal::Sell => "🔴 Sell",
            Signal::Hold => "🟡 Hold",
            Signal::Error => "⚠️ Error",
        }
    }
}
