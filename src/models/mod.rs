pub mod position;
pub mod price_sample;
pub mod transaction;
pub mod valuation;

pub use position::{OpenPosition, Position, PositionAdjustment};
pub use price_sample::{NewPriceSample, PriceSample};
pub use transaction::{LedgerEntry, Transaction};
pub use valuation::Valuation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TrackerError;

/// Identity of the account holder, as verified by the upstream auth layer.
pub type OwnerId = i64;

/// Largest share count a single lot may hold.
pub const MAX_QUANTITY: i64 = 1_000_000_000_000;

/// Smallest purchase price accepted at the boundary.
pub fn min_price() -> Decimal {
    Decimal::new(1, 2)
}

/// Largest per-share price accepted at the boundary. Together with
/// `MAX_QUANTITY` this keeps position value and P&L well inside `Decimal`.
pub fn max_price() -> Decimal {
    Decimal::from(1_000_000_000_i64)
}

pub(crate) fn check_price(price: Decimal) -> Result<(), TrackerError> {
    if price < min_price() || price > max_price() {
        return Err(TrackerError::Validation(format!(
            "purchase_price must be between {} and {}",
            min_price(),
            max_price()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

const MAX_SYMBOL_LEN: usize = 16;

/// Upper-cased ticker symbol, checked once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(TrackerError::Validation("symbol must not be empty".into()));
        }
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(TrackerError::Validation(format!(
                "symbol must be at most {MAX_SYMBOL_LEN} characters"
            )));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(TrackerError::Validation(format!(
                "symbol {normalized:?} contains invalid characters"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
