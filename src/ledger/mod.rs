pub mod position_ledger;
pub mod valuation;

pub use position_ledger::{LedgerOutcome, PositionLedger};
pub use valuation::ValuationQuery;
