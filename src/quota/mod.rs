//! Daily usage quota accounting.
//!
//! The [`UsageLedger`] is an append-only log of granted feature invocations and
//! [`QuotaPolicy`] decides, per user and category, whether today's count leaves
//! room for one more. Counting always reads the log; there is no counter column
//! that could drift from it.

pub mod clock;
pub mod ledger;
pub mod policy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{ConditionalRecord, MemoryUsageLedger, UsageLedger};
pub use policy::{day_boundary, next_day_boundary, QuotaPolicy};

/// Errors raised by the ledger and the policy
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// The ledger store could not be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    /// Category is not one of the metered features
    #[error("Unknown feature category '{0}'")]
    InvalidCategory(String),
}
