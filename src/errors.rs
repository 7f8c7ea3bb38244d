//! Unified error type for the auction engine.
//!
//! "Already in state" situations (opening a group that already has an open
//! round, closing a round that is already closed) are not errors; they are
//! reported through the outcome enums in [`crate::core::auction`].

use sea_orm::DbErr;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be read, parsed or validated
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any storage or transaction failure; the surrounding transaction is rolled back
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The group does not exist
    #[error("Group not found: {id}")]
    GroupNotFound {
        /// Group id that was looked up
        id: i64,
    },

    /// The auction account does not exist (never opened, or deleted by a no-bid close)
    #[error("Auction account not found: {id}")]
    AuctionNotFound {
        /// Auction account id that was looked up
        id: i64,
    },

    /// The share does not exist or does not belong to the group
    #[error("Share not found: {id}")]
    ShareNotFound {
        /// Share id that was looked up
        id: i64,
    },

    /// A bid arrived while the group has no open auction round
    #[error("No open auction for group {group_id}")]
    NoOpenAuction {
        /// Group the bid was placed against
        group_id: i64,
    },

    /// Amount is zero, negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Settlement math could not produce a meaningful result for this cycle
    #[error("Computation invariant violated: {message}")]
    InvariantViolation {
        /// Which invariant failed
        message: String,
    },

    /// A transition did not finish within its time budget
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Name of the operation that timed out
        operation: String,
        /// Budget that was exceeded
        seconds: u64,
    },

    /// Settings file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
