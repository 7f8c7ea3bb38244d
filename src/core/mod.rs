//! Core business logic - framework-agnostic auction lifecycle operations.
//!
//! Storage access goes through SeaORM entities; nothing in here knows about
//! the scheduler or how notifications are delivered.

/// Open and close transitions of an auction round
pub mod auction;
/// Append-only bid ledger
pub mod bid;
/// Lock, timeout and publish wrapper around the transitions
pub mod engine;
/// Group configuration, members and cycle dates
pub mod group;
/// Per-group in-process locks
pub mod locks;
/// Read-only reporting over settled rounds
pub mod report;
/// Pure settlement arithmetic
pub mod settlement;

pub use auction::{CloseOutcome, OpenOutcome, SettledRound};
pub use engine::AuctionEngine;
