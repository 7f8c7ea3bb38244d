//! Notification layer - translates auction outcomes into deliveries.
//!
//! Publishing happens strictly after the database transaction committed, and a
//! failed delivery never affects persisted state.

/// Typed auction events
pub mod events;
/// Channel addressing, fan-out and the broadcast notifier
pub mod fanout;

pub use events::{AuctionClosed, AuctionEvent, AuctionOpened};
pub use fanout::{Channel, Delivery, Notifier, fan_out};
