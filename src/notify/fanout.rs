//! Delivery targets and the broadcast notifier.
//!
//! Every event goes to its group channel, to one channel per affected member
//! and to the global channel. Delivery is best effort: a send with no
//! subscribers is dropped and never reported back to the caller.

use crate::notify::events::AuctionEvent;
use std::collections::BTreeSet;
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// Where a delivery is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Everyone watching one group
    Group(i64),
    /// One member
    Member(i64),
    /// Viewers not yet subscribed to a specific group
    Global,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Member(id) => write!(f, "user:{id}"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// One event addressed to one channel
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Target channel
    pub channel: Channel,
    /// Payload
    pub event: AuctionEvent,
}

/// Expands an event into its deliveries: group, each member once, then global.
#[must_use]
pub fn fan_out(event: &AuctionEvent, member_ids: &BTreeSet<i64>) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(member_ids.len() + 2);
    deliveries.push(Delivery {
        channel: Channel::Group(event.group_id()),
        event: event.clone(),
    });
    deliveries.extend(member_ids.iter().map(|&user_id| Delivery {
        channel: Channel::Member(user_id),
        event: event.clone(),
    }));
    deliveries.push(Delivery {
        channel: Channel::Global,
        event: event.clone(),
    });
    deliveries
}

/// Fire-and-forget publisher backed by a broadcast channel
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Delivery>,
}

impl Notifier {
    /// Creates a notifier buffering up to `capacity` deliveries per slow subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to every delivery published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Delivery> {
        self.sender.subscribe()
    }

    /// Publishes all deliveries for `event`; returns how many were handed to subscribers.
    pub fn publish(&self, event: &AuctionEvent, member_ids: &BTreeSet<i64>) -> usize {
        let mut delivered = 0;
        for delivery in fan_out(event, member_ids) {
            let channel = delivery.channel;
            match self.sender.send(delivery) {
                Ok(_) => delivered += 1,
                Err(_) => trace!(%channel, event = event.name(), "No subscribers, delivery dropped"),
            }
        }
        delivered
    }
}
