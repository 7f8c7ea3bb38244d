//! Auction engine - the entry point used by the scheduler and API callers.
//!
//! Wraps the open/close transitions with a per-group lock and a time budget,
//! and publishes the resulting event only after the transaction committed.

use crate::{
    core::{
        auction::{self, CloseOutcome, OpenOutcome},
        locks::GroupLocks,
        report,
    },
    entities::AuctionAccount,
    errors::{Error, Result},
    notify::{AuctionEvent, Notifier},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Shared handle to the auction lifecycle; cheap to clone
#[derive(Clone)]
pub struct AuctionEngine {
    db: DatabaseConnection,
    notifier: Notifier,
    locks: GroupLocks,
    transaction_timeout: Duration,
}

impl AuctionEngine {
    /// Creates an engine over `db`, publishing through `notifier`.
    #[must_use]
    pub fn new(db: DatabaseConnection, notifier: Notifier, transaction_timeout: Duration) -> Self {
        Self {
            db,
            notifier,
            locks: GroupLocks::new(),
            transaction_timeout,
        }
    }

    /// Database handle
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Notifier used for published events
    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Opens a round for `group_id`; a no-op when one is already open.
    #[instrument(skip(self))]
    pub async fn open(&self, group_id: i64, now: DateTime<Utc>) -> Result<OpenOutcome> {
        let _guard = self.locks.acquire(group_id).await;

        let outcome = self
            .bounded("open auction", auction::open_auction(&self.db, group_id, now))
            .await?;

        match &outcome {
            OpenOutcome::Opened { event, member_ids } => {
                let sent = self
                    .notifier
                    .publish(&AuctionEvent::Opened(event.clone()), member_ids);
                debug!(deliveries = sent, "Opened event published");
            }
            OpenOutcome::AlreadyOpen { auction_account_id } => {
                debug!(auction_account_id, "Open skipped, round already open");
            }
        }

        Ok(outcome)
    }

    /// Closes and settles round `auction_account_id`; a no-op when already closed.
    #[instrument(skip(self))]
    pub async fn close(&self, auction_account_id: i64, now: DateTime<Utc>) -> Result<CloseOutcome> {
        let group_id = AuctionAccount::find_by_id(auction_account_id)
            .one(&self.db)
            .await?
            .ok_or(Error::AuctionNotFound {
                id: auction_account_id,
            })?
            .group_id;

        let _guard = self.locks.acquire(group_id).await;

        let outcome = self
            .bounded(
                "close auction",
                auction::close_auction(&self.db, auction_account_id, now),
            )
            .await?;

        match &outcome {
            CloseOutcome::Settled(round) => {
                info!("{}", report::format_settlement_summary(round));
                self.notifier
                    .publish(&AuctionEvent::Closed(round.event.clone()), &round.member_ids);
            }
            CloseOutcome::NoBids { event, member_ids } => {
                self.notifier
                    .publish(&AuctionEvent::Closed(event.clone()), member_ids);
            }
            CloseOutcome::AlreadyClosed { .. } => {
                debug!("Close skipped, round already closed");
            }
        }

        Ok(outcome)
    }

    /// Runs a transition within the configured time budget. A transition that
    /// runs out of time is dropped, which rolls its transaction back.
    async fn bounded<T, F>(&self, operation: &str, transition: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.transaction_timeout, transition)
            .await
            .map_err(|_| Error::Timeout {
                operation: operation.to_string(),
                seconds: self.transaction_timeout.as_secs(),
            })?
    }
}
