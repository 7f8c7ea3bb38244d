//! Periodic scheduler driving the auction lifecycle.
//!
//! Each tick recomputes what is due from persisted timestamps, so the
//! scheduler carries no state across ticks besides the interval and the time
//! of the last tick. Every due group runs as its own task; a failing group is
//! logged and never holds up the others.

use crate::{
    core::{AuctionEngine, CloseOutcome, OpenOutcome},
    entities::{AuctionAccount, AuctionStatus, Group, GroupStatus, auction_account, group},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Rounds opened
    pub opened: usize,
    /// Open attempts that found a round already open
    pub already_open: usize,
    /// Rounds settled with a winner
    pub settled: usize,
    /// Rounds discarded without bids
    pub no_bids: usize,
    /// Close attempts that found the round already closed
    pub already_closed: usize,
    /// Transitions that failed and will be retried next tick
    pub failed: usize,
}

impl TickReport {
    /// Whether the tick found nothing to do
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.opened == 0
            && self.already_open == 0
            && self.settled == 0
            && self.no_bids == 0
            && self.already_closed == 0
            && self.failed == 0
    }
}

enum Transition {
    Open {
        group_id: i64,
        result: Result<OpenOutcome>,
    },
    Close {
        group_id: i64,
        auction_account_id: i64,
        result: Result<CloseOutcome>,
    },
}

/// Tick-driven scheduler over an [`AuctionEngine`]
pub struct Scheduler {
    engine: AuctionEngine,
    interval: Duration,
    last_tick: Option<DateTime<Utc>>,
}

impl Scheduler {
    /// Creates a scheduler ticking every `interval`.
    #[must_use]
    pub const fn new(engine: AuctionEngine, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            last_tick: None,
        }
    }

    /// Time of the last completed tick
    #[must_use]
    pub const fn last_tick(&self) -> Option<DateTime<Utc>> {
        self.last_tick
    }

    /// Tick interval
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one open check and one close check as of `now`.
    ///
    /// Only the due-ness queries can fail the tick itself; transition errors
    /// are logged per group and counted in the report.
    #[instrument(skip(self))]
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickReport> {
        let db = self.engine.database();
        let openings = due_openings(db, now).await?;
        let closings = due_closings(db, now).await?;

        let mut tasks = JoinSet::new();
        for group_id in openings {
            let engine = self.engine.clone();
            tasks.spawn(async move {
                Transition::Open {
                    group_id,
                    result: engine.open(group_id, now).await,
                }
            });
        }
        for (auction_account_id, group_id) in closings {
            let engine = self.engine.clone();
            tasks.spawn(async move {
                Transition::Close {
                    group_id,
                    auction_account_id,
                    result: engine.close(auction_account_id, now).await,
                }
            });
        }

        let mut report = TickReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Transition::Open { group_id, result }) => match result {
                    Ok(OpenOutcome::Opened { .. }) => report.opened += 1,
                    Ok(OpenOutcome::AlreadyOpen { .. }) => report.already_open += 1,
                    Err(e) => {
                        report.failed += 1;
                        error!(group_id, "Failed to open auction: {}", e);
                    }
                },
                Ok(Transition::Close {
                    group_id,
                    auction_account_id,
                    result,
                }) => match result {
                    Ok(CloseOutcome::Settled(_)) => report.settled += 1,
                    Ok(CloseOutcome::NoBids { .. }) => report.no_bids += 1,
                    Ok(CloseOutcome::AlreadyClosed { .. }) => report.already_closed += 1,
                    Err(e) => {
                        report.failed += 1;
                        error!(
                            group_id,
                            auction_account_id, "Failed to close auction: {}", e
                        );
                    }
                },
                Err(e) => {
                    report.failed += 1;
                    error!("Auction task aborted: {}", e);
                }
            }
        }

        self.last_tick = Some(now);
        if report.is_idle() {
            debug!("Tick finished, nothing due");
        } else {
            info!(?report, "Tick finished");
        }
        Ok(report)
    }

    /// Ticks until `shutdown` resolves. A tick in progress always finishes;
    /// ticks missed while one was running are skipped.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_secs = self.interval.as_secs(), "Scheduler started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!("Scheduler tick failed: {}", e);
                    }
                }
            }
        }
        info!("Scheduler stopped");
    }
}

/// Groups whose window contains `now`, that may still run rounds and have
/// no open round.
pub async fn due_openings(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<Vec<i64>> {
    let with_open_round: HashSet<i64> = AuctionAccount::find()
        .filter(auction_account::Column::Status.eq(AuctionStatus::Open))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.group_id)
        .collect();

    let groups = Group::find()
        .filter(group::Column::Status.is_in([GroupStatus::New, GroupStatus::InProgress]))
        .filter(group::Column::AuctionStartAt.lte(now))
        .filter(group::Column::AuctionEndAt.gt(now))
        .order_by_asc(group::Column::Id)
        .all(db)
        .await?;

    Ok(groups
        .into_iter()
        .map(|g| g.id)
        .filter(|id| !with_open_round.contains(id))
        .collect())
}

/// Open rounds whose group window has ended, as `(auction_account_id, group_id)`.
pub async fn due_closings(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<Vec<(i64, i64)>> {
    let rounds = AuctionAccount::find()
        .filter(auction_account::Column::Status.eq(AuctionStatus::Open))
        .order_by_asc(auction_account::Column::Id)
        .find_also_related(Group)
        .all(db)
        .await?;

    Ok(rounds
        .into_iter()
        .filter_map(|(round, group)| {
            let end = group?.auction_end_at?;
            (end <= now).then_some((round.id, round.group_id))
        })
        .collect())
}
