//! Auction state machine - the open and close transitions of a round.
//!
//! Both transitions run inside one database transaction. The group and round
//! rows are read with exclusive locks (`SELECT ... FOR UPDATE` where the backend
//! supports it) before any dependent data is read, so a concurrent caller
//! either waits or observes the finished state. Any error drops the
//! transaction, which rolls it back and leaves the round as it was for the next
//! scheduler tick to retry.
//!
//! Neither function publishes notifications; callers do that after commit
//! using the event carried by the outcome.

use crate::{
    core::{
        bid,
        group::{self as group_core, GroupConfig, MemberShare},
        settlement::{self, DueSchedule, PayoutLine, Settlement},
    },
    entities::{
        AuctionAccount, AuctionStatus, Group, GroupStatus, Receivable, ReceivableStatus,
        auction_account, bid as bid_entity, group, payable, receivable,
    },
    errors::{Error, Result},
    notify::{AuctionClosed, AuctionOpened},
};
use chrono::{DateTime, Utc};
use sea_orm::{QuerySelect, Set, TransactionTrait, prelude::*};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Result of an open attempt
#[derive(Debug, Clone)]
pub enum OpenOutcome {
    /// A new round was created
    Opened {
        /// Event to publish
        event: AuctionOpened,
        /// Members to notify
        member_ids: BTreeSet<i64>,
    },
    /// The group already had an open round; nothing changed
    AlreadyOpen {
        /// The existing open round
        auction_account_id: i64,
    },
}

/// Everything a close with a winner produced
#[derive(Debug, Clone)]
pub struct SettledRound {
    /// The round as persisted after the close
    pub account: auction_account::Model,
    /// The winning bid
    pub winning_bid: bid_entity::Model,
    /// Persisted (rounded) amounts
    pub settlement: Settlement,
    /// Unrounded dues computation
    pub dues: DueSchedule,
    /// Regenerated receivables
    pub receivables: Vec<receivable::Model>,
    /// Payables created for the winning slot
    pub payables: Vec<payable::Model>,
    /// The group's new next auction date
    pub next_auction_date: DateTime<Utc>,
    /// Event to publish
    pub event: AuctionClosed,
    /// Members to notify
    pub member_ids: BTreeSet<i64>,
}

/// Result of a close attempt
#[derive(Debug, Clone)]
pub enum CloseOutcome {
    /// Settled with a winner
    Settled(Box<SettledRound>),
    /// No bids: the round was deleted and the group left untouched
    NoBids {
        /// Event to publish
        event: AuctionClosed,
        /// Members to notify
        member_ids: BTreeSet<i64>,
    },
    /// A racing caller closed the round first; nothing changed
    AlreadyClosed {
        /// The round that was already closed
        auction_account_id: i64,
    },
}

/// Opens a new round for `group_id` unless one is already open.
///
/// The existence check and the insert happen under the same group lock and
/// transaction; the storage-level unique index catches anything that slips by.
/// A `new` group moves to `inprogress`.
#[instrument(skip(db))]
pub async fn open_auction(
    db: &DatabaseConnection,
    group_id: i64,
    now: DateTime<Utc>,
) -> Result<OpenOutcome> {
    let txn = db.begin().await?;

    let group = Group::find_by_id(group_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    if group.status == GroupStatus::Closed {
        return Err(Error::InvariantViolation {
            message: format!("group {group_id} is closed and cannot open a round"),
        });
    }

    let existing = AuctionAccount::find()
        .filter(auction_account::Column::GroupId.eq(group_id))
        .filter(auction_account::Column::Status.eq(AuctionStatus::Open))
        .lock_exclusive()
        .one(&txn)
        .await?;

    if let Some(open_round) = existing {
        txn.rollback().await?;
        debug!(round_id = open_round.id, "Round already open");
        return Ok(OpenOutcome::AlreadyOpen {
            auction_account_id: open_round.id,
        });
    }

    let config = GroupConfig::from(&group);

    let round = auction_account::ActiveModel {
        group_id: Set(group_id),
        status: Set(AuctionStatus::Open),
        auction_amount: Set(0.0),
        commission: Set(group.commission),
        cash_to_customer: Set(0.0),
        balance: Set(0.0),
        profit_per_person: Set(0.0),
        winner_share_id: Set(None),
        opened_at: Set(now),
        closed_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if group.status == GroupStatus::New {
        let mut active: group::ActiveModel = group.into();
        active.status = Set(GroupStatus::InProgress);
        active.update(&txn).await?;
    }

    // Built before commit so an invalid group configuration rolls the round back
    let event = AuctionOpened::new(&config, round.id, round.opened_at)?;
    let members = group_core::active_members(&txn, group_id).await?;

    txn.commit().await?;

    info!(
        round_id = round.id,
        minimum_bid = event.minimum_bid,
        "Auction opened for group '{}'",
        config.name
    );

    Ok(OpenOutcome::Opened {
        event,
        member_ids: group_core::member_user_ids(&members),
    })
}

/// Closes and settles round `auction_account_id`.
///
/// Bids are read after the round row is locked, so only bids present at that
/// point can win. Without bids the round is deleted; with a winner the round,
/// receivables, payables and the group's next date are written together.
#[instrument(skip(db))]
pub async fn close_auction(
    db: &DatabaseConnection,
    auction_account_id: i64,
    now: DateTime<Utc>,
) -> Result<CloseOutcome> {
    let txn = db.begin().await?;

    let round = AuctionAccount::find_by_id(auction_account_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(Error::AuctionNotFound {
            id: auction_account_id,
        })?;

    if round.status != AuctionStatus::Open {
        txn.rollback().await?;
        debug!("Round already closed");
        return Ok(CloseOutcome::AlreadyClosed { auction_account_id });
    }

    let group = Group::find_by_id(round.group_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(Error::GroupNotFound { id: round.group_id })?;

    let config = GroupConfig::from(&group);
    let members = group_core::active_members(&txn, group.id).await?;
    let member_ids = group_core::member_user_ids(&members);

    let Some(winning_bid) = bid::winning_bid(&txn, round.id).await? else {
        Receivable::delete_many()
            .filter(receivable::Column::AuctionAccountId.eq(round.id))
            .exec(&txn)
            .await?;
        round.delete(&txn).await?;
        txn.commit().await?;

        info!("No bids; round discarded for group '{}'", config.name);
        return Ok(CloseOutcome::NoBids {
            event: AuctionClosed::no_winner(&config, auction_account_id, group.next_auction_date, now),
            member_ids,
        });
    };

    let raw = settlement::compute_settlement(
        group.amount,
        round.commission,
        group.number_of_members,
        winning_bid.amount,
    )?;
    let persisted = raw.rounded();

    let next_auction_date = group_core::next_auction_date(
        group.next_auction_date,
        group.auction_start_at,
        winning_bid.created_at,
        group.frequency.as_deref(),
    );

    let mut active_round: auction_account::ActiveModel = round.into();
    active_round.status = Set(AuctionStatus::Closed);
    active_round.auction_amount = Set(persisted.auction_amount);
    active_round.cash_to_customer = Set(persisted.cash_to_customer);
    active_round.balance = Set(persisted.balance);
    active_round.profit_per_person = Set(persisted.profit_per_person);
    active_round.winner_share_id = Set(Some(winning_bid.share_id));
    active_round.closed_at = Set(Some(now));
    let account = active_round.update(&txn).await?;

    let dues = settlement::compute_dues(
        group.amount,
        raw.profit_per_person,
        group.number_of_members,
        &members,
    )?;
    let receivables = regenerate_receivables(&txn, &account, &dues, now).await?;

    let payables = if raw.has_payout() {
        let lines = payout_lines(&members, &winning_bid, raw.cash_to_customer);
        create_payables(&txn, &account, &lines, now).await?
    } else {
        Vec::new()
    };

    let mut active_group: group::ActiveModel = group.into();
    active_group.next_auction_date = Set(Some(next_auction_date));
    active_group.update(&txn).await?;

    let event = AuctionClosed::settled(
        &config,
        account.id,
        winning_bid.share_id,
        &persisted,
        next_auction_date,
        now,
    )?;

    txn.commit().await?;

    info!(
        winner_share_id = winning_bid.share_id,
        auction_amount = persisted.auction_amount,
        receivables = receivables.len(),
        payables = payables.len(),
        "Auction settled for group '{}'",
        config.name
    );

    Ok(CloseOutcome::Settled(Box::new(SettledRound {
        account,
        winning_bid,
        settlement: persisted,
        dues,
        receivables,
        payables,
        next_auction_date,
        event,
        member_ids,
    })))
}

/// Replaces the round's receivables with one pending due per participating share.
async fn regenerate_receivables<C>(
    db: &C,
    account: &auction_account::Model,
    dues: &DueSchedule,
    now: DateTime<Utc>,
) -> Result<Vec<receivable::Model>>
where
    C: ConnectionTrait,
{
    Receivable::delete_many()
        .filter(receivable::Column::AuctionAccountId.eq(account.id))
        .exec(db)
        .await?;

    let mut created = Vec::with_capacity(dues.lines.len());
    for line in &dues.lines {
        let model = receivable::ActiveModel {
            group_id: Set(account.group_id),
            auction_account_id: Set(account.id),
            user_id: Set(line.user_id),
            share_id: Set(line.share_id),
            due_amount: Set(line.due_amount),
            status: Set(ReceivableStatus::Pending),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

/// Splits the discount across the winning slot's co-owners.
///
/// Falls back to crediting the bidder directly when the winning share no
/// longer resolves to a slot with any owning user.
fn payout_lines(
    members: &[MemberShare],
    winning_bid: &bid_entity::Model,
    cash_to_customer: f64,
) -> Vec<PayoutLine> {
    let co_owners: Vec<MemberShare> = members
        .iter()
        .find(|m| m.share_id == winning_bid.share_id)
        .map(|winner| {
            members
                .iter()
                .filter(|m| m.share_no == winner.share_no)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if co_owners.iter().any(|m| m.user_id.is_some()) {
        return settlement::split_payout(cash_to_customer, &co_owners);
    }

    match winning_bid.user_id {
        Some(user_id) => {
            warn!(
                share_id = winning_bid.share_id,
                "Winning share has no owning slot; crediting bidder directly"
            );
            vec![PayoutLine {
                share_id: None,
                user_id,
                amount: settlement::round2(cash_to_customer),
            }]
        }
        None => {
            warn!(
                share_id = winning_bid.share_id,
                "Winning share has no owner to pay; payout skipped"
            );
            Vec::new()
        }
    }
}

async fn create_payables<C>(
    db: &C,
    account: &auction_account::Model,
    lines: &[PayoutLine],
    now: DateTime<Utc>,
) -> Result<Vec<payable::Model>>
where
    C: ConnectionTrait,
{
    let mut created = Vec::with_capacity(lines.len());
    for line in lines {
        let model = payable::ActiveModel {
            group_id: Set(account.group_id),
            auction_account_id: Set(Some(account.id)),
            user_id: Set(line.user_id),
            share_id: Set(line.share_id),
            amount: Set(line.amount),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

/// Finds a round by id.
pub async fn get_auction_by_id<C>(
    db: &C,
    auction_account_id: i64,
) -> Result<Option<auction_account::Model>>
where
    C: ConnectionTrait,
{
    AuctionAccount::find_by_id(auction_account_id)
        .one(db)
        .await
        .map_err(Into::into)
}
