//! Auction lifecycle events.
//!
//! Each event has fixed fields and is validated when it is built; the
//! transport layer only serializes them. The JSON form carries a `type` tag of
//! `auction:opened` or `auction:closed`.

use crate::{
    core::{group::GroupConfig, settlement::Settlement},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message attached to a close with a winner
pub const CLOSED_MESSAGE: &str = "Auction closed";
/// Message attached to a close without bids
pub const NO_WINNER_MESSAGE: &str = "Auction closed with no bids";

fn finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvariantViolation {
            message: format!("event field {field} is not finite: {value}"),
        })
    }
}

/// A round opened for bidding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionOpened {
    /// Group id
    pub group_id: i64,
    /// Group display name
    pub group_name: String,
    /// The new round
    pub group_account_id: i64,
    /// Pool amount plus commission
    pub minimum_bid: f64,
    /// Commission for this round
    pub commission: f64,
    /// Pool amount
    pub group_amount: f64,
    /// Window start
    pub auction_start_at: Option<DateTime<Utc>>,
    /// Window end
    pub auction_end_at: Option<DateTime<Utc>>,
    /// When the round was opened
    pub opened_at: DateTime<Utc>,
}

impl AuctionOpened {
    /// Builds the event, rejecting non-finite amounts and inverted windows.
    pub fn new(group: &GroupConfig, group_account_id: i64, opened_at: DateTime<Utc>) -> Result<Self> {
        let group_amount = finite("group_amount", group.amount)?;
        let commission = finite("commission", group.commission)?;

        if let (Some(start), Some(end)) = (group.auction_start_at, group.auction_end_at) {
            if end <= start {
                return Err(Error::InvariantViolation {
                    message: format!("auction window of group {} ends before it starts", group.id),
                });
            }
        }

        Ok(Self {
            group_id: group.id,
            group_name: group.name.clone(),
            group_account_id,
            minimum_bid: finite("minimum_bid", group_amount + commission)?,
            commission,
            group_amount,
            auction_start_at: group.auction_start_at,
            auction_end_at: group.auction_end_at,
            opened_at,
        })
    }
}

/// A round was settled, with or without a winner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionClosed {
    /// Group id
    pub group_id: i64,
    /// Group display name
    pub group_name: String,
    /// The settled round
    pub group_account_id: Option<i64>,
    /// Winning share, None without bids
    pub winner_share_id: Option<i64>,
    /// Winning bid amount
    pub winning_amount: f64,
    /// Same as `winning_amount`, as persisted on the round
    pub auction_amount: f64,
    /// Commission taken
    pub commission: f64,
    /// Discount owed to the winning slot
    pub cash_to_customer: f64,
    /// Winning bid minus commission
    pub balance: f64,
    /// Balance per configured member
    pub profit_per_person: f64,
    /// Next cycle date after this close
    pub next_auction_date: Option<DateTime<Utc>>,
    /// When the round was closed
    pub closed_at: DateTime<Utc>,
    /// Human-readable summary
    pub message: String,
}

impl AuctionClosed {
    /// Close with a winner; `settlement` should already be rounded.
    pub fn settled(
        group: &GroupConfig,
        group_account_id: i64,
        winner_share_id: i64,
        settlement: &Settlement,
        next_auction_date: DateTime<Utc>,
        closed_at: DateTime<Utc>,
    ) -> Result<Self> {
        let auction_amount = finite("auction_amount", settlement.auction_amount)?;
        Ok(Self {
            group_id: group.id,
            group_name: group.name.clone(),
            group_account_id: Some(group_account_id),
            winner_share_id: Some(winner_share_id),
            winning_amount: auction_amount,
            auction_amount,
            commission: finite("commission", settlement.commission)?,
            cash_to_customer: finite("cash_to_customer", settlement.cash_to_customer)?,
            balance: finite("balance", settlement.balance)?,
            profit_per_person: finite("profit_per_person", settlement.profit_per_person)?,
            next_auction_date: Some(next_auction_date),
            closed_at,
            message: CLOSED_MESSAGE.to_string(),
        })
    }

    /// Close without bids: zero amounts, next date untouched.
    #[must_use]
    pub fn no_winner(
        group: &GroupConfig,
        group_account_id: i64,
        next_auction_date: Option<DateTime<Utc>>,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id: group.id,
            group_name: group.name.clone(),
            group_account_id: Some(group_account_id),
            winner_share_id: None,
            winning_amount: 0.0,
            auction_amount: 0.0,
            commission: 0.0,
            cash_to_customer: 0.0,
            balance: 0.0,
            profit_per_person: 0.0,
            next_auction_date,
            closed_at,
            message: NO_WINNER_MESSAGE.to_string(),
        }
    }

    /// Whether the round had a winner
    #[must_use]
    pub const fn has_winner(&self) -> bool {
        self.winner_share_id.is_some()
    }
}

/// Event delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuctionEvent {
    /// A round opened
    #[serde(rename = "auction:opened")]
    Opened(AuctionOpened),
    /// A round closed
    #[serde(rename = "auction:closed")]
    Closed(AuctionClosed),
}

impl AuctionEvent {
    /// Group the event concerns
    #[must_use]
    pub const fn group_id(&self) -> i64 {
        match self {
            Self::Opened(e) => e.group_id,
            Self::Closed(e) => e.group_id,
        }
    }

    /// Wire name of the event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Opened(_) => "auction:opened",
            Self::Closed(_) => "auction:closed",
        }
    }

    /// JSON payload including the `type` tag
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}
