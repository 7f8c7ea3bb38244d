//! Group read accessors and cycle arithmetic.
//!
//! Group and share management live outside the auction engine; this module
//! only reads them. It also owns the cycle-frequency rules used to compute
//! the next auction date after a round settles.

use crate::{
    entities::{Group, Share, ShareStatus, group, share},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, prelude::*};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Days added for a missing or unrecognised frequency.
pub const DEFAULT_CYCLE_DAYS: i64 = 30;

/// How often a group runs an auction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleFrequency {
    /// Every day
    Daily,
    /// Every 7 days
    Weekly,
    /// Every 14 days
    Biweekly,
    /// Every 30 days
    Monthly,
}

impl CycleFrequency {
    /// Length of one cycle in days
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
        }
    }

    /// Cycle length for a stored frequency value, defaulting to 30 days.
    #[must_use]
    pub fn cycle_days(stored: Option<&str>) -> i64 {
        stored
            .and_then(|s| s.parse::<Self>().ok())
            .map_or(DEFAULT_CYCLE_DAYS, Self::days)
    }
}

impl FromStr for CycleFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(Error::Config {
                message: format!("Unknown cycle frequency '{other}'"),
            }),
        }
    }
}

/// The subset of a group the settlement needs
#[derive(Debug, Clone, PartialEq)]
pub struct GroupConfig {
    /// Group id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Fixed pool amount
    pub amount: f64,
    /// Commission per cycle
    pub commission: f64,
    /// Configured member count
    pub number_of_members: i32,
    /// Stored frequency value
    pub frequency: Option<String>,
    /// Auction window start
    pub auction_start_at: Option<DateTime<Utc>>,
    /// Auction window end
    pub auction_end_at: Option<DateTime<Utc>>,
}

impl From<&group::Model> for GroupConfig {
    fn from(g: &group::Model) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
            amount: g.amount,
            commission: g.commission,
            number_of_members: g.number_of_members,
            frequency: g.frequency.clone(),
            auction_start_at: g.auction_start_at,
            auction_end_at: g.auction_end_at,
        }
    }
}

/// One share as seen by the settlement
#[derive(Debug, Clone, PartialEq)]
pub struct MemberShare {
    /// Share id
    pub share_id: i64,
    /// Owning user, None for a pending invite
    pub user_id: Option<i64>,
    /// Slot number
    pub share_no: i32,
    /// Percentage of the slot
    pub share_percent: f64,
    /// Membership status
    pub status: ShareStatus,
}

impl From<share::Model> for MemberShare {
    fn from(s: share::Model) -> Self {
        Self {
            share_id: s.id,
            user_id: s.user_id,
            share_no: s.share_no,
            share_percent: s.share_percent,
            status: s.status,
        }
    }
}

/// Reads the settlement-relevant configuration of a group.
pub async fn group_config<C>(db: &C, group_id: i64) -> Result<GroupConfig>
where
    C: ConnectionTrait,
{
    Group::find_by_id(group_id)
        .one(db)
        .await?
        .map(|g| GroupConfig::from(&g))
        .ok_or(Error::GroupNotFound { id: group_id })
}

/// Lists the non-declined shares of a group, ordered by slot then id.
pub async fn active_members<C>(db: &C, group_id: i64) -> Result<Vec<MemberShare>>
where
    C: ConnectionTrait,
{
    let shares = Share::find()
        .filter(share::Column::GroupId.eq(group_id))
        .filter(share::Column::Status.ne(ShareStatus::Declined))
        .order_by_asc(share::Column::ShareNo)
        .order_by_asc(share::Column::Id)
        .all(db)
        .await?;

    Ok(shares.into_iter().map(MemberShare::from).collect())
}

/// Distinct user ids behind the active/accepted shares.
#[must_use]
pub fn member_user_ids(members: &[MemberShare]) -> BTreeSet<i64> {
    members
        .iter()
        .filter(|m| m.status.is_participating())
        .filter_map(|m| m.user_id)
        .collect()
}

/// Computes the date of the next cycle.
///
/// The base is the first available of the current `next_auction_date`, the
/// window start and the winning bid's timestamp; it is advanced by one cycle.
#[must_use]
pub fn next_auction_date(
    current_next: Option<DateTime<Utc>>,
    auction_start_at: Option<DateTime<Utc>>,
    winning_bid_at: DateTime<Utc>,
    frequency: Option<&str>,
) -> DateTime<Utc> {
    let base = current_next.or(auction_start_at).unwrap_or(winning_bid_at);
    base + Duration::days(CycleFrequency::cycle_days(frequency))
}
