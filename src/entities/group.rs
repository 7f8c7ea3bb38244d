//! Group entity - A rotating-savings pool cycling through periodic auctions.
//!
//! Each group has a fixed pool amount, a per-cycle commission, a configured
//! member count and an auction window. The auction engine only mutates
//! `status` and `next_auction_date`; everything else belongs to group management.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    /// Created, no auction has run yet
    #[sea_orm(string_value = "new")]
    New,
    /// At least one auction round has been opened
    #[sea_orm(string_value = "inprogress")]
    InProgress,
    /// Finished; no further rounds open
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Group database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Fixed pool amount paid out each cycle
    pub amount: f64,
    /// Lifecycle status
    pub status: GroupStatus,
    /// Configured member count; the divisor for per-person profit
    pub number_of_members: i32,
    /// Operator commission taken from each winning bid
    pub commission: f64,
    /// Cycle frequency (`weekly`, `biweekly`, `monthly`, `daily`); unknown values fall back to 30 days
    pub frequency: Option<String>,
    /// Start of the auction window
    pub auction_start_at: Option<DateTimeUtc>,
    /// End of the auction window
    pub auction_end_at: Option<DateTimeUtc>,
    /// Next cycle date, null before the first cycle settles
    pub next_auction_date: Option<DateTimeUtc>,
    /// When the group was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Group and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One group has many shares
    #[sea_orm(has_many = "super::share::Entity")]
    Shares,
    /// One group has many auction rounds
    #[sea_orm(has_many = "super::auction_account::Entity")]
    AuctionAccounts,
}

impl Related<super::share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl Related<super::auction_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuctionAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
