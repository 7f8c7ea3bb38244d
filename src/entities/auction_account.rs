//! Auction account entity - One open-to-close round of a group.
//!
//! Created by the open transition, written once by the close transition and
//! never re-opened. At most one row per group may be `open`; a partial unique
//! index created at bootstrap enforces that in storage as well.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Round status
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    /// Accepting bids
    #[sea_orm(string_value = "open")]
    Open,
    /// Settled
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Auction account database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auction_accounts")]
pub struct Model {
    /// Unique identifier for the round
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning group
    pub group_id: i64,
    /// Round status
    pub status: AuctionStatus,
    /// Winning bid amount
    pub auction_amount: f64,
    /// Commission taken from the winning bid
    pub commission: f64,
    /// Discount paid to the winning slot (pool amount minus winning bid)
    pub cash_to_customer: f64,
    /// Winning bid minus commission
    pub balance: f64,
    /// Balance divided by the configured member count
    pub profit_per_person: f64,
    /// Share that placed the winning bid
    pub winner_share_id: Option<i64>,
    /// When the round opened
    pub opened_at: DateTimeUtc,
    /// When the round was settled
    pub closed_at: Option<DateTimeUtc>,
}

/// Defines relationships between `AuctionAccount` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each round belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
    /// One round has many bids
    #[sea_orm(has_many = "super::bid::Entity")]
    Bids,
    /// One round has many receivables
    #[sea_orm(has_many = "super::receivable::Entity")]
    Receivables,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::bid::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bids.def()
    }
}

impl Related<super::receivable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
