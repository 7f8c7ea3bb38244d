//! Bid entity - Append-only record of bids per auction round.
//!
//! Bids are never updated or deleted. The winning bid of a round is the most
//! recently created one, not the highest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bid database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bids")]
pub struct Model {
    /// Unique identifier for the bid
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Round the bid was placed in
    pub auction_account_id: Option<i64>,
    /// Group the bid was placed in
    pub group_id: i64,
    /// Bidding share
    pub share_id: i64,
    /// User behind the bidding share at the time of the bid
    pub user_id: Option<i64>,
    /// Bid amount
    pub amount: f64,
    /// When the bid was placed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Bid and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bid belongs to one round
    #[sea_orm(
        belongs_to = "super::auction_account::Entity",
        from = "Column::AuctionAccountId",
        to = "super::auction_account::Column::Id"
    )]
    AuctionAccount,
}

impl Related<super::auction_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuctionAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
