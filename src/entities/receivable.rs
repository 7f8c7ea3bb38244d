//! Receivable entity - Money a member owes the pool after a round settles.
//!
//! Derived, not accumulated: every close of a round deletes and regenerates
//! the receivables tied to that round.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collection status of a receivable
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum ReceivableStatus {
    /// Not yet paid
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Paid
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Past due
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

/// Receivable database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receivables")]
pub struct Model {
    /// Unique identifier for the receivable
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group the money is owed to
    pub group_id: i64,
    /// Round that produced this receivable
    pub auction_account_id: i64,
    /// Member who owes
    pub user_id: i64,
    /// Share the due is computed for
    pub share_id: i64,
    /// Amount owed, rounded to cents
    pub due_amount: f64,
    /// Collection status
    pub status: ReceivableStatus,
    /// When the receivable was generated
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Receivable and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each receivable belongs to one round
    #[sea_orm(
        belongs_to = "super::auction_account::Entity",
        from = "Column::AuctionAccountId",
        to = "super::auction_account::Column::Id",
        on_delete = "Cascade"
    )]
    AuctionAccount,
}

impl Related<super::auction_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuctionAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
