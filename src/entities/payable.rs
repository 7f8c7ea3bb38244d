//! Payable entity - Money the pool owes a member.
//!
//! Created once per co-owner of the winning slot when a round settles with a
//! positive discount. Never regenerated for an already settled round.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payable database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payables")]
pub struct Model {
    /// Unique identifier for the payable
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group paying out
    pub group_id: i64,
    /// Round that produced this payable
    pub auction_account_id: Option<i64>,
    /// Member being paid
    pub user_id: i64,
    /// Co-owned share the split was computed for, None for the direct fallback
    pub share_id: Option<i64>,
    /// Amount owed to the member, rounded to cents
    pub amount: f64,
    /// When the payable was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Payable and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payable belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
