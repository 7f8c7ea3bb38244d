//! Share entity - A member's percentage of one numbered slot in a group.
//!
//! Co-owners of the same slot share a `share_no`. A share has no user while
//! its invite is pending. The auction engine reads shares but never writes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invite/membership status of a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    /// Invite sent, not answered
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Invite accepted
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Participating member
    #[sea_orm(string_value = "active")]
    Active,
    /// Invite declined; ignored everywhere
    #[sea_orm(string_value = "declined")]
    Declined,
}

impl ShareStatus {
    /// Whether the share takes part in settlement (active or accepted)
    #[must_use]
    pub const fn is_participating(self) -> bool {
        matches!(self, Self::Active | Self::Accepted)
    }
}

/// Share database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shares")]
pub struct Model {
    /// Unique identifier for the share
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning group
    pub group_id: i64,
    /// Owning user, None while the invite is pending
    pub user_id: Option<i64>,
    /// Slot number; co-owners of a slot share it
    pub share_no: i32,
    /// Percentage of the slot held, in (0, 100]
    pub share_percent: f64,
    /// Periodic contribution for this share
    pub contribution_amount: f64,
    /// Membership status
    pub status: ShareStatus,
}

/// Defines relationships between Share and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each share belongs to one group
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
