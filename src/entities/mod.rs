//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod auction_account;
pub mod bid;
pub mod group;
pub mod payable;
pub mod receivable;
pub mod share;

// Re-export specific types to avoid conflicts
pub use auction_account::{
    AuctionStatus, Column as AuctionAccountColumn, Entity as AuctionAccount,
    Model as AuctionAccountModel,
};
pub use bid::{Column as BidColumn, Entity as Bid, Model as BidModel};
pub use group::{Column as GroupColumn, Entity as Group, GroupStatus, Model as GroupModel};
pub use payable::{Column as PayableColumn, Entity as Payable, Model as PayableModel};
pub use receivable::{
    Column as ReceivableColumn, Entity as Receivable, Model as ReceivableModel,
    ReceivableStatus,
};
pub use share::{Column as ShareColumn, Entity as Share, Model as ShareModel, ShareStatus};
