//! Database configuration module.
//!
//! Handles the database connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions with `Schema::create_table_from_entity`
//! so the schema always matches the Rust models. Creation is idempotent, so the
//! bootstrap can run on every start.

use crate::entities::{AuctionAccount, Bid, Group, Payable, Receivable, Share};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Default database location when neither settings nor environment provide one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://chit_auction.sqlite?mode=rwc";

/// Storage-level guard for the single-open-round invariant.
const ONE_OPEN_AUCTION_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_one_open_auction_per_group \
     ON auction_accounts (group_id) WHERE status = 'open'";

/// Establishes a connection to the database at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (parents before children) and the open-round index.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Group).await?;
    create_table(db, &schema, Share).await?;
    create_table(db, &schema, AuctionAccount).await?;
    create_table(db, &schema, Bid).await?;
    create_table(db, &schema, Receivable).await?;
    create_table(db, &schema, Payable).await?;

    db.execute_unprepared(ONE_OPEN_AUCTION_INDEX).await?;

    info!("Database tables ensured.");
    Ok(())
}
