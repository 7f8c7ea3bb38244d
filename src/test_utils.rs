//! Shared test utilities for the auction engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating groups, shares, rounds and bids with sensible defaults.

use crate::{
    core::{auction, bid},
    entities::{self, GroupStatus, ShareStatus, auction_account, group, share},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Asserts two money amounts agree to the cent.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.005,
        "expected {expected}, got {actual}"
    );
}

/// Parameters for [`create_custom_group`].
///
/// # Defaults
/// * `amount`: 100000.0
/// * `commission`: 2000.0
/// * `number_of_members`: 10
/// * `frequency`: "monthly"
/// * `status`: new
/// * auction window: one hour either side of now
#[derive(Debug, Clone)]
pub struct TestGroupArgs {
    pub name: String,
    pub amount: f64,
    pub commission: f64,
    pub number_of_members: i32,
    pub frequency: Option<String>,
    pub status: GroupStatus,
    pub auction_start_at: Option<DateTime<Utc>>,
    pub auction_end_at: Option<DateTime<Utc>>,
    pub next_auction_date: Option<DateTime<Utc>>,
}

impl TestGroupArgs {
    /// Defaults with the given name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for TestGroupArgs {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: "Test Group".to_string(),
            amount: 100_000.0,
            commission: 2_000.0,
            number_of_members: 10,
            frequency: Some("monthly".to_string()),
            status: GroupStatus::New,
            auction_start_at: Some(now - Duration::hours(1)),
            auction_end_at: Some(now + Duration::hours(1)),
            next_auction_date: None,
        }
    }
}

/// Creates a group with custom parameters.
pub async fn create_custom_group(
    db: &DatabaseConnection,
    args: TestGroupArgs,
) -> Result<entities::group::Model> {
    group::ActiveModel {
        name: Set(args.name),
        amount: Set(args.amount),
        status: Set(args.status),
        number_of_members: Set(args.number_of_members),
        commission: Set(args.commission),
        frequency: Set(args.frequency),
        auction_start_at: Set(args.auction_start_at),
        auction_end_at: Set(args.auction_end_at),
        next_auction_date: Set(args.next_auction_date),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a group with sensible defaults and an auction window around now.
pub async fn create_test_group(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::group::Model> {
    create_custom_group(db, TestGroupArgs::named(name)).await
}

/// Adds one share to a group. Contribution is fixed at 10000.0.
pub async fn add_share(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: Option<i64>,
    share_no: i32,
    share_percent: f64,
    status: ShareStatus,
) -> Result<entities::share::Model> {
    share::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
        share_no: Set(share_no),
        share_percent: Set(share_percent),
        contribution_amount: Set(10_000.0),
        status: Set(status),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Adds `count` active full shares numbered 1..=count, owned by users 101, 102, ...
pub async fn add_full_members(
    db: &DatabaseConnection,
    group_id: i64,
    count: i32,
) -> Result<Vec<entities::share::Model>> {
    let mut shares = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    for i in 1..=count {
        let user_id = 100 + i64::from(i);
        shares.push(add_share(db, group_id, Some(user_id), i, 100.0, ShareStatus::Active).await?);
    }
    Ok(shares)
}

/// Opens a round for the group now and returns it.
pub async fn open_test_round(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<auction_account::Model> {
    auction::open_auction(db, group_id, Utc::now()).await?;
    bid::open_round_for_group(db, group_id)
        .await?
        .ok_or(Error::NoOpenAuction { group_id })
}

/// Places a bid at an explicit time.
pub async fn place_test_bid(
    db: &DatabaseConnection,
    group_id: i64,
    share_id: i64,
    amount: f64,
    placed_at: DateTime<Utc>,
) -> Result<entities::bid::Model> {
    bid::place_bid(db, group_id, share_id, amount, placed_at).await
}
