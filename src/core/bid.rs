//! Bid ledger - append-only bids per auction round.
//!
//! Bids are only ever inserted. The winning bid of a round is the most
//! recently created one (ties on the timestamp go to the later insert), which
//! is deliberately not the same as the highest bid.

use crate::{
    entities::{AuctionAccount, AuctionStatus, Bid, Share, ShareStatus, auction_account, bid},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// Records a bid from `share_id` against the group's open round.
///
/// Rejects non-finite or non-positive amounts, shares that are not part of the
/// group (or declined), and groups without an open round.
#[instrument(skip(db))]
pub async fn place_bid<C>(
    db: &C,
    group_id: i64,
    share_id: i64,
    amount: f64,
    placed_at: DateTime<Utc>,
) -> Result<bid::Model>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let share = Share::find_by_id(share_id)
        .one(db)
        .await?
        .filter(|s| s.group_id == group_id && s.status != ShareStatus::Declined)
        .ok_or(Error::ShareNotFound { id: share_id })?;

    let round = open_round_for_group(db, group_id)
        .await?
        .ok_or(Error::NoOpenAuction { group_id })?;

    let bid = bid::ActiveModel {
        auction_account_id: Set(Some(round.id)),
        group_id: Set(group_id),
        share_id: Set(share.id),
        user_id: Set(share.user_id),
        amount: Set(amount),
        created_at: Set(placed_at),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(bid_id = bid.id, round_id = round.id, "Bid recorded");
    Ok(bid)
}

/// The open round of a group, if any.
pub async fn open_round_for_group<C>(
    db: &C,
    group_id: i64,
) -> Result<Option<auction_account::Model>>
where
    C: ConnectionTrait,
{
    AuctionAccount::find()
        .filter(auction_account::Column::GroupId.eq(group_id))
        .filter(auction_account::Column::Status.eq(AuctionStatus::Open))
        .one(db)
        .await
        .map_err(Into::into)
}

/// The winning bid of a round: the latest by creation time, then by id.
pub async fn winning_bid<C>(db: &C, auction_account_id: i64) -> Result<Option<bid::Model>>
where
    C: ConnectionTrait,
{
    Bid::find()
        .filter(bid::Column::AuctionAccountId.eq(auction_account_id))
        .order_by_desc(bid::Column::CreatedAt)
        .order_by_desc(bid::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All bids of a round in the order they were placed.
pub async fn bids_for_account<C>(db: &C, auction_account_id: i64) -> Result<Vec<bid::Model>>
where
    C: ConnectionTrait,
{
    Bid::find()
        .filter(bid::Column::AuctionAccountId.eq(auction_account_id))
        .order_by_asc(bid::Column::CreatedAt)
        .order_by_asc(bid::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_place_bid_amount_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Validation").await?;
        let share = add_share(&db, group.id, Some(1), 1, 100.0, ShareStatus::Active).await?;
        open_test_round(&db, group.id).await?;

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = place_bid(&db, group.id, share.id, amount, Utc::now()).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }
        assert_eq!(Bid::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_place_bid_without_open_round() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Closed Window").await?;
        let share = add_share(&db, group.id, Some(1), 1, 100.0, ShareStatus::Active).await?;

        let result = place_bid(&db, group.id, share.id, 90_000.0, Utc::now()).await;
        assert!(matches!(
            result,
            Err(Error::NoOpenAuction { group_id }) if group_id == group.id
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_bid_rejects_foreign_and_declined_shares() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Home").await?;
        let other = create_test_group(&db, "Away").await?;
        open_test_round(&db, group.id).await?;

        let foreign = add_share(&db, other.id, Some(1), 1, 100.0, ShareStatus::Active).await?;
        let declined = add_share(&db, group.id, Some(2), 2, 100.0, ShareStatus::Declined).await?;

        let result = place_bid(&db, group.id, foreign.id, 90_000.0, Utc::now()).await;
        assert!(matches!(result, Err(Error::ShareNotFound { .. })));

        let result = place_bid(&db, group.id, declined.id, 90_000.0, Utc::now()).await;
        assert!(matches!(result, Err(Error::ShareNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_last_bid_wins_not_highest() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Last Wins").await?;
        let round = open_test_round(&db, group.id).await?;
        let a = add_share(&db, group.id, Some(1), 1, 100.0, ShareStatus::Active).await?;
        let b = add_share(&db, group.id, Some(2), 2, 100.0, ShareStatus::Active).await?;

        let t0 = Utc::now();
        place_bid(&db, group.id, a.id, 95_000.0, t0).await?;
        place_bid(&db, group.id, b.id, 80_000.0, t0 + chrono::Duration::seconds(5)).await?;

        let winner = winning_bid(&db, round.id).await?.unwrap();
        assert_eq!(winner.share_id, b.id);
        assert_eq!(winner.user_id, Some(2));

        let all = bids_for_account(&db, round.id).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].share_id, a.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_same_timestamp_later_insert_wins() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Tie").await?;
        let round = open_test_round(&db, group.id).await?;
        let a = add_share(&db, group.id, Some(1), 1, 100.0, ShareStatus::Active).await?;

        let t = Utc::now();
        place_bid(&db, group.id, a.id, 91_000.0, t).await?;
        let second = place_bid(&db, group.id, a.id, 92_000.0, t).await?;

        let winner = winning_bid(&db, round.id).await?.unwrap();
        assert_eq!(winner.id, second.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_winning_bid_none_without_bids() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Quiet").await?;
        let round = open_test_round(&db, group.id).await?;

        assert!(winning_bid(&db, round.id).await?.is_none());
        Ok(())
    }
}
