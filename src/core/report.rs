//! Settlement reporting.
//!
//! Read-only queries over settled rounds, plus the summary text logged when a
//! round settles. All functions are framework-agnostic and return structured
//! data or plain strings.

use crate::{
    core::auction::SettledRound,
    entities::{
        AuctionAccount, Payable, Receivable, ReceivableStatus, auction_account, payable, receivable,
    },
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*};

/// Dues still to be collected from one member
#[derive(Debug, Clone, PartialEq)]
pub struct OutstandingDues {
    /// Member
    pub user_id: i64,
    /// Pending and overdue receivables, oldest first
    pub receivables: Vec<receivable::Model>,
    /// Sum of their due amounts
    pub total: f64,
}

/// All rounds of a group, newest first.
pub async fn list_auctions_for_group(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Vec<auction_account::Model>> {
    AuctionAccount::find()
        .filter(auction_account::Column::GroupId.eq(group_id))
        .order_by_desc(auction_account::Column::OpenedAt)
        .order_by_desc(auction_account::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Receivables generated by one round.
pub async fn receivables_for_account(
    db: &DatabaseConnection,
    auction_account_id: i64,
) -> Result<Vec<receivable::Model>> {
    Receivable::find()
        .filter(receivable::Column::AuctionAccountId.eq(auction_account_id))
        .order_by_asc(receivable::Column::ShareId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total amount due across one round's receivables.
pub async fn receivables_total_for_account(
    db: &DatabaseConnection,
    auction_account_id: i64,
) -> Result<f64> {
    let receivables = receivables_for_account(db, auction_account_id).await?;
    Ok(receivables.iter().map(|r| r.due_amount).sum())
}

/// Payables owed by a group, oldest first.
pub async fn payables_for_group(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Vec<payable::Model>> {
    Payable::find()
        .filter(payable::Column::GroupId.eq(group_id))
        .order_by_asc(payable::Column::CreatedAt)
        .order_by_asc(payable::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Payables owed to a member across all groups, oldest first.
pub async fn payables_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<payable::Model>> {
    Payable::find()
        .filter(payable::Column::UserId.eq(user_id))
        .order_by_asc(payable::Column::CreatedAt)
        .order_by_asc(payable::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Pending and overdue receivables of a member across all groups.
pub async fn outstanding_dues_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<OutstandingDues> {
    let receivables = Receivable::find()
        .filter(receivable::Column::UserId.eq(user_id))
        .filter(
            receivable::Column::Status
                .is_in([ReceivableStatus::Pending, ReceivableStatus::Overdue]),
        )
        .order_by_asc(receivable::Column::CreatedAt)
        .order_by_asc(receivable::Column::Id)
        .all(db)
        .await?;

    let total = receivables.iter().map(|r| r.due_amount).sum();
    Ok(OutstandingDues {
        user_id,
        receivables,
        total,
    })
}

/// Formats a settled round into a human-readable summary for logs.
#[must_use]
pub fn format_settlement_summary(round: &SettledRound) -> String {
    use std::fmt::Write;

    let s = &round.settlement;
    let mut summary = format!(
        "Settlement - {} (round {}) - winning share {} at {:.2}\n",
        round.event.group_name, round.account.id, round.winning_bid.share_id, s.auction_amount
    );

    // write! into a String cannot fail
    let _ = writeln!(
        summary,
        "  Commission: {:.2} | Balance: {:.2} | Profit/person: {:.2} | Cash to customer: {:.2}",
        s.commission, s.balance, s.profit_per_person, s.cash_to_customer
    );
    let _ = writeln!(
        summary,
        "  Next auction: {}",
        round.next_auction_date.format("%Y-%m-%d %H:%M UTC")
    );

    for r in &round.receivables {
        let _ = writeln!(
            summary,
            "  Due   user {} (share {}): {:.2}",
            r.user_id, r.share_id, r.due_amount
        );
    }
    for p in &round.payables {
        let _ = writeln!(summary, "  Payout user {}: {:.2}", p.user_id, p.amount);
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::auction::{CloseOutcome, close_auction};
    use crate::test_utils::*;
    use chrono::Utc;

    async fn settled_group(
        db: &DatabaseConnection,
        name: &str,
    ) -> Result<(crate::entities::GroupModel, SettledRound)> {
        let group = create_test_group(db, name).await?;
        let shares = add_full_members(db, group.id, 10).await?;
        let round = open_test_round(db, group.id).await?;
        place_test_bid(db, group.id, shares[2].id, 95_000.0, Utc::now()).await?;
        let CloseOutcome::Settled(settled) = close_auction(db, round.id, Utc::now()).await? else {
            panic!("expected a settled round");
        };
        Ok((group, *settled))
    }

    #[tokio::test]
    async fn test_history_and_ledgers() -> Result<()> {
        let db = setup_test_db().await?;
        let (group, settled) = settled_group(&db, "Ledger").await?;

        let history = list_auctions_for_group(&db, group.id).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, settled.account.id);

        let receivables = receivables_for_account(&db, settled.account.id).await?;
        assert_eq!(receivables.len(), 10);
        assert_close(
            receivables_total_for_account(&db, settled.account.id).await?,
            7_000.0,
        );

        let group_payables = payables_for_group(&db, group.id).await?;
        assert_eq!(group_payables.len(), 1);

        let winner_user = settled.winning_bid.user_id.unwrap();
        let user_payables = payables_for_user(&db, winner_user).await?;
        assert_eq!(user_payables.len(), 1);
        assert_close(user_payables[0].amount, 5_000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_outstanding_dues_ignore_paid() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, settled) = settled_group(&db, "Dues").await?;
        let user_id = settled.receivables[0].user_id;

        let dues = outstanding_dues_for_user(&db, user_id).await?;
        assert_eq!(dues.receivables.len(), 1);
        assert_close(dues.total, 700.0);

        let mut paid: receivable::ActiveModel = settled.receivables[0].clone().into();
        paid.status = sea_orm::Set(ReceivableStatus::Paid);
        sea_orm::ActiveModelTrait::update(paid, &db).await?;

        let dues = outstanding_dues_for_user(&db, user_id).await?;
        assert!(dues.receivables.is_empty());
        assert_close(dues.total, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_format_settlement_summary() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, settled) = settled_group(&db, "Summary").await?;

        let summary = format_settlement_summary(&settled);
        assert!(summary.contains("Settlement - Summary"));
        assert!(summary.contains("at 95000.00"));
        assert!(summary.contains("Balance: 93000.00"));
        assert!(summary.contains("Profit/person: 9300.00"));
        assert!(summary.contains("Cash to customer: 5000.00"));
        assert!(summary.contains(": 700.00"));
        assert!(summary.contains("Payout user"));
        Ok(())
    }
}
