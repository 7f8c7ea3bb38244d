//! Settlement calculator - pure functions for the money math of a closed round.
//!
//! Given the winning bid and the group's configuration and shares, computes
//! the commission split, the winner's discount, the per-person profit, each
//! member's proportional due and the split of the discount across the
//! co-owners of the winning slot. Intermediate values are kept unrounded;
//! [`round2`] is applied where results are persisted.

use crate::{
    core::group::MemberShare,
    errors::{Error, Result},
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a currency value to cents, half up (toward positive infinity).
///
/// Rounding happens on the shortest decimal form of `value`, so `1.005`
/// becomes `1.01` and `-0.125` becomes `-0.12`. Values outside the decimal
/// range fall back to binary rounding.
#[must_use]
pub fn round2(value: f64) -> f64 {
    let Ok(exact) = value.to_string().parse::<Decimal>() else {
        return (value * 100.0).round() / 100.0;
    };

    let strategy = if exact.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    exact
        .round_dp_with_strategy(2, strategy)
        .to_f64()
        .unwrap_or(value)
}

/// Round-level amounts of a settlement with a winner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// Winning bid amount
    pub auction_amount: f64,
    /// Operator commission
    pub commission: f64,
    /// Pool amount minus winning bid; no payout when not positive
    pub cash_to_customer: f64,
    /// Winning bid minus commission
    pub balance: f64,
    /// Balance per configured member
    pub profit_per_person: f64,
}

impl Settlement {
    /// Copy with every amount rounded to cents, as persisted
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            auction_amount: round2(self.auction_amount),
            commission: round2(self.commission),
            cash_to_customer: round2(self.cash_to_customer),
            balance: round2(self.balance),
            profit_per_person: round2(self.profit_per_person),
        }
    }

    /// Whether the winning slot is owed a payout
    #[must_use]
    pub fn has_payout(&self) -> bool {
        self.cash_to_customer > 0.0
    }
}

fn ensure_finite(amount: f64) -> Result<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Computes the round-level settlement for a winning bid.
///
/// `profit_per_person` divides by the configured member count, not by the
/// number of shares actually present.
pub fn compute_settlement(
    pool_amount: f64,
    commission: f64,
    number_of_members: i32,
    winning_amount: f64,
) -> Result<Settlement> {
    let pool_amount = ensure_finite(pool_amount)?;
    let commission = ensure_finite(commission)?;
    let auction_amount = ensure_finite(winning_amount)?;

    if number_of_members <= 0 {
        return Err(Error::InvariantViolation {
            message: format!("number_of_members must be positive, got {number_of_members}"),
        });
    }

    let balance = auction_amount - commission;
    Ok(Settlement {
        auction_amount,
        commission,
        cash_to_customer: pool_amount - auction_amount,
        balance,
        profit_per_person: balance / f64::from(number_of_members),
    })
}

/// One member's due for a settled round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DueLine {
    /// Share the due is computed for
    pub share_id: i64,
    /// Member who owes
    pub user_id: i64,
    /// Fraction of a full unit the share represents
    pub fraction: f64,
    /// Amount owed, rounded to cents
    pub due_amount: f64,
}

/// All dues of a settled round
#[derive(Debug, Clone, PartialEq)]
pub struct DueSchedule {
    /// Sum of fractions across the participating shares, or the member-count fallback
    pub total_share_units: f64,
    /// Due for one full share before rounding
    pub due_per_full_unit: f64,
    /// Per-share dues
    pub lines: Vec<DueLine>,
}

impl DueSchedule {
    /// Sum of the rounded dues
    #[must_use]
    pub fn total_due(&self) -> f64 {
        self.lines.iter().map(|l| l.due_amount).sum()
    }
}

/// Fraction of a full unit a share holds; non-positive percentages count as a full unit.
#[must_use]
pub fn share_fraction(share_percent: f64) -> f64 {
    if share_percent > 0.0 {
        share_percent / 100.0
    } else {
        1.0
    }
}

/// Computes each participating member's due, net of the per-person profit.
///
/// Only active/accepted shares with a user take part. The unit count falls back
/// to the configured member count when no share contributes a fraction.
pub fn compute_dues(
    pool_amount: f64,
    profit_per_person: f64,
    number_of_members: i32,
    shares: &[MemberShare],
) -> Result<DueSchedule> {
    let participants: Vec<(&MemberShare, i64, f64)> = shares
        .iter()
        .filter(|s| s.status.is_participating())
        .filter_map(|s| s.user_id.map(|uid| (s, uid, share_fraction(s.share_percent))))
        .collect();

    let summed: f64 = participants.iter().map(|(_, _, f)| f).sum();
    let total_share_units = if summed > 0.0 {
        summed
    } else {
        f64::from(number_of_members)
    };

    if total_share_units <= 0.0 || !total_share_units.is_finite() {
        return Err(Error::InvariantViolation {
            message: format!("total share units resolved to {total_share_units}"),
        });
    }

    let due_per_full_unit = (pool_amount / total_share_units - profit_per_person).max(0.0);

    let lines = participants
        .into_iter()
        .map(|(share, user_id, fraction)| DueLine {
            share_id: share.share_id,
            user_id,
            fraction,
            due_amount: round2(due_per_full_unit * fraction),
        })
        .collect();

    Ok(DueSchedule {
        total_share_units,
        due_per_full_unit,
        lines,
    })
}

/// One co-owner's part of the winner's discount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutLine {
    /// Co-owned share, None for the direct fallback
    pub share_id: Option<i64>,
    /// Member being paid
    pub user_id: i64,
    /// Amount, rounded to cents
    pub amount: f64,
}

/// Splits the discount across the co-owners of the winning slot by `share_percent`.
///
/// Co-owners without a user are skipped. The denominator is the sum of the
/// co-owners' percentages, or 100 when that sum is zero. Non-positive splits are dropped.
#[must_use]
pub fn split_payout(cash_to_customer: f64, co_owners: &[MemberShare]) -> Vec<PayoutLine> {
    if cash_to_customer <= 0.0 {
        return Vec::new();
    }

    let owners: Vec<(&MemberShare, i64)> = co_owners
        .iter()
        .filter_map(|s| s.user_id.map(|uid| (s, uid)))
        .collect();

    let percent_sum: f64 = owners.iter().map(|(s, _)| s.share_percent).sum();
    let denominator = if percent_sum > 0.0 { percent_sum } else { 100.0 };

    owners
        .into_iter()
        .map(|(share, user_id)| PayoutLine {
            share_id: Some(share.share_id),
            user_id,
            amount: round2(cash_to_customer * share.share_percent / denominator),
        })
        .filter(|line| line.amount > 0.0)
        .collect()
}
