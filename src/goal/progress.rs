//! Progress towards a savings goal, derived from the owner's transactions.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    Error,
    category::TransactionType,
    goal::SavingsGoal,
    transaction::Transaction,
};

/// How far a user is towards a savings goal.
///
/// Never stored, it is calculated again every time a goal is read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// Income minus expenses since the goal started. May be negative.
    pub current_progress: Decimal,
    /// The progress as a percentage of the target, rounded to two decimal
    /// places. Zero when there is no progress, and above 100 when the target
    /// has been exceeded.
    pub progress_percentage: Decimal,
    /// The target minus the progress. Negative once the target is exceeded.
    pub remaining_amount: Decimal,
}

/// Calculate the progress towards `goal` from the owner's `transactions`.
///
/// Only transactions dated on or after the goal's start date count.
///
/// # Errors
///
/// Returns [Error::InvalidGoalState] if the goal's target is not positive.
pub fn calculate_progress(
    goal: &SavingsGoal,
    transactions: &[Transaction],
) -> Result<GoalProgress, Error> {
    let target_amount = goal.target_amount;

    if target_amount <= Decimal::ZERO {
        return Err(Error::InvalidGoalState(target_amount));
    }

    let since_start = || {
        transactions
            .iter()
            .filter(|transaction| transaction.date >= goal.start_date)
    };

    let income: Decimal = since_start()
        .filter(|transaction| transaction.transaction_type == TransactionType::Income)
        .map(|transaction| transaction.amount)
        .sum();
    let expense: Decimal = since_start()
        .filter(|transaction| transaction.transaction_type == TransactionType::Expense)
        .map(|transaction| transaction.amount)
        .sum();

    let current_progress = income - expense;

    let progress_percentage = if current_progress > Decimal::ZERO {
        let ratio = current_progress
            .checked_div(target_amount)
            .ok_or(Error::InvalidGoalState(target_amount))?
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);

        ratio
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(Error::InvalidGoalState(target_amount))?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    };

    Ok(GoalProgress {
        current_progress,
        progress_percentage,
        remaining_amount: target_amount - current_progress,
    })
}
