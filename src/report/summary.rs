//! Per-category totals over a period of time.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Month};

use crate::{Error, category::TransactionType, transaction::Transaction};

/// Income and expenses summed by category name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    /// The income per category, ordered by category name.
    pub total_income: BTreeMap<String, Decimal>,
    /// The expenses per category, ordered by category name.
    pub total_expenses: BTreeMap<String, Decimal>,
    /// All income minus all expenses.
    pub net_savings: Decimal,
}

/// Sum `transactions` by category, split into income and expenses.
pub fn summarize(transactions: &[Transaction]) -> CategoryTotals {
    let mut totals = CategoryTotals::default();

    for transaction in transactions {
        let category_totals = match transaction.transaction_type {
            TransactionType::Income => {
                totals.net_savings += transaction.amount;
                &mut totals.total_income
            }
            TransactionType::Expense => {
                totals.net_savings -= transaction.amount;
                &mut totals.total_expenses
            }
        };

        *category_totals
            .entry(transaction.category_name.to_string())
            .or_default() += transaction.amount;
    }

    totals
}

/// The first and last day of `month` in `year`.
///
/// # Errors
///
/// Returns [Error::InvalidMonth] if `month` is not between 1 and 12, and
/// [Error::InvalidYear] if the year is out of range.
pub fn month_range(year: i32, month: u8) -> Result<(Date, Date), Error> {
    let calendar_month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;
    let last_day = calendar_month.length(year);

    let start = Date::from_calendar_date(year, calendar_month, 1)
        .map_err(|_| Error::InvalidYear(year))?;
    let end = Date::from_calendar_date(year, calendar_month, last_day)
        .map_err(|_| Error::InvalidYear(year))?;

    Ok((start, end))
}

/// The first and last day of `year`.
///
/// # Errors
///
/// Returns [Error::InvalidYear] if the year is out of range.
pub fn year_range(year: i32) -> Result<(Date, Date), Error> {
    let start =
        Date::from_calendar_date(year, Month::January, 1).map_err(|_| Error::InvalidYear(year))?;
    let end =
        Date::from_calendar_date(year, Month::December, 31).map_err(|_| Error::InvalidYear(year))?;

    Ok((start, end))
}
