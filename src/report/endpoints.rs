//! Endpoints for the monthly and yearly reports.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::Identity,
    db::lock_connection,
    report::summary::{CategoryTotals, month_range, summarize, year_range},
    transaction::get_transactions_in_range,
};

/// The state needed for the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    month: u8,
    year: i32,
    #[serde(flatten)]
    totals: CategoryTotals,
}

/// The totals for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyReport {
    year: i32,
    #[serde(flatten)]
    totals: CategoryTotals,
}

/// Summarize the current user's transactions in one calendar month.
///
/// # Errors
///
/// Responds with 400 Bad Request if the month is not between 1 and 12.
pub async fn get_monthly_report_endpoint(
    State(state): State<ReportState>,
    identity: Identity,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<MonthlyReport>, Error> {
    let (start, end) = month_range(year, month)?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = get_transactions_in_range(identity.user_id, start, end, &connection)?;

    Ok(Json(MonthlyReport {
        month,
        year,
        totals: summarize(&transactions),
    }))
}

/// Summarize the current user's transactions in one calendar year.
pub async fn get_yearly_report_endpoint(
    State(state): State<ReportState>,
    identity: Identity,
    Path(year): Path<i32>,
) -> Result<Json<YearlyReport>, Error> {
    let (start, end) = year_range(year)?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = get_transactions_in_range(identity.user_id, start, end, &connection)?;

    Ok(Json(YearlyReport {
        year,
        totals: summarize(&transactions),
    }))
}
