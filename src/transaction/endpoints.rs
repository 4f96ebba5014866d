//! Endpoints for creating, listing, updating and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, Error, UserID,
    auth::Identity,
    category::{Category, CategoryId, get_category_by_name},
    db::lock_connection,
    iso_date,
    timezone::local_today,
    transaction::core::{
        Transaction, TransactionId, TransactionQuery, create_transaction, delete_transaction,
        get_transaction, query_transactions, update_transaction, validate_amount,
    },
};

/// The state needed for the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The data for creating a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    /// The amount of money, at least one cent.
    pub amount: Decimal,
    /// When the transaction happened, today or earlier.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The name of one of the user's categories.
    pub category: String,
    /// What the transaction was for.
    #[serde(default)]
    pub description: Option<String>,
}

/// The fields of a transaction that can be changed. The date cannot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdateData {
    /// The new amount.
    pub amount: Option<Decimal>,
    /// The name of the new category.
    pub category: Option<String>,
    /// The new description.
    pub description: Option<String>,
}

/// The query parameters for filtering the transaction list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// The earliest date to include. Ignored without `endDate`.
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    /// The latest date to include. Ignored without `startDate`.
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    /// Only include this category.
    pub category_id: Option<CategoryId>,
    /// Only include the category with this name, unless `categoryId` is given.
    pub category: Option<String>,
}

impl From<TransactionFilter> for TransactionQuery {
    fn from(filter: TransactionFilter) -> Self {
        Self {
            date_range: filter.start_date.zip(filter.end_date),
            category_id: filter.category_id,
            category_name: filter.category,
        }
    }
}

fn find_category(name: &str, user_id: UserID, connection: &Connection) -> Result<Category, Error> {
    get_category_by_name(name, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::CategoryNotFound(name.to_owned()),
        error => error,
    })
}

/// Get the transaction `id` if it belongs to `user_id`.
fn get_owned_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    if transaction.user_id != user_id {
        tracing::warn!("User {user_id} tried to access transaction {id} of another user");
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Record a new transaction for the current user.
///
/// # Errors
///
/// Responds with 400 Bad Request if the amount is below one cent or the date
/// is in the future, and 404 Not Found if the category does not exist.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    identity: Identity,
    Json(data): Json<TransactionData>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let amount = validate_amount(data.amount)?;

    if data.date > local_today(&state.local_timezone)? {
        return Err(Error::FutureDate(data.date));
    }

    let connection = lock_connection(&state.db_connection)?;
    let category = find_category(&data.category, identity.user_id, &connection)?;
    let transaction = create_transaction(amount, data.date, &category, data.description, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List the current user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    identity: Identity,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    query_transactions(identity.user_id, &filter.into(), &connection).map(Json)
}

/// Change the amount, category or description of a transaction.
///
/// # Errors
///
/// Responds with 404 Not Found if the transaction or new category does not
/// exist, and 403 Forbidden if the transaction belongs to another user.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    identity: Identity,
    Path(transaction_id): Path<TransactionId>,
    Json(data): Json<TransactionUpdateData>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = get_owned_transaction(transaction_id, identity.user_id, &connection)?;

    let amount = match data.amount {
        Some(amount) => validate_amount(amount)?,
        None => transaction.amount,
    };
    let category_id = match data.category {
        Some(name) => find_category(&name, identity.user_id, &connection)?.id,
        None => transaction.category_id,
    };
    let description = data.description.or(transaction.description);

    update_transaction(
        transaction_id,
        amount,
        category_id,
        description.as_deref(),
        &connection,
    )?;

    get_transaction(transaction_id, &connection).map(Json)
}

/// Delete one of the current user's transactions.
///
/// # Errors
///
/// Responds with 404 Not Found if the transaction does not exist, and 403
/// Forbidden if it belongs to another user.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    identity: Identity,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_owned_transaction(transaction_id, identity.user_id, &connection)?;

    delete_transaction(transaction_id, &connection)?;

    Ok(Json(json!({ "message": "Transaction deleted successfully" })))
}
