//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, named_params};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName, TransactionType},
    db::get_decimal,
    iso_date,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned, at least one cent.
    pub amount: Decimal,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The name of the category the transaction belongs to.
    #[serde(rename = "category")]
    pub category_name: CategoryName,
    /// Whether the transaction is income or an expense, taken from its category.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The user that owns the transaction.
    #[serde(skip)]
    pub user_id: UserID,
}

/// The smallest amount a transaction may have.
pub const MINIMUM_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Check that `amount` is at least one cent.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] for smaller amounts.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount < MINIMUM_AMOUNT {
        Err(Error::InvalidAmount)
    } else {
        Ok(amount)
    }
}

/// The filters for listing transactions.
///
/// A category ID takes precedence over a category name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Only include transactions between these dates, inclusive.
    pub date_range: Option<(Date, Date)>,
    /// Only include transactions in the category with this ID.
    pub category_id: Option<CategoryId>,
    /// Only include transactions in the category with this name.
    pub category_name: Option<String>,
}

/// Provides all the transactions of a user.
pub trait TransactionLister {
    /// Get every transaction owned by `user_id`, in no particular order.
    fn list_for_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;
}

impl TransactionLister for Connection {
    fn list_for_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        query_transactions(user_id, &TransactionQuery::default(), self)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_TRANSACTION: &str = "SELECT t.id, t.amount, t.date, t.category_id, c.name, c.type, t.description, t.user_id
    FROM \"transaction\" t
    INNER JOIN category c ON c.id = t.category_id";

/// Create a new transaction in `category` for the category's owner.
///
/// The caller should validate the amount and date beforehand.
pub fn create_transaction(
    amount: Decimal,
    date: Date,
    category: &Category,
    description: Option<String>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection.execute(
        "INSERT INTO \"transaction\" (amount, date, description, category_id, user_id)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            amount.to_string(),
            date,
            &description,
            category.id,
            category.user_id.as_i64(),
        ),
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        amount,
        date,
        category_id: category.id,
        category_name: category.name.clone(),
        transaction_type: category.transaction_type,
        description,
        user_id: category.user_id,
    })
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a transaction.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE t.id = :id"))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve the transactions of `user_id` that match `query`, newest first.
pub fn query_transactions(
    user_id: UserID,
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (start_date, end_date) = query.date_range.unzip();

    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION}
            WHERE t.user_id = :user_id
            AND (:start_date IS NULL OR t.date BETWEEN :start_date AND :end_date)
            AND (:category_id IS NULL OR t.category_id = :category_id)
            AND (:category_id IS NOT NULL OR :category_name IS NULL OR c.name = :category_name)
            ORDER BY t.date DESC, t.id DESC"
        ))?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":start_date": start_date,
                ":end_date": end_date,
                ":category_id": query.category_id,
                ":category_name": query.category_name,
            },
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the transactions of `user_id` dated between `start` and `end`, inclusive.
pub fn get_transactions_in_range(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = TransactionQuery {
        date_range: Some((start, end)),
        ..Default::default()
    };

    query_transactions(user_id, &query, connection)
}

/// Overwrite the amount, category and description of the transaction `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a transaction.
pub fn update_transaction(
    id: TransactionId,
    amount: Decimal,
    category_id: CategoryId,
    description: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET amount = ?1, category_id = ?2, description = ?3 WHERE id = ?4",
        (amount.to_string(), category_id, description, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the transaction `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a transaction.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the transaction table.
///
/// Categories referenced by a transaction cannot be deleted.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT,
            category_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_category_name: String = row.get(4)?;

    Ok(Transaction {
        id: row.get(0)?,
        amount: get_decimal(row, 1)?,
        date: row.get(2)?,
        category_id: row.get(3)?,
        category_name: CategoryName::new_unchecked(&raw_category_name),
        transaction_type: row.get(5)?,
        description: row.get(6)?,
        user_id: UserID::new(row.get(7)?),
    })
}
