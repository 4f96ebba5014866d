//! Database setup and shared connection handling.

use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error, category::create_category_table, goal::create_savings_goal_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create all the tables for the domain models.
///
/// Foreign key enforcement is switched on for `connection`. The tables are
/// created in a single transaction, so either all of them exist afterwards or
/// none of the missing ones do.
///
/// # Errors
///
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_savings_goal_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Lock the shared database connection.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Read the decimal stored as text in column `index` of `row`.
pub fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw_decimal: String = row.get(index)?;

    Decimal::from_str(&raw_decimal).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}
