//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName, TransactionType},
};

/// The categories every user gets when they register.
pub const DEFAULT_CATEGORIES: [(&str, TransactionType); 7] = [
    ("Salary", TransactionType::Income),
    ("Food", TransactionType::Expense),
    ("Rent", TransactionType::Expense),
    ("Transportation", TransactionType::Expense),
    ("Entertainment", TransactionType::Expense),
    ("Healthcare", TransactionType::Expense),
    ("Utilities", TransactionType::Expense),
];

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if `user_id` already has a category named `name`.
pub fn create_category(
    name: CategoryName,
    transaction_type: TransactionType,
    is_custom: bool,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, type, is_custom, user_id) VALUES (?1, ?2, ?3, ?4);",
        (name.as_ref(), transaction_type, is_custom, user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        transaction_type,
        is_custom,
        user_id,
    })
}

/// Create the default categories for `user_id`, skipping any name the user
/// already has.
///
/// Returns the number of categories created.
pub fn create_default_categories(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (name, type, is_custom, user_id) VALUES (?1, ?2, 0, ?3);",
    )?;

    let mut created = 0;

    for (name, transaction_type) in DEFAULT_CATEGORIES {
        created += statement.execute((name, transaction_type, user_id.as_i64()))?;
    }

    Ok(created)
}

/// Retrieve the category of `user_id` called `name`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user has no such category.
pub fn get_category_by_name(
    name: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, type, is_custom, user_id FROM category
            WHERE name = :name AND user_id = :user_id;",
        )?
        .query_row(
            rusqlite::named_params! { ":name": name, ":user_id": user_id.as_i64() },
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all categories of `user_id` ordered alphabetically by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, type, is_custom, user_id FROM category
            WHERE user_id = :user_id ORDER BY name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Whether any transaction refers to the category.
pub fn is_category_in_use(category_id: CategoryId, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE category_id = ?1);",
            [category_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE')),
            is_custom INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            UNIQUE(name, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        transaction_type: row.get(2)?,
        is_custom: row.get(3)?,
        user_id: UserID::new(row.get(4)?),
    })
}
