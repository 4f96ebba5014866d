//! The savings goal model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{Error, UserID, db::get_decimal, iso_date};

/// Database identifier for a savings goal.
pub type GoalId = i64;

/// An amount of money a user wants to have saved by some date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: GoalId,
    /// What the user is saving for.
    pub goal_name: String,
    /// How much the user wants to save.
    pub target_amount: Decimal,
    /// When the user wants to have saved the target amount by.
    #[serde(with = "iso_date")]
    pub target_date: Date,
    /// Transactions before this date do not count towards the goal.
    #[serde(with = "iso_date")]
    pub start_date: Date,
    /// The user that owns the goal.
    #[serde(skip)]
    pub user_id: UserID,
}

/// A savings goal that has been validated but not stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavingsGoal {
    pub goal_name: String,
    pub target_amount: Decimal,
    pub target_date: Date,
    pub start_date: Date,
    pub user_id: UserID,
}

const SELECT_GOAL: &str =
    "SELECT id, goal_name, target_amount, target_date, start_date, user_id FROM savings_goal";

/// Store `goal` in the database.
pub fn create_savings_goal(
    goal: NewSavingsGoal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection.execute(
        "INSERT INTO savings_goal (goal_name, target_amount, target_date, start_date, user_id)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &goal.goal_name,
            goal.target_amount.to_string(),
            goal.target_date,
            goal.start_date,
            goal.user_id.as_i64(),
        ),
    )?;

    Ok(SavingsGoal {
        id: connection.last_insert_rowid(),
        goal_name: goal.goal_name,
        target_amount: goal.target_amount,
        target_date: goal.target_date,
        start_date: goal.start_date,
        user_id: goal.user_id,
    })
}

/// Retrieve the goal `id` owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a goal, or the goal
/// belongs to someone else.
pub fn get_savings_goal(
    id: GoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection
        .prepare(&format!("{SELECT_GOAL} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((id, user_id.as_i64()), map_goal_row)
        .map_err(|error| error.into())
}

/// Retrieve all the goals owned by `user_id`, soonest target date first.
pub fn get_savings_goals(user_id: UserID, connection: &Connection) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_GOAL} WHERE user_id = ?1 ORDER BY target_date ASC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the stored goal with the same ID and owner as `goal`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such goal.
pub fn update_savings_goal(goal: &SavingsGoal, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal
        SET goal_name = ?1, target_amount = ?2, target_date = ?3, start_date = ?4
        WHERE id = ?5 AND user_id = ?6",
        (
            &goal.goal_name,
            goal.target_amount.to_string(),
            goal.target_date,
            goal.start_date,
            goal.id,
            goal.user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the goal `id` owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such goal.
pub fn delete_savings_goal(
    id: GoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the savings goal table.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY,
            goal_name TEXT NOT NULL,
            target_amount TEXT NOT NULL,
            target_date TEXT NOT NULL,
            start_date TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        goal_name: row.get(1)?,
        target_amount: get_decimal(row, 2)?,
        target_date: row.get(3)?,
        start_date: row.get(4)?,
        user_id: UserID::new(row.get(5)?),
    })
}
