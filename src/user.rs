//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's full name.
    pub full_name: String,
    /// The user's phone number, in international format.
    pub phone_number: String,
}

/// The validated details of a user that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The email address the user logs in with.
    pub username: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's full name, trimmed and non-empty.
    pub full_name: String,
    /// The user's phone number, in international format.
    pub phone_number: PhoneNumber,
}

/// A phone number in international format: a `+` followed by 10 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate `raw_phone_number`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPhoneNumber] if the number is not a `+` followed
    /// by 10 to 15 ASCII digits.
    pub fn new(raw_phone_number: &str) -> Result<Self, Error> {
        let is_valid = raw_phone_number
            .strip_prefix('+')
            .is_some_and(|digits| {
                (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
            });

        if is_valid {
            Ok(Self(raw_phone_number.to_owned()))
        } else {
            Err(Error::InvalidPhoneNumber(raw_phone_number.to_owned()))
        }
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                full_name TEXT NOT NULL,
                phone_number TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::DuplicateUsername] if the username is taken, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, password, full_name, phone_number) VALUES (?1, ?2, ?3, ?4)",
        (
            new_user.username.as_str(),
            new_user.password_hash.as_ref(),
            &new_user.full_name,
            new_user.phone_number.as_ref(),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: new_user.username.to_string(),
        password_hash: new_user.password_hash,
        full_name: new_user.full_name,
        phone_number: new_user.phone_number.0,
    })
}

/// Get the user whose username is `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, full_name, phone_number FROM user
            WHERE username = :username",
        )?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        full_name: row.get(3)?,
        phone_number: row.get(4)?,
    })
}


#[cfg(test)]
mod user_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{Error, PasswordHash};

    use super::{NewUser, PhoneNumber, create_user, create_user_table, get_user_by_username};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: EmailAddress::from_str(username).unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            full_name: "Test User".to_owned(),
            phone_number: PhoneNumber::new("+6421123456").unwrap(),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("test@example.com"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username, "test@example.com");
        assert_eq!(inserted_user.full_name, "Test User");
    }

    #[test]
    fn insert_duplicate_username_fails() {
        let db_connection = get_db_connection();
        create_user(new_user("test@example.com"), &db_connection).unwrap();

        let result = create_user(new_user("test@example.com"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateUsername));
    }

    #[test]
    fn get_user_fails_with_unknown_username() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_username("nobody@example.com", &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_username() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("test@example.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_username("test@example.com", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }
}
