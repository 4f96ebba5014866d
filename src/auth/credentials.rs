//! Looking up users and checking their passwords.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, User, auth::Identity, db::lock_connection, user::get_user_by_username};

/// Finds users by their username.
pub trait UserLookup {
    /// Get the user registered as `username`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no user has that username.
    fn find_by_username(&self, username: &str) -> Result<User, Error>;
}

/// Checks a username and password pair.
pub trait CredentialVerifier {
    /// Get the identity of the user if `password` is correct for `username`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCredentials] if the user does not exist or the
    /// password does not match.
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, Error>;
}

/// Reads users from the SQLite database.
#[derive(Debug, Clone)]
pub struct UserStore {
    connection: Arc<Mutex<Connection>>,
}

impl UserStore {
    /// Create a user store that reads from `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserLookup for UserStore {
    fn find_by_username(&self, username: &str) -> Result<User, Error> {
        let connection = lock_connection(&self.connection)?;

        get_user_by_username(username, &connection)
    }
}

impl CredentialVerifier for UserStore {
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, Error> {
        let user = match self.find_by_username(username) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        };

        if user.password_hash.verify(password)? {
            Ok(Identity::from(&user))
        } else {
            Err(Error::InvalidCredentials)
        }
    }
}
