//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use time::Duration;

use crate::{
    Error, PasswordHash, RevocationRegistry, TokenAuthority, db::initialize,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Issues and checks the tokens that authenticate requests.
    pub token_authority: TokenAuthority,

    /// The tokens that were logged out before they expired.
    pub revocation_registry: RevocationRegistry,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The bcrypt cost used when hashing the passwords of new users.
    pub password_hash_cost: u32,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// Tokens are signed with `token_secret` and expire after `token_expiry`.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if `local_timezone` is not a known timezone or if the
    /// database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        token_expiry: Duration,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_authority: TokenAuthority::new(token_secret, token_expiry),
            revocation_registry: RevocationRegistry::new(),
            local_timezone: local_timezone.to_owned(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
        })
    }

    /// Use `cost` when hashing the passwords of new users.
    ///
    /// Lower costs are faster but easier to brute force, so this should only
    /// be lowered for tests.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

impl FromRef<AppState> for RevocationRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.revocation_registry.clone()
    }
}
