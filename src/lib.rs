//! Finance Manager is a REST backend for managing personal finances.
//!
//! Users register, log in with a username and password, and receive a signed
//! token that authenticates later requests, either as a bearer token or via the
//! `SESSION` cookie. Authenticated users can record income and expense
//! transactions against categories, track progress towards savings goals and
//! view monthly and yearly reports.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde_json::json;
use time::Date;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod db;
mod endpoints;
mod goal;
mod logging;
mod password;
mod report;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

// Dates are exchanged as ISO 8601 calendar dates, e.g. "2024-01-31".
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub use app_state::AppState;
pub use auth::{
    AuthState, CredentialVerifier, Identity, PublicPaths, RevocationRegistry, TokenAuthority,
    UserLookup, UserStore, auth_gate,
};
pub use category::{Category, CategoryId, CategoryName, TransactionType};
pub use db::initialize as initialize_db;
pub use goal::{GoalProgress, SavingsGoal, calculate_progress};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionLister};
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username does not exist or the password does not match.
    ///
    /// The two cases are deliberately indistinguishable to the client.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid identity but the endpoint requires one.
    #[error("Authentication required")]
    NotAuthenticated,

    /// The resource exists but belongs to another user.
    #[error("You do not have permission to access this resource")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The named category does not exist for the current user.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// A required text field was empty or only whitespace.
    #[error("{0} must not be blank")]
    BlankField(&'static str),

    /// A monetary amount was smaller than one cent.
    #[error("amount must be at least 0.01")]
    InvalidAmount,

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The target date of a savings goal was today or earlier.
    #[error("target date {0} must be in the future")]
    TargetDateNotInFuture(Date),

    /// The start date of a savings goal was after its target date.
    #[error("start date must be before or equal to target date")]
    StartDateAfterTargetDate,

    /// The username is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The phone number is not a `+` followed by 10 to 15 digits.
    #[error("\"{0}\" is not a valid phone number")]
    InvalidPhoneNumber(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The username is already registered.
    #[error("Username already exists")]
    DuplicateUsername,

    /// The user already has a category with the same name.
    #[error("Category with this name already exists")]
    DuplicateCategoryName,

    /// Tried to delete one of the categories created at registration.
    #[error("Cannot delete default categories")]
    DefaultCategoryDeletion,

    /// Tried to delete a category that transactions still refer to.
    #[error("Cannot delete category that is used in transactions")]
    CategoryInUse,

    /// A report was requested for a month outside 1 to 12.
    #[error("{0} is not a valid month")]
    InvalidMonth(u8),

    /// A report was requested for a year that cannot be represented as a date.
    #[error("{0} is not a valid year")]
    InvalidYear(i32),

    /// A savings goal with a non-positive target reached the progress calculation.
    #[error("savings goal has an invalid target amount {0}")]
    InvalidGoalState(Decimal),

    /// A token could not be decoded or its signature did not verify.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::CategoryInUse
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::NotAuthenticated | Error::MalformedToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound | Error::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            Error::BlankField(_)
            | Error::InvalidAmount
            | Error::FutureDate(_)
            | Error::TargetDateNotInFuture(_)
            | Error::StartDateAfterTargetDate
            | Error::InvalidEmail(_)
            | Error::InvalidPhoneNumber(_)
            | Error::TooWeak(_)
            | Error::DuplicateUsername
            | Error::DuplicateCategoryName
            | Error::DefaultCategoryDeletion
            | Error::CategoryInUse
            | Error::InvalidMonth(_)
            | Error::InvalidYear(_) => StatusCode::BAD_REQUEST,
            Error::InvalidGoalState(_)
            | Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // The details of server errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
