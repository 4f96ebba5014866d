//! Logging in with a username and password.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, UserID,
    auth::{CredentialVerifier, TokenAuthority, UserStore, cookie::set_session_cookie},
};

/// The state needed to perform a log in.
#[derive(Clone)]
pub struct LogInState {
    /// Issues the token for a successful log in.
    pub token_authority: TokenAuthority,
    /// Checks the submitted username and password.
    pub credentials: Arc<dyn CredentialVerifier + Send + Sync>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_authority: state.token_authority.clone(),
            credentials: Arc::new(UserStore::new(state.db_connection.clone())),
        }
    }
}

/// The data submitted to log in.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInData {
    /// The username, which is the user's email address.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
}

/// The body of responses from the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// A human readable description of the outcome.
    pub message: String,
    /// The ID of the user that registered or logged in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserID>,
    /// The token issued on log in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Handler for log-in requests.
///
/// On success the token is returned in the body and also set as the
/// `SESSION` cookie, whose max age matches the token lifetime.
///
/// # Errors
///
/// Responds with 401 Unauthorized if the username is unknown or the password
/// is wrong, and 400 Bad Request if either field is blank.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: CookieJar,
    Json(log_in_data): Json<LogInData>,
) -> Result<(CookieJar, Json<AuthResponse>), Error> {
    if log_in_data.username.trim().is_empty() {
        return Err(Error::BlankField("username"));
    }

    if log_in_data.password.trim().is_empty() {
        return Err(Error::BlankField("password"));
    }

    let identity = state
        .credentials
        .authenticate(&log_in_data.username, &log_in_data.password)
        .inspect_err(|error| {
            if *error == Error::InvalidCredentials {
                tracing::info!("Failed log in attempt for {}", log_in_data.username);
            }
        })?;

    let token = state.token_authority.issue(&identity.username)?;
    let jar = set_session_cookie(
        jar,
        token.clone(),
        Duration::seconds(state.token_authority.expiry_seconds()),
    );

    tracing::info!("User {} logged in", identity.user_id);

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_owned(),
            user_id: Some(identity.user_id),
            token: Some(token),
        }),
    ))
}
