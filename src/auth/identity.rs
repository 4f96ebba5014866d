//! The authenticated identity attached to a request.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{Error, User, UserID};

/// The authority granted to every registered user.
pub const ROLE_USER: &str = "ROLE_USER";

/// The user a request was authenticated as.
///
/// The auth gate inserts this into the request extensions. Handlers that need
/// a logged in user take it as an extractor, which rejects the request with
/// 401 Unauthorized when the gate did not attach one.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// The ID of the authenticated user.
    pub user_id: UserID,
    /// The username of the authenticated user.
    pub username: String,
    /// The authorities granted to the user.
    pub authorities: Vec<String>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            authorities: vec![ROLE_USER.to_owned()],
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(Error::NotAuthenticated)
    }
}
