//! Logging out by revoking the session token.

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;

use crate::auth::{
    AuthResponse, RevocationRegistry,
    cookie::{clear_session_cookie, get_session_token},
};

/// Handler for log-out requests.
///
/// Revokes the token in the `SESSION` cookie, if there is one, and clears the
/// cookie. Logging out always succeeds, even without a session.
pub async fn post_log_out(
    State(revocation_registry): State<RevocationRegistry>,
    jar: CookieJar,
) -> (CookieJar, Json<AuthResponse>) {
    if let Some(token) = get_session_token(&jar) {
        revocation_registry.revoke(&token);
        tracing::info!("Revoked session token on log out");
    }

    (
        clear_session_cookie(jar),
        Json(AuthResponse {
            message: "Logout successful".to_owned(),
            user_id: None,
            token: None,
        }),
    )
}
