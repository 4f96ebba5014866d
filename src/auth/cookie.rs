//! Functions for setting and clearing the `SESSION` cookie that carries the token.

use axum_extra::extract::{CookieJar, cookie::Cookie};
use time::Duration;

/// The name of the cookie that holds the token.
pub const SESSION_COOKIE: &str = "SESSION";

/// Add the `SESSION` cookie holding `token` to the cookie jar.
///
/// The cookie is HTTP only, applies to every path and lives for `max_age`.
pub fn set_session_cookie(jar: CookieJar, token: String, max_age: Duration) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .path("/")
            .max_age(max_age),
    )
}

/// Overwrite the `SESSION` cookie with an empty value and a max age of zero,
/// which deletes the cookie on the client side.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .path("/")
            .max_age(Duration::ZERO),
    )
}

/// Get the token from the `SESSION` cookie, if there is a non-empty one.
pub fn get_session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}
