//! Authentication middleware that attaches the caller's identity to each request.
//!
//! The gate never rejects a request itself. Requests without a usable token
//! pass through without an [Identity], and handlers that require one reject
//! them through the [Identity] extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::CookieJar,
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};

use crate::{
    AppState, Error,
    auth::{
        Identity, RevocationRegistry, TokenAuthority, UserLookup, UserStore,
        cookie::get_session_token,
    },
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Validates tokens and reads their subject.
    pub token_authority: TokenAuthority,
    /// The tokens that were revoked by logging out.
    pub revocation_registry: RevocationRegistry,
    /// The paths that skip token processing entirely.
    pub public_paths: PublicPaths,
    /// Resolves the token subject to a user.
    pub user_lookup: Arc<dyn UserLookup + Send + Sync>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_authority: state.token_authority.clone(),
            revocation_registry: state.revocation_registry.clone(),
            public_paths: PublicPaths::default(),
            user_lookup: Arc::new(UserStore::new(state.db_connection.clone())),
        }
    }
}

/// Middleware function that looks for a token in the request and, if it is
/// valid and not revoked, places the [Identity] of its user into the request.
///
/// The token is taken from the `Authorization: Bearer` header if present,
/// otherwise from the `SESSION` cookie. Requests to a public path are passed
/// on untouched.
///
/// **Note**: Route handlers can use the function argument `identity: Identity`
/// to receive the identity, which rejects unauthenticated requests.
pub async fn auth_gate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.public_paths.matches(request.uri().path()) {
        return next.run(request).await;
    }

    match authenticate_request(&state, request.headers()) {
        Ok(Some(identity)) => {
            tracing::debug!("Authenticated request as {}", identity.username);
            request.extensions_mut().insert(identity);
        }
        Ok(None) => {}
        Err(error) => {
            tracing::warn!("Could not set user authentication: {error}");
        }
    }

    next.run(request).await
}

fn authenticate_request(state: &AuthState, headers: &HeaderMap) -> Result<Option<Identity>, Error> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };

    if state.revocation_registry.is_revoked(&token) {
        tracing::warn!("Rejected a revoked token");
        return Ok(None);
    }

    if !state.token_authority.validate(&token) {
        tracing::warn!("Rejected an invalid or expired token");
        return Ok(None);
    }

    let username = state.token_authority.subject_of(&token)?;
    let user = state.user_lookup.find_by_username(&username)?;

    Ok(Some(Identity::from(&user)))
}

/// Get the token from the bearer header, falling back to the `SESSION` cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer_token = headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_owned())
        .filter(|token| !token.is_empty());

    bearer_token.or_else(|| get_session_token(&CookieJar::from_headers(headers)))
}

/// Path patterns for endpoints that are reachable without a token.
///
/// Patterns are matched segment by segment. Within a segment `*` matches any
/// run of characters and `?` matches one character. A `**` segment matches
/// zero or more whole segments.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicPaths(Vec<String>);

impl PublicPaths {
    /// Create a set of public paths from `patterns`.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    /// Whether `path` matches any of the public patterns.
    pub fn matches(&self, path: &str) -> bool {
        let path_segments = split_segments(path);

        self.0
            .iter()
            .any(|pattern| match_segments(&split_segments(pattern), &path_segments))
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(["/auth/register", "/auth/login", "/auth/logout"])
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_segments(rest, &path[skip..])),
        Some((segment_pattern, rest)) => match path.split_first() {
            Some((segment, path_rest)) => {
                match_wildcards(segment_pattern.as_bytes(), segment.as_bytes())
                    && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

fn match_wildcards(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.split_first(), text.split_first()) {
        (None, None) => true,
        (Some((b'*', pattern_rest)), _) => {
            match_wildcards(pattern_rest, text)
                || (!text.is_empty() && match_wildcards(pattern, &text[1..]))
        }
        (Some((b'?', pattern_rest)), Some((_, text_rest))) => {
            match_wildcards(pattern_rest, text_rest)
        }
        (Some((expected, pattern_rest)), Some((actual, text_rest))) => {
            expected == actual && match_wildcards(pattern_rest, text_rest)
        }
        _ => false,
    }
}

#[cfg(test)]
mod public_paths_tests {
    use super::PublicPaths;

    #[test]
    fn default_paths_match_auth_endpoints() {
        let public_paths = PublicPaths::default();

        assert!(public_paths.matches("/auth/login"));
        assert!(public_paths.matches("/auth/register"));
        assert!(public_paths.matches("/auth/logout"));
    }

    #[test]
    fn default_paths_do_not_match_protected_endpoints() {
        let public_paths = PublicPaths::default();

        assert!(!public_paths.matches("/"));
        assert!(!public_paths.matches("/transactions"));
        assert!(!public_paths.matches("/goals/1"));
        assert!(!public_paths.matches("/authors"));
        assert!(!public_paths.matches("/auth"));
        assert!(!public_paths.matches("/auth/me"));
        assert!(!public_paths.matches("/auth/anything/else"));
        assert!(!public_paths.matches("/public/x"));
        assert!(!public_paths.matches("/error"));
    }

    #[test]
    fn single_star_matches_within_one_segment() {
        let public_paths = PublicPaths::new(["/reports/*/summary", "/files/*.csv"]);

        assert!(public_paths.matches("/reports/2024/summary"));
        assert!(!public_paths.matches("/reports/2024/01/summary"));
        assert!(public_paths.matches("/files/january.csv"));
        assert!(!public_paths.matches("/files/january.txt"));
    }

    #[test]
    fn double_star_in_the_middle_matches_many_segments() {
        let public_paths = PublicPaths::new(["/docs/**/index"]);

        assert!(public_paths.matches("/docs/index"));
        assert!(public_paths.matches("/docs/a/b/c/index"));
        assert!(!public_paths.matches("/docs/a/b/c"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let public_paths = PublicPaths::new(["/v?/status"]);

        assert!(public_paths.matches("/v1/status"));
        assert!(!public_paths.matches("/v10/status"));
    }
}

#[cfg(test)]
mod auth_gate_tests {
    use std::{collections::HashMap, sync::Arc};

    use axum::{Router, extract::Request, middleware, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, PasswordHash, User, UserID,
        auth::{
            AuthState, Identity, PublicPaths, RevocationRegistry, TokenAuthority, UserLookup,
            auth_gate, cookie::SESSION_COOKIE,
        },
    };

    struct StubUserLookup {
        users: HashMap<String, User>,
    }

    impl UserLookup for StubUserLookup {
        fn find_by_username(&self, username: &str) -> Result<User, Error> {
            self.users.get(username).cloned().ok_or(Error::NotFound)
        }
    }

    const TEST_USERNAME: &str = "test@example.com";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_PUBLIC_ROUTE: &str = "/auth/login";

    async fn protected_handler(identity: Identity) -> String {
        format!("{}:{}", identity.user_id, identity.username)
    }

    async fn public_handler(request: Request) -> String {
        request.extensions().get::<Identity>().is_some().to_string()
    }

    fn get_auth_state() -> AuthState {
        let user = User {
            id: UserID::new(1),
            username: TEST_USERNAME.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            full_name: "Test User".to_owned(),
            phone_number: "+6421123456".to_owned(),
        };

        AuthState {
            token_authority: TokenAuthority::new("nafstenoas", Duration::hours(1)),
            revocation_registry: RevocationRegistry::new(),
            public_paths: PublicPaths::default(),
            user_lookup: Arc::new(StubUserLookup {
                users: HashMap::from([(TEST_USERNAME.to_owned(), user)]),
            }),
        }
    }

    fn get_test_server(state: AuthState) -> TestServer {
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(protected_handler))
            .route(TEST_PUBLIC_ROUTE, get(public_handler))
            .layer(middleware::from_fn_with_state(state, auth_gate));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn bearer_token_authenticates_request() {
        let state = get_auth_state();
        let token = state.token_authority.issue(TEST_USERNAME).unwrap();
        let server = get_test_server(state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_text(format!("1:{TEST_USERNAME}"));
    }

    #[tokio::test]
    async fn session_cookie_authenticates_request() {
        let state = get_auth_state();
        let token = state.token_authority.issue(TEST_USERNAME).unwrap();
        let server = get_test_server(state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::new(SESSION_COOKIE, token))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn bearer_header_takes_precedence_over_cookie() {
        let state = get_auth_state();
        let token = state.token_authority.issue(TEST_USERNAME).unwrap();
        let server = get_test_server(state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("garbage")
            .add_cookie(Cookie::new(SESSION_COOKIE, token))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let server = get_test_server(get_auth_state());

        server
            .get(TEST_PROTECTED_ROUTE)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn revoked_token_is_unauthorized() {
        let state = get_auth_state();
        let token = state.token_authority.issue(TEST_USERNAME).unwrap();
        state.revocation_registry.revoke(&token);
        let server = get_test_server(state);

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let state = get_auth_state();
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(2);
        let token = state
            .token_authority
            .issue_at(TEST_USERNAME, issued_at)
            .unwrap();
        let server = get_test_server(state);

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn token_for_unknown_user_is_unauthorized() {
        let state = get_auth_state();
        let token = state.token_authority.issue("nobody@example.com").unwrap();
        let server = get_test_server(state);

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn public_path_skips_token_processing() {
        let state = get_auth_state();
        let token = state.token_authority.issue(TEST_USERNAME).unwrap();
        let server = get_test_server(state);

        let response = server
            .get(TEST_PUBLIC_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_text("false");
    }
}
