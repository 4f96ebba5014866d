//! Registering a new user.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::AuthResponse,
    category::create_default_categories,
    db::lock_connection,
    user::{NewUser, PhoneNumber, create_user},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used to hash the new password.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The data submitted to register a new user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    /// The username, which must be an email address.
    pub username: String,
    /// The password in plain text.
    pub password: String,
    /// The user's full name.
    pub full_name: String,
    /// The user's phone number, e.g. "+6421123456".
    pub phone_number: String,
}

impl RegisterData {
    fn validate(self, password_hash_cost: u32) -> Result<NewUser, Error> {
        let full_name = self.full_name.trim();

        if full_name.is_empty() {
            return Err(Error::BlankField("fullName"));
        }

        let username = EmailAddress::from_str(self.username.trim())
            .map_err(|_| Error::InvalidEmail(self.username.clone()))?;
        let phone_number = PhoneNumber::new(self.phone_number.trim())?;
        let password = ValidatedPassword::new(&self.password, &[username.as_str(), full_name])?;

        Ok(NewUser {
            username,
            password_hash: PasswordHash::new(password, password_hash_cost)?,
            full_name: full_name.to_owned(),
            phone_number,
        })
    }
}

/// Handler for registering a new user.
///
/// The user is created together with the default categories in a single
/// database transaction.
///
/// # Errors
///
/// Responds with 400 Bad Request if a field is invalid, the password is too
/// weak or the username is already taken.
pub async fn post_register(
    State(state): State<RegistrationState>,
    Json(register_data): Json<RegisterData>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let new_user = register_data.validate(state.password_hash_cost)?;

    let mut connection = lock_connection(&state.db_connection)?;

    let transaction = connection.transaction()?;
    let user = create_user(new_user, &transaction)?;
    create_default_categories(user.id, &transaction)?;
    transaction.commit()?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_owned(),
            user_id: Some(user.id),
            token: None,
        }),
    ))
}

#[cfg(test)]
mod register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        auth::AuthResponse,
        category::get_categories,
        test_utils::{TEST_PASSWORD, get_test_connection},
        user::get_user_by_username,
    };

    use super::{RegistrationState, post_register};

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let connection = Arc::new(Mutex::new(get_test_connection()));
        let state = RegistrationState {
            db_connection: connection.clone(),
            password_hash_cost: 4,
        };
        let app = Router::new()
            .route("/auth/register", post(post_register))
            .with_state(state);

        (
            TestServer::try_new(app).expect("Could not create test server."),
            connection,
        )
    }

    fn registration(username: &str) -> Value {
        json!({
            "username": username,
            "password": TEST_PASSWORD,
            "fullName": "Test User",
            "phoneNumber": "+6421123456",
        })
    }

    #[tokio::test]
    async fn register_creates_user_with_default_categories() {
        let (server, connection) = get_test_server();

        let response = server
            .post("/auth/register")
            .json(&registration("test@example.com"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<AuthResponse>();
        assert_eq!(body.message, "User registered successfully");

        let connection = connection.lock().unwrap();
        let user = get_user_by_username("test@example.com", &connection).unwrap();
        assert_eq!(body.user_id, Some(user.id));
        assert_ne!(user.password_hash.as_ref(), TEST_PASSWORD);

        let categories = get_categories(user.id, &connection).unwrap();
        assert_eq!(categories.len(), 7);
        assert!(categories.iter().all(|category| !category.is_custom));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let (server, _) = get_test_server();
        server
            .post("/auth/register")
            .json(&registration("test@example.com"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/auth/register")
            .json(&registration("test@example.com"))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Username already exists" }));
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let (server, _) = get_test_server();

        server
            .post("/auth/register")
            .json(&registration("not-an-email"))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let (server, _) = get_test_server();

        server
            .post("/auth/register")
            .json(&json!({
                "username": "test@example.com",
                "password": "password",
                "fullName": "Test User",
                "phoneNumber": "+6421123456",
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_rejects_invalid_phone_number() {
        let (server, _) = get_test_server();

        server
            .post("/auth/register")
            .json(&json!({
                "username": "test@example.com",
                "password": TEST_PASSWORD,
                "fullName": "Test User",
                "phoneNumber": "021 123 456",
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_rejects_blank_full_name() {
        let (server, _) = get_test_server();

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "test@example.com",
                "password": TEST_PASSWORD,
                "fullName": "   ",
                "phoneNumber": "+6421123456",
            }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "fullName must not be blank" }));
    }
}
