//! Helpers shared by the tests of several modules.

#![allow(missing_docs)]

use std::str::FromStr;

use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, PasswordHash, User, ValidatedPassword, build_router,
    db::initialize,
    user::{NewUser, PhoneNumber, create_user},
};

/// A password that is strong enough to pass registration.
pub const TEST_PASSWORD: &str = "asomewhatlongpassword1";

/// The username of the user created by [get_test_server_with_user].
pub const TEST_USERNAME: &str = "test@example.com";

/// The lowest bcrypt cost, to keep the tests fast.
pub const TEST_HASH_COST: u32 = 4;

pub fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

pub fn create_test_user(username: &str, connection: &Connection) -> User {
    let password = ValidatedPassword::new(TEST_PASSWORD, &[]).expect("Test password is too weak");

    create_user(
        NewUser {
            username: EmailAddress::from_str(username).expect("Invalid test username"),
            password_hash: PasswordHash::new(password, TEST_HASH_COST)
                .expect("Could not hash test password"),
            full_name: "Test User".to_owned(),
            phone_number: PhoneNumber::new("+6421123456").expect("Invalid test phone number"),
        },
        connection,
    )
    .expect("Could not create test user")
}

pub fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");

    AppState::new(
        connection,
        "averylongandsecrettestsigningkey",
        time::Duration::hours(1),
        "Etc/UTC",
    )
    .expect("Could not create app state")
    .with_password_hash_cost(TEST_HASH_COST)
}

/// Register `username` through the API and return a token for them.
pub async fn log_in_new_user(server: &TestServer, username: &str) -> String {
    server
        .post("/auth/register")
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "fullName": "Test User",
            "phoneNumber": "+6421123456",
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/auth/login")
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["token"]
        .as_str()
        .expect("Log in response did not contain a token")
        .to_owned()
}

/// A server with the full router and one registered user, [TEST_USERNAME].
pub async fn get_test_server_with_user() -> (TestServer, String) {
    let server = TestServer::try_new(build_router(get_test_app_state()))
        .expect("Could not create test server.");
    let token = log_in_new_user(&server, TEST_USERNAME).await;

    (server, token)
}

/// Create a transaction through the API and return the created transaction.
pub async fn post_transaction(
    server: &TestServer,
    token: &str,
    amount: Decimal,
    date: Date,
    category: &str,
) -> Value {
    let response = server
        .post("/transactions")
        .authorization_bearer(token)
        .json(&json!({
            "amount": amount,
            "date": date.to_string(),
            "category": category,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    response.json::<Value>()
}
