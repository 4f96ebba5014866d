//! Endpoints for listing, creating and deleting a user's categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::Identity,
    category::{
        Category, CategoryData, CategoryName,
        db::{
            create_category, delete_category, get_categories, get_category_by_name,
            is_category_in_use,
        },
    },
    db::lock_connection,
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the categories of the current user, sorted by name.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    identity: Identity,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_categories(identity.user_id, &connection).map(Json)
}

/// Create a custom category for the current user.
///
/// # Errors
///
/// Responds with 400 Bad Request if the name is blank or already used by one
/// of the user's categories.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    identity: Identity,
    Json(category_data): Json<CategoryData>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = CategoryName::new(&category_data.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(
        name,
        category_data.transaction_type,
        true,
        identity.user_id,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete the current user's custom category called `name`.
///
/// # Errors
///
/// Responds with 404 Not Found if the user has no such category, and 400 Bad
/// Request if it is a default category or transactions still refer to it.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    identity: Identity,
    Path(name): Path<String>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let category = get_category_by_name(&name, identity.user_id, &connection)
        .map_err(|error| match error {
            Error::NotFound => Error::CategoryNotFound(name.clone()),
            error => error,
        })?;

    if !category.is_custom {
        return Err(Error::DefaultCategoryDeletion);
    }

    if is_category_in_use(category.id, &connection)? {
        return Err(Error::CategoryInUse);
    }

    delete_category(category.id, &connection)?;

    Ok(Json(json!({ "message": "Category deleted successfully" })))
}

#[cfg(test)]
mod category_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::test_utils::{get_test_server_with_user, post_transaction};

    #[tokio::test]
    async fn list_returns_default_categories() {
        let (server, token) = get_test_server_with_user().await;

        let response = server.get("/categories").authorization_bearer(&token).await;

        response.assert_status_ok();
        let categories = response.json::<Vec<Value>>();
        assert_eq!(categories.len(), 7);
        assert_eq!(categories[0]["name"], "Entertainment");
        assert_eq!(categories[0]["type"], "EXPENSE");
        assert_eq!(categories[0]["isCustom"], false);
    }

    #[tokio::test]
    async fn list_requires_authentication() {
        let (server, _) = get_test_server_with_user().await;

        server
            .get("/categories")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_custom_category() {
        let (server, token) = get_test_server_with_user().await;

        let response = server
            .post("/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Groceries", "type": "EXPENSE" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let category = response.json::<Value>();
        assert_eq!(category["name"], "Groceries");
        assert_eq!(category["isCustom"], true);
    }

    #[tokio::test]
    async fn create_duplicate_category_fails() {
        let (server, token) = get_test_server_with_user().await;

        let response = server
            .post("/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Food", "type": "EXPENSE" }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Category with this name already exists" }));
    }

    #[tokio::test]
    async fn delete_custom_category_succeeds() {
        let (server, token) = get_test_server_with_user().await;
        server
            .post("/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Groceries", "type": "EXPENSE" }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .delete("/categories/Groceries")
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let categories = server
            .get("/categories")
            .authorization_bearer(&token)
            .await
            .json::<Vec<Value>>();
        assert!(categories.iter().all(|category| category["name"] != "Groceries"));
    }

    #[tokio::test]
    async fn delete_default_category_fails() {
        let (server, token) = get_test_server_with_user().await;

        let response = server
            .delete("/categories/Rent")
            .authorization_bearer(&token)
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Cannot delete default categories" }));
    }

    #[tokio::test]
    async fn delete_missing_category_fails() {
        let (server, token) = get_test_server_with_user().await;

        server
            .delete("/categories/Nope")
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_category_in_use_fails() {
        let (server, token) = get_test_server_with_user().await;
        server
            .post("/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Groceries", "type": "EXPENSE" }))
            .await
            .assert_status(StatusCode::CREATED);
        post_transaction(&server, &token, dec!(12.50), date!(2024 - 01 - 01), "Groceries").await;

        let response = server
            .delete("/categories/Groceries")
            .authorization_bearer(&token)
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Cannot delete category that is used in transactions" }));
    }
}
