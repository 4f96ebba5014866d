//! Application router configuration.

use axum::{
    Json, Router,
    extract::FromRef,
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState,
    auth::{AuthState, auth_gate, post_log_in, post_log_out, post_register},
    category::{create_category_endpoint, delete_category_endpoint, get_categories_endpoint},
    endpoints,
    goal::{
        create_goal_endpoint, delete_goal_endpoint, get_goal_endpoint, get_goals_endpoint,
        update_goal_endpoint,
    },
    report::{get_monthly_report_endpoint, get_yearly_report_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every request passes through [auth_gate], which attaches the caller's
/// identity when the request carries a valid token. Handlers that need an
/// identity reject requests without one.
pub fn build_router(state: AppState) -> Router {
    let auth_state = AuthState::from_ref(&state);

    Router::new()
        .route(endpoints::REGISTER, post(post_register))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            delete(delete_transaction_endpoint).put(update_transaction_endpoint),
        )
        .route(
            endpoints::GOALS,
            get(get_goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::GOAL,
            get(get_goal_endpoint)
                .put(update_goal_endpoint)
                .delete(delete_goal_endpoint),
        )
        .route(endpoints::MONTHLY_REPORT, get(get_monthly_report_endpoint))
        .route(endpoints::YEARLY_REPORT, get(get_yearly_report_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(auth_state, auth_gate))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}
