//! Endpoints for managing savings goals and reporting their progress.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, Error,
    auth::Identity,
    db::lock_connection,
    goal::{
        GoalProgress, calculate_progress,
        core::{
            GoalId, NewSavingsGoal, SavingsGoal, create_savings_goal, delete_savings_goal,
            get_savings_goal, get_savings_goals, update_savings_goal,
        },
    },
    iso_date,
    timezone::local_today,
    transaction::{Transaction, TransactionLister},
};

/// The state needed for the savings goal endpoints.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The data for creating a savings goal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalData {
    /// What the user is saving for.
    pub goal_name: String,
    /// How much the user wants to save, at least one cent.
    pub target_amount: Decimal,
    /// A date after today.
    #[serde(with = "iso_date")]
    pub target_date: Date,
    /// Defaults to today.
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
}

/// The fields of a savings goal that can be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdateData {
    /// The new name.
    pub goal_name: Option<String>,
    /// The new target amount.
    pub target_amount: Option<Decimal>,
    /// The new target date.
    #[serde(default, with = "iso_date::option")]
    pub target_date: Option<Date>,
    /// The new start date.
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
}

/// A savings goal together with its progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalResponse {
    #[serde(flatten)]
    goal: SavingsGoal,
    #[serde(flatten)]
    progress: GoalProgress,
}

/// The smallest amount a goal may target.
const MINIMUM_TARGET: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Check the fields of `goal` that every stored goal must satisfy.
fn validate_goal(goal: &NewSavingsGoal) -> Result<(), Error> {
    if goal.goal_name.trim().is_empty() {
        return Err(Error::BlankField("goalName"));
    }

    if goal.target_amount < MINIMUM_TARGET {
        return Err(Error::InvalidAmount);
    }

    if goal.start_date > goal.target_date {
        return Err(Error::StartDateAfterTargetDate);
    }

    Ok(())
}

/// A target date that is set by the user must come after `today`.
fn validate_target_date(target_date: Date, today: Date) -> Result<(), Error> {
    if target_date <= today {
        Err(Error::TargetDateNotInFuture(target_date))
    } else {
        Ok(())
    }
}

/// Merge `data` into the stored `goal`.
///
/// The target date is only checked against `today` when `data` changes it,
/// so a goal whose target date has passed can still be edited.
fn apply_update(
    goal: SavingsGoal,
    data: GoalUpdateData,
    today: Date,
) -> Result<SavingsGoal, Error> {
    if let Some(target_date) = data.target_date {
        validate_target_date(target_date, today)?;
    }

    let updated = NewSavingsGoal {
        goal_name: data
            .goal_name
            .map(|name| name.trim().to_owned())
            .unwrap_or(goal.goal_name),
        target_amount: data.target_amount.unwrap_or(goal.target_amount),
        target_date: data.target_date.unwrap_or(goal.target_date),
        start_date: data.start_date.unwrap_or(goal.start_date),
        user_id: goal.user_id,
    };
    validate_goal(&updated)?;

    Ok(SavingsGoal {
        id: goal.id,
        goal_name: updated.goal_name,
        target_amount: updated.target_amount,
        target_date: updated.target_date,
        start_date: updated.start_date,
        user_id: updated.user_id,
    })
}

fn with_progress(goal: SavingsGoal, transactions: &[Transaction]) -> Result<GoalResponse, Error> {
    let progress = calculate_progress(&goal, transactions)?;

    Ok(GoalResponse { goal, progress })
}

/// Create a savings goal for the current user.
///
/// # Errors
///
/// Responds with 400 Bad Request if the name is blank, the target is below
/// one cent, the target date is not after today, or the start date is after
/// the target date.
pub async fn create_goal_endpoint(
    State(state): State<GoalState>,
    identity: Identity,
    Json(data): Json<GoalData>,
) -> Result<(StatusCode, Json<GoalResponse>), Error> {
    let today = local_today(&state.local_timezone)?;
    let new_goal = NewSavingsGoal {
        goal_name: data.goal_name.trim().to_owned(),
        target_amount: data.target_amount,
        target_date: data.target_date,
        start_date: data.start_date.unwrap_or(today),
        user_id: identity.user_id,
    };
    validate_goal(&new_goal)?;
    validate_target_date(new_goal.target_date, today)?;

    let connection = lock_connection(&state.db_connection)?;
    let goal = create_savings_goal(new_goal, &connection)?;
    let transactions = connection.list_for_user(identity.user_id)?;

    with_progress(goal, &transactions).map(|response| (StatusCode::CREATED, Json(response)))
}

/// List the current user's savings goals with their progress.
pub async fn get_goals_endpoint(
    State(state): State<GoalState>,
    identity: Identity,
) -> Result<Json<Vec<GoalResponse>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let goals = get_savings_goals(identity.user_id, &connection)?;
    let transactions = connection.list_for_user(identity.user_id)?;

    goals
        .into_iter()
        .map(|goal| with_progress(goal, &transactions))
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

/// Get one of the current user's savings goals with its progress.
///
/// # Errors
///
/// Responds with 404 Not Found if the current user has no such goal.
pub async fn get_goal_endpoint(
    State(state): State<GoalState>,
    identity: Identity,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<GoalResponse>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let goal = get_savings_goal(goal_id, identity.user_id, &connection)?;
    let transactions = connection.list_for_user(identity.user_id)?;

    with_progress(goal, &transactions).map(Json)
}

/// Change any of the fields of a savings goal.
///
/// # Errors
///
/// Responds with 404 Not Found if the current user has no such goal, and 400
/// Bad Request if the changed goal would be invalid.
pub async fn update_goal_endpoint(
    State(state): State<GoalState>,
    identity: Identity,
    Path(goal_id): Path<GoalId>,
    Json(data): Json<GoalUpdateData>,
) -> Result<Json<GoalResponse>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let goal = get_savings_goal(goal_id, identity.user_id, &connection)?;

    let goal = apply_update(goal, data, today)?;
    update_savings_goal(&goal, &connection)?;
    let transactions = connection.list_for_user(identity.user_id)?;

    with_progress(goal, &transactions).map(Json)
}

/// Delete one of the current user's savings goals.
///
/// # Errors
///
/// Responds with 404 Not Found if the current user has no such goal.
pub async fn delete_goal_endpoint(
    State(state): State<GoalState>,
    identity: Identity,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_savings_goal(goal_id, identity.user_id, &connection)?;

    Ok(Json(json!({ "message": "Goal deleted successfully" })))
}



#[cfg(test)]
mod goal_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::test_utils::{get_test_server_with_user, log_in_new_user, post_transaction};

    fn next_year() -> String {
        (OffsetDateTime::now_utc().date() + Duration::days(365)).to_string()
    }

    #[tokio::test]
    async fn create_goal_reports_progress() {
        let (server, token) = get_test_server_with_user().await;
        post_transaction(&server, &token, dec!(500), date!(2024 - 01 - 05), "Salary").await;
        post_transaction(&server, &token, dec!(100), date!(2024 - 01 - 06), "Food").await;
        post_transaction(&server, &token, dec!(999), date!(2023 - 12 - 31), "Salary").await;

        let response = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
                "startDate": "2024-01-01",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let goal = response.json::<Value>();
        assert_eq!(goal["goalName"], "Holiday");
        assert_eq!(goal["targetAmount"], 1000.0);
        assert_eq!(goal["startDate"], "2024-01-01");
        assert_eq!(goal["currentProgress"], 400.0);
        assert_eq!(goal["progressPercentage"], 40.0);
        assert_eq!(goal["remainingAmount"], 600.0);
    }

    #[tokio::test]
    async fn create_goal_defaults_start_date_to_today() {
        let (server, token) = get_test_server_with_user().await;

        let goal = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
            }))
            .await
            .json::<Value>();

        assert_eq!(
            goal["startDate"],
            OffsetDateTime::now_utc().date().to_string()
        );
    }

    #[tokio::test]
    async fn create_goal_with_past_target_date_fails() {
        let (server, token) = get_test_server_with_user().await;

        server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": "2020-01-01",
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn list_and_get_goals() {
        let (server, token) = get_test_server_with_user().await;
        let created = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
            }))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap();

        let goals = server
            .get("/goals")
            .authorization_bearer(&token)
            .await
            .json::<Vec<Value>>();
        let goal = server
            .get(&format!("/goals/{id}"))
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0], created);
        assert_eq!(goal, created);
    }

    #[tokio::test]
    async fn other_users_goal_is_not_found() {
        let (server, token) = get_test_server_with_user().await;
        let created = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
            }))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap();
        let other_token = log_in_new_user(&server, "other@example.com").await;

        server
            .get(&format!("/goals/{id}"))
            .authorization_bearer(&other_token)
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/goals/{id}"))
            .authorization_bearer(&other_token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn update_goal_changes_only_given_fields() {
        let (server, token) = get_test_server_with_user().await;
        let created = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
                "startDate": "2024-01-01",
            }))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/goals/{id}"))
            .authorization_bearer(&token)
            .json(&json!({ "targetAmount": 2000 }))
            .await;

        response.assert_status_ok();
        let updated = response.json::<Value>();
        assert_eq!(updated["goalName"], "Holiday");
        assert_eq!(updated["targetAmount"], 2000.0);
        assert_eq!(updated["startDate"], "2024-01-01");
        assert_eq!(updated["remainingAmount"], 2000.0);
    }

    #[tokio::test]
    async fn update_goal_with_start_after_target_fails() {
        let (server, token) = get_test_server_with_user().await;
        let created = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
            }))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap();

        server
            .put(&format!("/goals/{id}"))
            .authorization_bearer(&token)
            .json(&json!({ "startDate": "2099-01-01" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn delete_goal_succeeds() {
        let (server, token) = get_test_server_with_user().await;
        let created = server
            .post("/goals")
            .authorization_bearer(&token)
            .json(&json!({
                "goalName": "Holiday",
                "targetAmount": 1000,
                "targetDate": next_year(),
            }))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap();

        let response = server
            .delete(&format!("/goals/{id}"))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Goal deleted successfully" }));
        server
            .get(&format!("/goals/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }
}
