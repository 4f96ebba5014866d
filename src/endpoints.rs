//! The API endpoints URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/logout";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/categories";
/// The route to delete a category by name.
pub const CATEGORY: &str = "/categories/{name}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to list and create savings goals.
pub const GOALS: &str = "/goals";
/// The route to access a single savings goal.
pub const GOAL: &str = "/goals/{goal_id}";
/// The route for the report of one calendar month.
pub const MONTHLY_REPORT: &str = "/reports/monthly/{year}/{month}";
/// The route for the report of one calendar year.
pub const YEARLY_REPORT: &str = "/reports/yearly/{year}";
