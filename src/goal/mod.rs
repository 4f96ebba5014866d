//! Savings goals and the progress made towards them.

mod core;
mod endpoints;
mod progress;

pub use core::{SavingsGoal, create_savings_goal_table};
pub use endpoints::{
    create_goal_endpoint, delete_goal_endpoint, get_goal_endpoint, get_goals_endpoint,
    update_goal_endpoint,
};
pub use progress::{GoalProgress, calculate_progress};
