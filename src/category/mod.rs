//! Categories that group a user's transactions into income and expenses.

mod db;
mod domain;
mod endpoints;

pub use db::{create_category_table, create_default_categories, get_category_by_name};
pub use domain::{Category, CategoryData, CategoryId, CategoryName, TransactionType};
pub use endpoints::{create_category_endpoint, delete_category_endpoint, get_categories_endpoint};

#[cfg(test)]
pub use db::{create_category, get_categories};
