//! Monthly and yearly summaries of a user's transactions.

mod endpoints;
mod summary;

pub use endpoints::{get_monthly_report_endpoint, get_yearly_report_endpoint};
