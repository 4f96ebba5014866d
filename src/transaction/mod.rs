//! Income and expense transactions.

mod core;
mod endpoints;

pub use core::{
    Transaction, TransactionLister, create_transaction_table, get_transactions_in_range,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
    update_transaction_endpoint,
};

#[cfg(test)]
pub use core::create_transaction;
