pub mod filter;
pub(crate) mod handlers;
pub mod models;
pub mod service;
pub mod stats;
pub mod store;

// Re-export handlers for use in main.rs
pub use handlers::{
    create_expense, delete_expense, get_expense, get_stats, list_expenses, update_expense,
};
