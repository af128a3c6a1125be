pub(crate) mod handlers;
pub mod jwt;
pub mod models;
mod password;
mod service;

// Re-export handlers for use in main.rs
pub use handlers::{google_login, login, logout, me, refresh, register, update_profile};

// Re-export for use in extractors and tests
pub use jwt::{create_access_token, decode_token};
