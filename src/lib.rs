pub mod auth;
pub mod config;
pub mod errors;
pub mod expense;
pub mod extractors;
pub mod openapi;
