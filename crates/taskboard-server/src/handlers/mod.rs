//! HTTP handlers

pub mod auth;
pub mod csv;
pub mod error;
pub mod health;
pub mod tasks;

pub use error::ApiError;
pub use health::health;
