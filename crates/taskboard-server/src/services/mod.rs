//! Business logic services

pub mod auth;
pub mod tasks;

pub use auth::AuthService;
pub use tasks::TaskService;
