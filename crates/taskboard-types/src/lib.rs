//! Taskboard Types - Pure type definitions
//!
//! Tasks, comments, credentials and the listing query. Nothing here touches
//! a database, a cache or an async runtime.

pub mod query;
pub mod task;
pub mod user;

pub use query::*;
pub use task::*;
pub use user::*;
