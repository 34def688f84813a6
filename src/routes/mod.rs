//! HTTP route handlers.

pub mod context;
pub mod documents;
pub mod files;
pub mod groups;
pub mod health;
pub mod me;
pub mod refresh;
pub mod users;
