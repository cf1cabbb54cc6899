//! API handlers.

pub mod health;
pub mod tasks;

pub use health::{health, ready};
