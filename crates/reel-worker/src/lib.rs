//! Task store and pipeline orchestration.
//!
//! Each submitted task runs the six-stage generation pipeline on its own
//! tokio task: script → audio → captions → search keywords → footage →
//! render. The store is the single shared structure; every stage boundary
//! is a cancellation checkpoint.

pub mod error;
pub mod keywords;
pub mod pipeline;
pub mod store;

pub use error::{WorkerError, WorkerResult};
pub use pipeline::{Collaborators, Pipeline};
pub use store::{CancelRejection, TaskStore};
