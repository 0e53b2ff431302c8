pub mod config;
pub mod error;
pub mod model;
pub mod recurrence;
pub mod storage;
pub mod store;

pub use store::{CompleteOutcome, DeleteOutcome, EditOutcome, Saved, TaskStore};
