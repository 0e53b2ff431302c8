use crate::error::AppError;
use crate::model::Task;

pub mod json_store;
mod memory;

pub use json_store::JsonStore;
pub use memory::MemoryStore;

/// Everything that survives a restart: the task collection and the balance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub balance: u64,
}

/// Load/save boundary between the task store and wherever state lives.
pub trait Persistence {
    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<TaskState>, AppError>;

    fn save(&mut self, tasks: &[Task], balance: u64) -> Result<(), AppError>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn load(&self) -> Result<Option<TaskState>, AppError> {
        (**self).load()
    }

    fn save(&mut self, tasks: &[Task], balance: u64) -> Result<(), AppError> {
        (**self).save(tasks, balance)
    }
}
