use super::{Persistence, TaskState};
use crate::error::AppError;
use crate::model::Task;

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Option<TaskState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: TaskState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&TaskState> {
        self.state.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Result<Option<TaskState>, AppError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, tasks: &[Task], balance: u64) -> Result<(), AppError> {
        self.state = Some(TaskState {
            tasks: tasks.to_vec(),
            balance,
        });
        self.saves += 1;
        Ok(())
    }
}
