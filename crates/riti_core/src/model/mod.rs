mod task;

pub use task::{Recurrence, Task, TaskDraft};
