use crate::error::AppError;
use crate::model::{Recurrence, Task, TaskDraft};
use crate::recurrence::next_due_date;
use crate::storage::Persistence;
use time::OffsetDateTime;

/// Result of a mutation that was applied in memory.
///
/// `save_error` is set when writing the new state back failed. The change
/// still stands for the lifetime of the store, it just may not survive a
/// restart.
#[derive(Debug)]
pub struct Saved<T> {
    pub outcome: T,
    pub save_error: Option<AppError>,
}

impl<T> Saved<T> {
    fn unsaved(outcome: T) -> Self {
        Self {
            outcome,
            save_error: None,
        }
    }

    pub fn is_durable(&self) -> bool {
        self.save_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(Task),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Task),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteOutcome {
    Completed {
        task: Task,
        successor: Option<Task>,
    },
    NotFound,
    AlreadyCompleted,
}

impl EditOutcome {
    pub fn into_result(self, id: &str) -> Result<Task, AppError> {
        match self {
            Self::Updated(task) => Ok(task),
            Self::NotFound => Err(AppError::not_found(id)),
        }
    }
}

impl DeleteOutcome {
    pub fn into_result(self, id: &str) -> Result<Task, AppError> {
        match self {
            Self::Deleted(task) => Ok(task),
            Self::NotFound => Err(AppError::not_found(id)),
        }
    }
}

impl CompleteOutcome {
    pub fn into_result(self, id: &str) -> Result<(Task, Option<Task>), AppError> {
        match self {
            Self::Completed { task, successor } => Ok((task, successor)),
            Self::NotFound => Err(AppError::not_found(id)),
            Self::AlreadyCompleted => Err(AppError::invalid_state(format!(
                "task {id} is already completed"
            ))),
        }
    }
}

/// The authoritative in-memory task collection and currency balance.
///
/// Every applied mutation writes the full state through `P`.
#[derive(Debug)]
pub struct TaskStore<P: Persistence> {
    tasks: Vec<Task>,
    balance: u64,
    persistence: P,
}

impl<P: Persistence> TaskStore<P> {
    pub fn open(persistence: P) -> Result<Self, AppError> {
        let state = persistence.load()?.unwrap_or_default();
        tracing::debug!(
            tasks = state.tasks.len(),
            balance = state.balance,
            "opened task store"
        );
        Ok(Self {
            tasks: state.tasks,
            balance: state.balance,
            persistence,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn add(&mut self, draft: TaskDraft) -> Saved<Task> {
        let task = Task::from_draft(self.fresh_id(), draft);
        self.tasks.push(task.clone());
        tracing::info!(id = %task.id, title = %task.title, "added task");
        self.persist(task)
    }

    /// Replaces the task carrying the same id, keeping its position.
    pub fn edit(&mut self, task: Task) -> Saved<EditOutcome> {
        let Some(slot) = self.tasks.iter_mut().find(|existing| existing.id == task.id) else {
            return Saved::unsaved(EditOutcome::NotFound);
        };

        *slot = task.clone();
        tracing::info!(id = %task.id, "edited task");
        self.persist(EditOutcome::Updated(task))
    }

    pub fn delete(&mut self, id: &str) -> Saved<DeleteOutcome> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Saved::unsaved(DeleteOutcome::NotFound);
        };

        let removed = self.tasks.remove(index);
        tracing::info!(id = %removed.id, "deleted task");
        self.persist(DeleteOutcome::Deleted(removed))
    }

    pub fn complete(&mut self, id: &str, proof_image: String) -> Saved<CompleteOutcome> {
        self.complete_at(id, proof_image, OffsetDateTime::now_utc())
    }

    /// Completes a task as of `now`, crediting its reward and spawning the
    /// next occurrence of a recurring task.
    pub fn complete_at(
        &mut self,
        id: &str,
        proof_image: String,
        now: OffsetDateTime,
    ) -> Saved<CompleteOutcome> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Saved::unsaved(CompleteOutcome::NotFound);
        };
        if self.tasks[index].completed {
            return Saved::unsaved(CompleteOutcome::AlreadyCompleted);
        }

        let successor = self.successor_of(&self.tasks[index]);

        let task = &mut self.tasks[index];
        task.completed = true;
        task.completed_at = Some(now);
        task.proof_image = Some(proof_image);
        let task = task.clone();

        self.balance = self.balance.saturating_add(u64::from(task.reward));
        tracing::info!(
            id = %task.id,
            reward = task.reward,
            balance = self.balance,
            "completed task"
        );

        if let Some(next) = successor.as_ref() {
            tracing::info!(id = %next.id, due_date = %next.due_date, "scheduled next occurrence");
            self.tasks.push(next.clone());
        }

        self.persist(CompleteOutcome::Completed { task, successor })
    }

    /// Drops every task and zeroes the balance. Returns how many tasks were removed.
    pub fn reset(&mut self) -> Saved<usize> {
        let removed = self.tasks.len();
        self.tasks.clear();
        self.balance = 0;
        tracing::info!(removed, "reset all data");
        self.persist(removed)
    }

    pub fn by_category(&self, unit: Recurrence) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.recurrence == unit && !task.completed)
            .collect()
    }

    pub fn completed_list(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.completed).collect()
    }

    pub fn upcoming(&self) -> Vec<&Task> {
        self.upcoming_after(OffsetDateTime::now_utc())
    }

    /// Pending tasks due strictly after `now`, soonest first.
    pub fn upcoming_after(&self, now: OffsetDateTime) -> Vec<&Task> {
        let mut upcoming: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| !task.completed && task.due_date > now)
            .collect();
        upcoming.sort_by_key(|task| task.due_date);
        upcoming
    }

    fn successor_of(&self, task: &Task) -> Option<Task> {
        let interval = task.successor_interval()?;
        let Some(due_date) = next_due_date(task.due_date, task.recurrence, interval) else {
            tracing::warn!(
                id = %task.id,
                due_date = %task.due_date,
                interval,
                "next due date out of range, not scheduling another occurrence"
            );
            return None;
        };

        Some(Task {
            id: self.fresh_id(),
            due_date,
            completed: false,
            completed_at: None,
            proof_image: None,
            ..task.clone()
        })
    }

    fn fresh_id(&self) -> String {
        let base = format!("task-{}", OffsetDateTime::now_utc().unix_timestamp_nanos());
        if self.get(&base).is_none() {
            return base;
        }

        let mut suffix = 1u32;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn persist<T>(&mut self, outcome: T) -> Saved<T> {
        let save_error = match self.persistence.save(&self.tasks, self.balance) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist task state");
                Some(err)
            }
        };
        Saved {
            outcome,
            save_error,
        }
    }
}
