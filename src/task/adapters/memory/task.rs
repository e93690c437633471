//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{Page, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::user::domain::UserId;

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    owner_index: HashMap<UserId, Vec<TaskId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Orders tasks newest first and cuts out the requested window.
fn paginate(mut tasks: Vec<Task>, page: Page) -> Vec<Task> {
    tasks.sort_by_key(|task| (Reverse(task.created_at()), Reverse(task.id().into_inner())));
    tasks
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect()
}

fn matching(state: &InMemoryTaskState, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
    let mut tasks: Vec<Task> = state
        .tasks
        .values()
        .filter(|task| predicate(task))
        .cloned()
        .collect();
    tasks.sort_by_key(Task::created_at);
    tasks
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write_state()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state
            .owner_index
            .entry(task.owner_id())
            .or_default()
            .push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: UserId, page: Page) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state()?;
        let owned = state
            .owner_index
            .get(&owner)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(paginate(owned, page))
    }

    async fn find_open(&self, now: DateTime<Utc>, page: Page) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state()?;
        let open = matching(&state, |task| {
            task.status() == TaskStatus::Open && !task.schedule().claim_deadline_passed(now)
        });
        Ok(paginate(open, page))
    }

    async fn update_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let mut state = self.write_state()?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        let actual = task.status();
        let conflict = TaskRepositoryError::StatusConflict {
            task_id: id,
            expected,
            actual,
        };
        if actual != expected {
            return Err(conflict);
        }
        task.transition_at(next, at).map_err(|_| conflict)?;
        Ok(task.clone())
    }

    async fn set_escrow_locked(
        &self,
        id: TaskId,
        locked: bool,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let mut state = self.write_state()?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        task.set_escrow_locked(locked, at);
        Ok(task.clone())
    }

    async fn find_past_claim_deadline(
        &self,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state()?;
        Ok(matching(&state, |task| task.should_auto_cancel(now)))
    }

    async fn find_past_owner_deadline(
        &self,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state()?;
        Ok(matching(&state, |task| task.is_past_owner_deadline(now)))
    }
}
