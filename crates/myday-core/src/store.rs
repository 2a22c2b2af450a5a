use tracing::{debug, info, warn};

use crate::datetime::Clock;
use crate::error::{Result, TaskError};
use crate::storage::KeyValueStorage;
use crate::task::{Priority, Status, Task};

pub const DEFAULT_STORAGE_KEY: &str = "allTasks";

/// The ordered task collection and the storage slot it is mirrored to.
///
/// Every mutating method writes the whole collection back before it
/// returns. A failed write is reported as [`TaskError::Storage`] but the
/// in-memory change is kept.
#[derive(Debug)]
pub struct TaskStore<S> {
    storage: S,
    key: String,
    tasks: Vec<Task>,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Reads the collection from `storage`. An empty slot is seeded with
    /// the default tasks and persisted; an undecodable slot is seeded in
    /// memory only, leaving the stored payload for the next write.
    #[tracing::instrument(skip(storage, key, clock))]
    pub fn load(storage: S, key: impl Into<String>, clock: &impl Clock) -> Result<Self> {
        let key = key.into();
        let raw = storage.get_item(&key)?;

        let mut store = Self {
            storage,
            key,
            tasks: vec![],
        };

        match raw {
            Some(raw) => match deserialize_tasks(&raw) {
                Ok(tasks) => {
                    info!(count = tasks.len(), key = %store.key, "loaded tasks");
                    store.tasks = tasks;
                }
                Err(err) => {
                    warn!(error = %err, key = %store.key, "stored tasks are unreadable; using defaults");
                    store.tasks = seed_tasks(clock);
                }
            },
            None => {
                info!(key = %store.key, "no stored tasks; seeding defaults");
                store.tasks = seed_tasks(clock);
                if let Err(err) = store.save() {
                    warn!(error = %err, "failed to persist seeded tasks");
                }
            }
        }

        Ok(store)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    #[tracing::instrument(skip(self), fields(key = %self.key, count = self.tasks.len()))]
    pub fn save(&mut self) -> Result<()> {
        let payload = serialize_tasks(&self.tasks)?;
        self.storage.set_item(&self.key, &payload)
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// A fresh id derived from `now_millis`, bumped past every existing id.
    pub fn next_id(&self, now_millis: u64) -> u64 {
        let floor = self
            .tasks
            .iter()
            .map(|t| t.id)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        now_millis.max(floor)
    }

    #[tracing::instrument(skip(self, task), fields(id = task.id))]
    pub fn push(&mut self, task: Task) -> Result<()> {
        if self.find_by_id(task.id).is_some() {
            return Err(TaskError::Validation(format!("duplicate task id {}", task.id)));
        }
        task.validate()?;
        self.tasks.push(task);
        debug!(count = self.tasks.len(), "task appended");
        self.save()
    }

    /// Replaces the task with `id` in place, keeping its position.
    #[tracing::instrument(skip(self, task))]
    pub fn replace(&mut self, id: u64, mut task: Task) -> Result<()> {
        let idx = self.position(id).ok_or(TaskError::NotFound(id))?;
        task.id = id;
        task.validate()?;
        self.tasks[idx] = task;
        debug!(index = idx, "task replaced");
        self.save()
    }

    /// Applies `f` to the task with `id`. Returns `Ok(false)` without
    /// writing when no such task exists.
    #[tracing::instrument(skip(self, f))]
    pub fn update<F>(&mut self, id: u64, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Task),
    {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!("update target missing; ignoring");
            return Ok(false);
        };
        f(task);
        self.save()?;
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_by_id(&mut self, id: u64) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!("delete target missing; ignoring");
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}

pub fn serialize_tasks(tasks: &[Task]) -> Result<String> {
    serde_json::to_string_pretty(tasks).map_err(|err| TaskError::Storage(err.to_string()))
}

/// Decodes a stored collection, rejecting payloads that break the store
/// invariants (duplicate ids, blank titles, too many tags).
pub fn deserialize_tasks(raw: &str) -> Result<Vec<Task>> {
    let tasks: Vec<Task> =
        serde_json::from_str(raw).map_err(|err| TaskError::Deserialization(err.to_string()))?;

    let mut seen = std::collections::HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(TaskError::Deserialization(format!("duplicate task id {}", task.id)));
        }
        task.validate()
            .map_err(|err| TaskError::Deserialization(err.to_string()))?;
    }

    Ok(tasks)
}

pub fn seed_tasks(clock: &impl Clock) -> Vec<Task> {
    let today = clock.today();
    let now = clock.now_millis();

    let mut meeting = Task::new(now, "Client meeting preparation");
    meeting.due_date = Some(today);
    meeting.priority = Priority::High;
    meeting.tags = vec!["Work".to_string()];
    meeting.is_important = true;
    meeting.status = Status::ToDo;

    let mut campus = Task::new(now.saturating_add(1), "Front End Campus");
    campus.due_date = Some(today);
    campus.priority = Priority::Medium;
    campus.tags = vec!["Work".to_string()];

    vec![meeting, campus]
}
