//! The add/edit task form and the rules applied when it is submitted.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::datetime::{Clock, format_date, parse_date};
use crate::error::{Result, TaskError};
use crate::storage::KeyValueStorage;
use crate::store::TaskStore;
use crate::task::{MAX_TAGS, Priority, Status, Task};
use crate::view::View;

/// Raw field values as typed into the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
    pub tags: String,
    pub status: Status,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.map(format_date).unwrap_or_default(),
            priority: task.priority,
            tags: task.tags.join(", "),
            status: task.status,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_due_today(&mut self, clock: &impl Clock) {
        self.due_date = format_date(clock.today());
    }

    pub fn set_due_tomorrow(&mut self, clock: &impl Clock) {
        self.due_date = format_date(clock.tomorrow());
    }

    /// Builds the task this form describes.
    ///
    /// A blank due date means `today`. `completed` follows `status` and
    /// `is_important` follows `priority`; neither keeps a previous value.
    pub fn to_task(&self, id: u64, today: NaiveDate) -> Result<Task> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TaskError::Validation("title cannot be empty".to_string()));
        }

        let due_date = if self.due_date.trim().is_empty() {
            today
        } else {
            parse_date(&self.due_date).ok_or_else(|| {
                TaskError::Validation(format!(
                    "due date must be YYYY-MM-DD, got {:?}",
                    self.due_date
                ))
            })?
        };

        Ok(Task {
            id,
            title: title.to_string(),
            description: self.description.trim().to_string(),
            due_date: Some(due_date),
            priority: self.priority,
            tags: parse_tags(&self.tags),
            completed: self.status == Status::Done,
            is_important: self.priority == Priority::High,
            status: self.status,
        })
    }
}

/// Splits comma-separated tag text, dropping blanks and keeping at most
/// [`MAX_TAGS`] entries.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Created(u64),
    Updated(u64),
    /// The task being edited no longer exists; nothing was written.
    Dropped(u64),
}

#[derive(Debug, Default)]
pub struct Editor {
    form: TaskForm,
    editing_id: Option<u64>,
    origin: View,
    open: bool,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    pub fn editing_id(&self) -> Option<u64> {
        self.editing_id
    }

    pub fn origin(&self) -> View {
        self.origin
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens the form in create mode.
    pub fn open_create(&mut self, origin: View) {
        self.editing_id = None;
        self.origin = origin;
        self.open = true;
    }

    /// Opens the form prefilled from `task`.
    pub fn open_edit(&mut self, task: &Task, origin: View) {
        self.form = TaskForm::from_task(task);
        self.editing_id = Some(task.id);
        self.origin = origin;
        self.open = true;
    }

    /// Replaces the form contents, as when a surface submits its own fields.
    pub fn fill(&mut self, form: TaskForm, editing_id: Option<u64>) {
        self.form = form;
        self.editing_id = editing_id;
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.form.reset();
        self.editing_id = None;
        self.open = false;
    }

    /// Validates the form and writes it to `store`.
    ///
    /// On a validation error nothing changes and the form stays as typed.
    /// Otherwise the form is reset and closed, even when the write to
    /// storage fails, because the in-memory collection already holds the
    /// change.
    #[tracing::instrument(skip(self, store, clock), fields(editing_id = ?self.editing_id))]
    pub fn submit<S, C>(&mut self, store: &mut TaskStore<S>, clock: &C) -> Result<Submitted>
    where
        S: KeyValueStorage,
        C: Clock,
    {
        let id = match self.editing_id {
            Some(id) => id,
            None => store.next_id(clock.now_millis()),
        };
        let task = self.form.to_task(id, clock.today())?;

        let result = match self.editing_id {
            Some(id) => match store.replace(id, task) {
                Ok(()) => Ok(Submitted::Updated(id)),
                Err(TaskError::NotFound(id)) => {
                    debug!(id, "edited task no longer exists; dropping submission");
                    Ok(Submitted::Dropped(id))
                }
                Err(err) => Err(err),
            },
            None => store.push(task).map(|()| Submitted::Created(id)),
        };

        if matches!(result, Ok(_) | Err(TaskError::Storage(_))) {
            self.close();
        }
        if let Ok(outcome) = &result {
            info!(?outcome, "task form submitted");
        }
        result
    }
}
