use tracing::{debug, info};

use crate::datetime::Clock;
use crate::editor::{Editor, Submitted, TaskForm};
use crate::error::Result;
use crate::render::Page;
use crate::storage::KeyValueStorage;
use crate::store::TaskStore;
use crate::view::View;

/// The operations a UI surface drives: one method per user event.
///
/// Each handler leaves the store persisted and returns the freshly built
/// page for the view that should be on screen afterwards.
#[derive(Debug)]
pub struct App<S, C> {
    store: TaskStore<S>,
    editor: Editor,
    clock: C,
    active: View,
}

impl<S, C> App<S, C>
where
    S: KeyValueStorage,
    C: Clock,
{
    pub fn new(store: TaskStore<S>, clock: C) -> Self {
        Self {
            store,
            editor: Editor::new(),
            clock,
            active: View::default(),
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TaskStore<S> {
        &mut self.store
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn active_view(&self) -> View {
        self.active
    }

    #[tracing::instrument(skip(self))]
    pub fn render_view(&mut self, view: View) -> Page {
        self.active = view;
        Page::build(self.store.tasks(), view, self.clock.today())
    }

    fn rerender(&mut self) -> Page {
        self.render_view(self.active)
    }

    #[tracing::instrument(skip(self))]
    pub fn handle_toggle_complete(&mut self, id: u64) -> Result<Page> {
        let changed = self.store.update(id, |task| task.completed = !task.completed)?;
        debug!(changed, "toggled completion");
        Ok(self.rerender())
    }

    #[tracing::instrument(skip(self))]
    pub fn handle_toggle_important(&mut self, id: u64) -> Result<Page> {
        let changed = self
            .store
            .update(id, |task| task.is_important = !task.is_important)?;
        debug!(changed, "toggled importance");
        Ok(self.rerender())
    }

    #[tracing::instrument(skip(self))]
    pub fn handle_delete(&mut self, id: u64) -> Result<Page> {
        let removed = self.store.delete_by_id(id)?;
        debug!(removed, "handled delete");
        Ok(self.rerender())
    }

    /// Opens the editor in create mode (`None`) or prefilled for `id`.
    /// Returns `false`, leaving the editor closed, when `id` is unknown.
    #[tracing::instrument(skip(self))]
    pub fn open_editor(&mut self, id: Option<u64>) -> bool {
        let origin = self.active;
        match id {
            None => {
                self.editor.open_create(origin);
                true
            }
            Some(id) => match self.store.find_by_id(id) {
                Some(task) => {
                    self.editor.open_edit(task, origin);
                    true
                }
                None => {
                    debug!(id, "cannot edit missing task");
                    false
                }
            },
        }
    }

    /// Commits `form`, then renders the view the editor was opened from.
    #[tracing::instrument(skip(self, form))]
    pub fn handle_form_submit(
        &mut self,
        form: TaskForm,
        editing_id: Option<u64>,
    ) -> Result<(Submitted, Page)> {
        self.editor.fill(form, editing_id);
        self.submit_editor()
    }

    /// Commits whatever the editor currently holds.
    pub fn submit_editor(&mut self) -> Result<(Submitted, Page)> {
        let origin = self.editor.origin();
        let outcome = self.editor.submit(&mut self.store, &self.clock)?;
        info!(?outcome, view = %origin, "form committed");
        Ok((outcome, self.render_view(origin)))
    }

    pub fn cancel_editor(&mut self) {
        self.editor.cancel();
    }
}
