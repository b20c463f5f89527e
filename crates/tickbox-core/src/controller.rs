use std::sync::mpsc::Receiver;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::collection::{CollectionEvent, TaskCollection};
use crate::edit::{EditSession, RowAnchor};
use crate::error::ControllerError;
use crate::label::Label;
use crate::ports::{Navigation, TaskStore, View};
use crate::view_state::ViewState;

/// Key released in the new-task field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

/// What the host should do with the new-task field afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    Clear,
    Keep,
}

/// Part of a list row that received a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRole {
    Delete,
    Toggle,
    Label,
    Other,
}

pub struct TodoController<S, N, V> {
    store: S,
    navigation: N,
    view: V,
    tasks: TaskCollection,
    events: Receiver<CollectionEvent>,
    edit: EditSession,
}

impl<S, N, V> TodoController<S, N, V>
where
    S: TaskStore,
    N: Navigation,
    V: View,
{
    pub fn new(store: S, navigation: N, view: V) -> Self {
        let mut tasks = TaskCollection::new();
        let events = tasks.subscribe();
        Self {
            store,
            navigation,
            view,
            tasks,
            events,
            edit: EditSession::default(),
        }
    }

    /// Loads persisted tasks and publishes the initial view state.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> anyhow::Result<()> {
        let loaded = self.store.load()?;
        info!(count = loaded.len(), "controller starting");
        self.tasks.load(loaded);
        self.reapply_filter();
        self.publish();
        Ok(())
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::derive(self.tasks.counts(), self.navigation.active_filter_token())
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    pub fn new_task_key(&mut self, value: &str, key: Key) -> FieldAction {
        if key != Key::Enter {
            return FieldAction::Keep;
        }
        let Some(label) = Label::parse(value) else {
            debug!("ignoring blank new task");
            return FieldAction::Keep;
        };

        self.tasks.add(label, Utc::now());
        self.sync();
        self.reapply_filter();
        self.publish();
        FieldAction::Clear
    }

    #[instrument(skip(self), fields(task = %task))]
    pub fn item_clicked(&mut self, task: Uuid, role: ItemRole) -> Result<(), ControllerError> {
        let current = self
            .tasks
            .get(task)
            .map(|found| found.completed)
            .ok_or(ControllerError::UnknownTask(task))?;

        match role {
            ItemRole::Delete => self.tasks.remove(task)?,
            ItemRole::Toggle => self.tasks.set_completed(task, !current, Utc::now())?,
            ItemRole::Label | ItemRole::Other => return Ok(()),
        }

        self.sync();
        self.reapply_filter();
        self.publish();
        Ok(())
    }

    #[instrument(skip(self), fields(task = %task))]
    pub fn item_double_clicked(
        &mut self,
        task: Uuid,
        role: ItemRole,
    ) -> Result<(), ControllerError> {
        if role != ItemRole::Label {
            return Ok(());
        }

        let initial = self
            .tasks
            .get(task)
            .map(|found| found.editable_label())
            .ok_or(ControllerError::UnknownTask(task))?;

        let anchor = RowAnchor { task };
        self.edit.begin(task, anchor)?;
        self.view.set_toggle_visible(anchor, false);
        self.view.start_edit(anchor, &initial);
        Ok(())
    }

    /// The host calls this after the active route changes.
    #[instrument(skip(self))]
    pub fn navigation_changed(&mut self) {
        self.reapply_filter();
        self.publish();
    }

    #[instrument(skip(self))]
    pub fn edit_canceled(&mut self) {
        if let Some(anchor) = self.edit.cancel() {
            self.view.set_toggle_visible(anchor, true);
        }
    }

    /// Blank text deletes the task being edited.
    #[instrument(skip(self, text))]
    pub fn edit_completed(&mut self, text: &str) -> Result<(), ControllerError> {
        let Some(commit) = self.edit.commit(text) else {
            debug!("no edit in progress");
            return Ok(());
        };

        self.view.set_toggle_visible(commit.anchor, true);

        let result = self
            .tasks
            .set_label(commit.task, &commit.text, Utc::now())
            .map(|_| ());

        self.sync();
        self.publish();
        result
    }

    #[instrument(skip(self))]
    pub fn clear_completed(&mut self) -> Result<usize, ControllerError> {
        let done = self.tasks.completed_uuids();
        let removed = self.tasks.remove_many(&done)?;
        info!(removed, "cleared completed tasks");
        self.sync();
        self.publish();
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn toggle_all(&mut self, value: bool) {
        self.tasks.bulk_set_completed(value, Utc::now());
        self.sync();
        self.reapply_filter();
        self.publish();
    }

    /// Pushes pending writes to the store. Failures are reported to the view
    /// and the writes stay pending; in-memory state is kept either way.
    #[instrument(skip(self))]
    pub fn sync(&mut self) -> bool {
        let changes = self.tasks.pending_changes();
        if changes.is_empty() {
            debug!("nothing to sync");
            return true;
        }

        match self.store.sync(&changes) {
            Ok(()) => {
                self.tasks.mark_synced(&changes);
                debug!(
                    created = changes.created.len(),
                    updated = changes.updated.len(),
                    deleted = changes.deleted.len(),
                    "synced"
                );
                true
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(error = %message, "sync failed; keeping local changes");
                self.view.persistence_failed(&message);
                false
            }
        }
    }

    pub fn teardown(self) -> (S, N, V) {
        (self.store, self.navigation, self.view)
    }

    fn reapply_filter(&mut self) {
        let token = self.navigation.active_filter_token();
        self.tasks.apply_filter(token);
    }

    /// Drains collection events and, if any arrived, pushes the derived state.
    fn publish(&mut self) {
        if self.tasks.filter() != self.navigation.active_filter_token() {
            debug!("route moved since the last filter pass");
            self.reapply_filter();
        }

        let pending = self.events.try_iter().count();
        if pending == 0 {
            return;
        }

        let state = self.view_state();
        self.view
            .set_toggle_all(state.toggle_all_visible, state.toggle_all_checked);
        self.view
            .set_clear_button(state.clear_button_visible, &state.clear_button_label);
        self.view.set_items_left(state.items_left);
        self.view.set_toolbar_visible(state.toolbar_visible);
        debug!(events = pending, "view indicators refreshed");
    }
}
