use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::error::ControllerError;
use crate::filter::FilterToken;
use crate::label::Label;
use crate::task::Task;
use crate::view_state::ViewCounts;

/// Sent to every subscriber once a mutation has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    Loaded,
    Updated(Uuid),
    DataChanged,
}

/// Writes waiting to reach persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub created: Vec<Task>,
    pub updated: Vec<Task>,
    pub deleted: Vec<Uuid>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChange {
    Renamed,
    Unchanged,
    Removed,
}

#[derive(Debug, Default)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    filter: FilterToken,
    visible: HashSet<Uuid>,
    created: HashSet<Uuid>,
    updated: HashSet<Uuid>,
    deleted: Vec<Uuid>,
    subscribers: Vec<Sender<CollectionEvent>>,
    suspended: usize,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<CollectionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Replaces the contents with freshly loaded tasks and forgets pending writes.
    #[instrument(skip(self, tasks), fields(count = tasks.len()))]
    pub fn load(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.created.clear();
        self.updated.clear();
        self.deleted.clear();
        self.recompute_visible();
        debug!(total = self.tasks.len(), visible = self.visible.len(), "loaded tasks");
        self.emit(CollectionEvent::Loaded);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Visible tasks in display order.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(|task| self.visible.contains(&task.uuid))
    }

    pub fn get(&self, uuid: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.uuid == uuid)
    }

    pub fn filter(&self) -> FilterToken {
        self.filter
    }

    pub fn counts(&self) -> ViewCounts {
        ViewCounts {
            total: self.tasks.len(),
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            visible: self.visible.len(),
        }
    }

    pub fn completed_uuids(&self) -> Vec<Uuid> {
        self.tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.uuid)
            .collect()
    }

    #[instrument(skip(self, label, now), fields(label = %label))]
    pub fn add(&mut self, label: Label, now: DateTime<Utc>) -> Uuid {
        let task = Task::new(label, now);
        let uuid = task.uuid;

        if self.filter.matches(&task) {
            self.visible.insert(uuid);
        }
        self.created.insert(uuid);
        self.tasks.push(task);

        debug!(uuid = %uuid, total = self.tasks.len(), "task added");
        self.emit(CollectionEvent::DataChanged);
        uuid
    }

    #[instrument(skip(self, now), fields(uuid = %uuid))]
    pub fn set_completed(
        &mut self,
        uuid: Uuid,
        value: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ControllerError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.uuid == uuid)
            .ok_or(ControllerError::UnknownTask(uuid))?;

        if task.completed == value {
            trace!(value, "completion unchanged");
            return Ok(());
        }

        task.completed = value;
        task.touch(now);
        self.updated.insert(uuid);
        debug!(value, "completion set");
        self.emit(CollectionEvent::Updated(uuid));
        Ok(())
    }

    pub fn remove(&mut self, uuid: Uuid) -> Result<(), ControllerError> {
        self.remove_many(&[uuid]).map(|_| ())
    }

    /// Removes a batch; fails before touching anything if one uuid is unknown.
    #[instrument(skip(self, uuids), fields(count = uuids.len()))]
    pub fn remove_many(&mut self, uuids: &[Uuid]) -> Result<usize, ControllerError> {
        if let Some(missing) = uuids.iter().find(|uuid| self.get(**uuid).is_none()) {
            return Err(ControllerError::UnknownTask(*missing));
        }
        if uuids.is_empty() {
            return Ok(0);
        }

        let doomed: HashSet<Uuid> = uuids.iter().copied().collect();
        self.tasks.retain(|task| !doomed.contains(&task.uuid));

        for uuid in &doomed {
            self.visible.remove(uuid);
            self.updated.remove(uuid);
            // Never persisted, so there is nothing to delete downstream.
            if !self.created.remove(uuid) {
                self.deleted.push(*uuid);
            }
        }

        debug!(removed = doomed.len(), total = self.tasks.len(), "tasks removed");
        self.emit(CollectionEvent::DataChanged);
        Ok(doomed.len())
    }

    /// Blank text after trimming removes the task instead.
    #[instrument(skip(self, raw, now), fields(uuid = %uuid))]
    pub fn set_label(
        &mut self,
        uuid: Uuid,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<LabelChange, ControllerError> {
        let Some(label) = Label::parse(raw) else {
            debug!("blank label; removing task");
            self.remove(uuid)?;
            return Ok(LabelChange::Removed);
        };

        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.uuid == uuid)
            .ok_or(ControllerError::UnknownTask(uuid))?;

        if task.label == label.as_str() {
            return Ok(LabelChange::Unchanged);
        }

        task.label = label.into_inner();
        task.touch(now);
        self.updated.insert(uuid);
        self.emit(CollectionEvent::Updated(uuid));
        Ok(LabelChange::Renamed)
    }

    /// Sets every task, filtered out or not, and notifies once.
    #[instrument(skip(self, now))]
    pub fn bulk_set_completed(&mut self, value: bool, now: DateTime<Utc>) {
        self.suspend_events();

        let mut changed = 0;
        for task in self.tasks.iter_mut().filter(|task| task.completed != value) {
            task.completed = value;
            task.touch(now);
            self.updated.insert(task.uuid);
            changed += 1;
        }

        self.resume_events();
        debug!(changed, total = self.tasks.len(), "bulk completion applied");
        self.emit(CollectionEvent::DataChanged);
    }

    #[instrument(skip(self))]
    pub fn apply_filter(&mut self, token: FilterToken) {
        self.filter = token;
        self.recompute_visible();
        debug!(visible = self.visible.len(), "filter applied");
        self.emit(CollectionEvent::DataChanged);
    }

    pub fn suspend_events(&mut self) {
        self.suspended += 1;
    }

    pub fn resume_events(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
    }

    pub fn has_pending_changes(&self) -> bool {
        !(self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty())
    }

    pub fn pending_changes(&self) -> ChangeSet {
        let created = self
            .tasks
            .iter()
            .filter(|task| self.created.contains(&task.uuid))
            .cloned()
            .collect();
        let updated = self
            .tasks
            .iter()
            .filter(|task| self.updated.contains(&task.uuid) && !self.created.contains(&task.uuid))
            .cloned()
            .collect();

        ChangeSet {
            created,
            updated,
            deleted: self.deleted.clone(),
        }
    }

    /// Drops the writes in `changes` from the pending set after a successful sync.
    pub fn mark_synced(&mut self, changes: &ChangeSet) {
        for task in &changes.created {
            self.created.remove(&task.uuid);
            self.updated.remove(&task.uuid);
        }
        for task in &changes.updated {
            self.updated.remove(&task.uuid);
        }
        self.deleted.retain(|uuid| !changes.deleted.contains(uuid));
    }

    fn recompute_visible(&mut self) {
        let filter = self.filter;
        self.visible = self
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .map(|task| task.uuid)
            .collect();
    }

    fn emit(&mut self, event: CollectionEvent) {
        if self.suspended > 0 {
            trace!(?event, "events suspended; dropping");
            return;
        }
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
