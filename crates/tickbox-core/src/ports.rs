//! Collaborators the controller drives but does not implement.

use crate::collection::ChangeSet;
use crate::edit::RowAnchor;
use crate::filter::FilterToken;
use crate::task::Task;

pub trait TaskStore {
    fn load(&mut self) -> anyhow::Result<Vec<Task>>;

    /// Flushes pending writes. An error leaves the writes pending.
    fn sync(&mut self, changes: &ChangeSet) -> anyhow::Result<()>;
}

pub trait Navigation {
    fn active_filter_token(&self) -> FilterToken;
}

/// Setters for the derived indicators. Calling them redundantly is harmless.
pub trait ViewIndicators {
    fn set_toggle_all(&mut self, visible: bool, checked: bool);
    fn set_clear_button(&mut self, visible: bool, label: &str);
    fn set_items_left(&mut self, count: usize);
    fn set_toolbar_visible(&mut self, visible: bool);
}

pub trait InlineEditor {
    fn start_edit(&mut self, anchor: RowAnchor, initial_text: &str);
}

pub trait ListView {
    fn set_toggle_visible(&mut self, anchor: RowAnchor, visible: bool);
}

pub trait Notifier {
    fn persistence_failed(&mut self, message: &str);
}

pub trait View: ViewIndicators + InlineEditor + ListView + Notifier {}

impl<T> View for T where T: ViewIndicators + InlineEditor + ListView + Notifier {}
