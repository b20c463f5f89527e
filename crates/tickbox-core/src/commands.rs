use std::collections::HashSet;

use anyhow::anyhow;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cli::Command;
use crate::collection::TaskCollection;
use crate::controller::{FieldAction, ItemRole, Key, TodoController};
use crate::datastore::DataStore;
use crate::edit::RowAnchor;
use crate::filter::FilterToken;
use crate::ports::{InlineEditor, ListView, Navigation, Notifier, ViewIndicators};
use crate::render::Renderer;
use crate::view_state::ViewState;

/// Navigation for a one-shot invocation: the token never changes.
#[derive(Debug, Clone, Copy)]
pub struct FixedNavigation(pub FilterToken);

impl Navigation for FixedNavigation {
    fn active_filter_token(&self) -> FilterToken {
        self.0
    }
}

/// Records what a graphical view would display so it can be printed at the end.
#[derive(Debug, Default)]
pub struct TerminalView {
    pub state: ViewState,
    pub failures: Vec<String>,
    pub hidden_toggles: HashSet<Uuid>,
    pub editing: Option<(RowAnchor, String)>,
}

impl ViewIndicators for TerminalView {
    fn set_toggle_all(&mut self, visible: bool, checked: bool) {
        self.state.toggle_all_visible = visible;
        self.state.toggle_all_checked = checked;
    }

    fn set_clear_button(&mut self, visible: bool, label: &str) {
        self.state.clear_button_visible = visible;
        self.state.clear_button_label = label.to_string();
    }

    fn set_items_left(&mut self, count: usize) {
        self.state.items_left = count;
    }

    fn set_toolbar_visible(&mut self, visible: bool) {
        self.state.toolbar_visible = visible;
    }
}

impl InlineEditor for TerminalView {
    fn start_edit(&mut self, anchor: RowAnchor, initial_text: &str) {
        debug!(task = %anchor.task, initial = %initial_text, "editor opened");
        self.editing = Some((anchor, initial_text.to_string()));
    }
}

impl ListView for TerminalView {
    fn set_toggle_visible(&mut self, anchor: RowAnchor, visible: bool) {
        if visible {
            self.hidden_toggles.remove(&anchor.task);
            if self.editing.as_ref().is_some_and(|(open, _)| *open == anchor) {
                self.editing = None;
            }
        } else {
            self.hidden_toggles.insert(anchor.task);
        }
    }
}

impl Notifier for TerminalView {
    fn persistence_failed(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }
}

pub type CliController = TodoController<DataStore, FixedNavigation, TerminalView>;

#[instrument(skip(store, renderer))]
pub fn dispatch(
    store: DataStore,
    renderer: &mut Renderer,
    filter: FilterToken,
    command: Command,
) -> anyhow::Result<()> {
    let mut controller = TodoController::new(store, FixedNavigation(filter), TerminalView::default());
    controller.start()?;

    debug!(?command, "dispatching command");

    match command {
        Command::List => {}
        Command::Add { words } => cmd_add(&mut controller, &words),
        Command::Toggle { task } => {
            let uuid = resolve_task_ref(controller.tasks(), &task)?;
            controller.item_clicked(uuid, ItemRole::Toggle)?;
        }
        Command::Delete { task } => {
            let uuid = resolve_task_ref(controller.tasks(), &task)?;
            controller.item_clicked(uuid, ItemRole::Delete)?;
        }
        Command::Edit { task, words } => {
            let uuid = resolve_task_ref(controller.tasks(), &task)?;
            controller.item_double_clicked(uuid, ItemRole::Label)?;
            controller.edit_completed(&words.join(" "))?;
        }
        Command::ClearCompleted => {
            let removed = controller.clear_completed()?;
            info!(removed, "clear-completed finished");
        }
        Command::ToggleAll { state } => controller.toggle_all(state.as_bool()),
    }

    let rows: Vec<_> = controller
        .tasks()
        .visible_tasks()
        .enumerate()
        .map(|(idx, task)| (idx + 1, task))
        .collect();
    renderer.print_tasks(&rows)?;
    renderer.print_footer(&controller.view().state, filter)?;
    for failure in &controller.view().failures {
        renderer.print_warning(failure)?;
    }

    Ok(())
}

fn cmd_add(controller: &mut CliController, words: &[String]) {
    let text = words.join(" ");
    if controller.new_task_key(&text, Key::Enter) == FieldAction::Keep {
        warn!("blank label; nothing added");
    }
}

/// Resolves a 1-based position in the visible list, or a uuid prefix.
pub fn resolve_task_ref(tasks: &TaskCollection, reference: &str) -> anyhow::Result<Uuid> {
    let reference = reference.trim();

    if let Ok(position) = reference.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|idx| tasks.visible_tasks().nth(idx))
            .map(|task| task.uuid)
            .ok_or_else(|| anyhow!("no visible task at position {position}"));
    }

    let prefix = reference.to_ascii_lowercase();
    if prefix.is_empty() {
        return Err(anyhow!("task reference cannot be empty"));
    }

    let mut matches = tasks
        .tasks()
        .iter()
        .filter(|task| task.uuid.to_string().starts_with(&prefix));
    let first = matches
        .next()
        .ok_or_else(|| anyhow!("no task matches {reference}"))?;
    if matches.next().is_some() {
        return Err(anyhow!("task reference {reference} is ambiguous"));
    }
    Ok(first.uuid)
}
