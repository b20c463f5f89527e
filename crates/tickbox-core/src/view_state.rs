use serde::Serialize;

use crate::filter::FilterToken;

/// Aggregate counts taken from a collection snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewCounts {
    pub total: usize,
    pub completed: usize,
    pub visible: usize,
}

/// Everything the footer and the toggle-all control display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub clear_button_label: String,
    pub clear_button_visible: bool,
    pub toggle_all_visible: bool,
    pub toggle_all_checked: bool,
    pub toolbar_visible: bool,
    pub items_left: usize,
}

impl ViewState {
    pub fn derive(counts: ViewCounts, token: FilterToken) -> Self {
        let ViewCounts {
            total,
            completed,
            visible,
        } = counts;

        let clear_button_label = if completed == 0 {
            String::new()
        } else {
            format!("Clear completed ({completed})")
        };

        // Reads as checked on a non-empty completed view as well as when
        // literally everything is done (including the empty list).
        let toggle_all_checked =
            (token == FilterToken::Completed && visible > 0) || completed == total;

        Self {
            clear_button_label,
            clear_button_visible: completed > 0,
            toggle_all_visible: total > 0,
            toggle_all_checked,
            toolbar_visible: total > 0,
            items_left: total.saturating_sub(completed),
        }
    }
}
