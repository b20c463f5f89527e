use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::filter::FilterToken;
use crate::task::Task;
use crate::view_state::ViewState;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.get_bool("color").unwrap_or(true),
        }
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_tasks(&mut self, rows: &[(usize, &Task)]) -> anyhow::Result<()> {
        let color = self.color && io::stdout().is_terminal();
        let mut out = io::stdout().lock();
        write_tasks(&mut out, rows, color)
    }

    #[tracing::instrument(skip(self, state))]
    pub fn print_footer(&mut self, state: &ViewState, filter: FilterToken) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        write_footer(&mut out, state, filter)
    }

    pub fn print_warning(&mut self, message: &str) -> anyhow::Result<()> {
        let color = self.color && io::stderr().is_terminal();
        let mut err = io::stderr().lock();
        writeln!(err, "{}", paint(&format!("warning: {message}"), "33", color))?;
        Ok(())
    }
}

fn write_tasks<W: Write>(writer: W, rows: &[(usize, &Task)], color: bool) -> anyhow::Result<()> {
    let headers = vec![
        "#".to_string(),
        "Done".to_string(),
        "Label".to_string(),
        "UUID".to_string(),
    ];

    let rows = rows
        .iter()
        .map(|(position, task)| {
            let mark = if task.completed {
                paint("[x]", "32", color)
            } else {
                "[ ]".to_string()
            };
            let short_uuid: String = task.uuid.to_string().chars().take(8).collect();
            vec![
                paint(&position.to_string(), "33", color),
                mark,
                task.editable_label(),
                short_uuid,
            ]
        })
        .collect();

    write_table(writer, headers, rows)
}

fn write_footer<W: Write>(
    mut writer: W,
    state: &ViewState,
    filter: FilterToken,
) -> anyhow::Result<()> {
    if !state.toolbar_visible {
        writeln!(writer, "No tasks.")?;
        return Ok(());
    }

    let noun = if state.items_left == 1 { "item" } else { "items" };
    let mut parts = vec![format!("{} {noun} left", state.items_left)];
    parts.push(format!("filter: {filter}"));
    if state.toggle_all_visible {
        let mark = if state.toggle_all_checked { "x" } else { " " };
        parts.push(format!("[{mark}] toggle all"));
    }
    if state.clear_button_visible {
        parts.push(state.clear_button_label.clone());
    }

    writeln!(writer)?;
    writeln!(writer, "{}", parts.join(" | "))?;
    Ok(())
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{Renderer, strip_ansi, write_footer, write_tasks};
    use crate::config::Config;
    use crate::filter::FilterToken;
    use crate::label::Label;
    use crate::task::Task;
    use crate::view_state::{ViewCounts, ViewState};

    #[test]
    fn task_rows_show_unescaped_labels() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let mut done = Task::new(Label::parse("fish & chips").unwrap(), now);
        done.completed = true;

        let mut out = Vec::new();
        write_tasks(&mut out, &[(1, &done)], false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("[x]"));
        assert!(text.contains("fish & chips"));
        assert!(!text.contains("&amp;"));
    }

    #[test]
    fn footer_lists_enabled_indicators() {
        let state = ViewState::derive(
            ViewCounts {
                total: 3,
                completed: 2,
                visible: 3,
            },
            FilterToken::All,
        );

        let mut out = Vec::new();
        write_footer(&mut out, &state, FilterToken::All).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("1 item left"));
        assert!(text.contains("[ ] toggle all"));
        assert!(text.contains("Clear completed (2)"));
    }

    #[test]
    fn footer_for_empty_list() {
        let mut out = Vec::new();
        write_footer(&mut out, &ViewState::default(), FilterToken::All).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No tasks.\n");
    }

    #[test]
    fn color_setting_uses_config_booleans() {
        let mut cfg = Config::default();
        assert!(Renderer::new(&cfg).color);

        for (raw, expected) in [("y", true), ("yes", true), ("off", false), ("0", false)] {
            cfg.apply_overrides([("color".to_string(), raw.to_string())]);
            assert_eq!(Renderer::new(&cfg).color, expected, "color = {raw}");
        }
    }

    #[test]
    fn strip_ansi_removes_color_codes() {
        assert_eq!(strip_ansi("\x1b[33m12\x1b[0m"), "12");
    }
}
