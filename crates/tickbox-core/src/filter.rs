use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

use crate::task::Task;

/// Visibility selector supplied by navigation.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
)]
pub enum FilterToken {
  #[default]
  All,
  Active,
  Completed
}

impl FilterToken {
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | FilterToken::All => true,
      | FilterToken::Active => {
        !task.completed
      }
      | FilterToken::Completed => {
        task.completed
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | FilterToken::All => "all",
      | FilterToken::Active => "active",
      | FilterToken::Completed => {
        "completed"
      }
    }
  }

  /// Navigation route for this token.
  pub fn as_route(
    self
  ) -> &'static str {
    match self {
      | FilterToken::All => "/",
      | FilterToken::Active => {
        "/active"
      }
      | FilterToken::Completed => {
        "/completed"
      }
    }
  }
}

impl fmt::Display for FilterToken {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FilterToken {
  type Err = anyhow::Error;

  fn from_str(
    raw: &str
  ) -> Result<Self, Self::Err> {
    let trimmed = raw.trim();
    let name = trimmed
      .strip_prefix('/')
      .unwrap_or(trimmed)
      .to_ascii_lowercase();

    let token = match name.as_str() {
      | "" | "all" => FilterToken::All,
      | "active" => FilterToken::Active,
      | "completed" => {
        FilterToken::Completed
      }
      | other => {
        return Err(anyhow!(
          "unknown filter token: \
           {other}"
        ));
      }
    };

    trace!(raw = %raw, token = %token, "parsed filter token");
    Ok(token)
  }
}
