use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a single task within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  Init,
  Begin,
  End,
  #[default]
  Unknown,
}

impl TaskStatus {
  /// Parse a reported status. Unrecognized values map to `Unknown`.
  pub fn parse(status: &str) -> Self {
    match status.trim().to_ascii_lowercase().as_str() {
      "i" | "init" => Self::Init,
      "b" | "begin" | "start" => Self::Begin,
      "e" | "end" | "finish" => Self::End,
      _ => Self::Unknown,
    }
  }

  /// Parse a status reported by a run executor. Only `begin` and `end`
  /// (and their aliases) are reportable.
  pub fn parse_reported(status: &str) -> Option<Self> {
    match Self::parse(status) {
      status @ (Self::Begin | Self::End) => Some(status),
      Self::Init | Self::Unknown => None,
    }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Init => "init",
      Self::Begin => "begin",
      Self::End => "end",
      Self::Unknown => "unknown",
    };
    f.write_str(s)
  }
}

/// Lifecycle of a run: `Pending -> Kickstarted -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
  Pending,
  Kickstarted,
  Finished,
}

/// A run status reported by a workflow manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
  Success,
  Failed,
  End,
  Other(String),
}

impl RunStatus {
  pub fn parse(status: &str) -> Self {
    match status.trim().to_ascii_lowercase().as_str() {
      "success" => Self::Success,
      "failed" => Self::Failed,
      "end" => Self::End,
      _ => Self::Other(status.to_string()),
    }
  }

  /// Terminal statuses remove the run from the active set.
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Self::Other(_))
  }
}
