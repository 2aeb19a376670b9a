use std::fmt;

/// What a session is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionRole {
  Probe,
  Manager,
  RunExecutor,
  Unknown,
}

impl SessionRole {
  /// Parse a connect `type` parameter, case-insensitively.
  pub fn parse(role: &str) -> Self {
    match role.trim().to_ascii_lowercase().as_str() {
      "probe" | "prb" => Self::Probe,
      "workflow_manager" | "manager" => Self::Manager,
      "workflow_run" | "run" | "run_executor" => Self::RunExecutor,
      _ => Self::Unknown,
    }
  }
}

impl fmt::Display for SessionRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Probe => "probe",
      Self::Manager => "workflow_manager",
      Self::RunExecutor => "workflow_run",
      Self::Unknown => "unknown",
    };
    f.write_str(s)
  }
}
