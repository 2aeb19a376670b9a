use serde::{Deserialize, Serialize};
use tributary_run::RunLimits;

/// Which queued event a fetch returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
  /// The oldest queued event, whatever its topic.
  #[default]
  Head,
  /// The oldest queued event with the requested topic.
  ByTopic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterConfig {
  pub fetch_mode: FetchMode,
  pub limits: RunLimits,
}
