use serde::{Deserialize, Serialize};

fn default_max_trash_len() -> usize {
  1000
}

/// Bounds on per-run buffers. `0` means unbounded.
///
/// When a bound is exceeded the oldest entry is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLimits {
  #[serde(default)]
  pub max_queue_len: usize,
  #[serde(default = "default_max_trash_len")]
  pub max_trash_len: usize,
}

impl Default for RunLimits {
  fn default() -> Self {
    Self {
      max_queue_len: 0,
      max_trash_len: default_max_trash_len(),
    }
  }
}

impl RunLimits {
  pub fn unbounded() -> Self {
    Self {
      max_queue_len: 0,
      max_trash_len: 0,
    }
  }
}

/// Whether a buffer of `len` entries is over `limit`.
pub(crate) fn exceeds(len: usize, limit: usize) -> bool {
  limit != 0 && len > limit
}
