use serde::{Deserialize, Serialize};

/// Upstream/downstream links of a task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DependencyEssence {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parents: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub children: Option<Vec<String>>,
}

impl DependencyEssence {
  pub fn parents(&self) -> &[String] {
    self.parents.as_deref().unwrap_or(&[])
  }

  pub fn children(&self) -> &[String] {
    self.children.as_deref().unwrap_or(&[])
  }
}
