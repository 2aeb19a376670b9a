use std::collections::HashSet;

/// Task dependency graph, reduced to what kickstart detection needs.
#[derive(Debug, Clone)]
pub(crate) struct Graph {
  /// Tasks with no incoming edges, in the order the tasks were given.
  entry_points: Vec<String>,
}

impl Graph {
  /// Build a graph from task ids and `(upstream, downstream)` edges.
  ///
  /// Edges may name tasks outside `task_ids`; such an upstream still counts as
  /// an incoming edge of its downstream task.
  pub(crate) fn new<'a>(
    task_ids: impl IntoIterator<Item = &'a str>,
    edges: &[(String, String)],
  ) -> Self {
    let has_incoming: HashSet<&str> = edges.iter().map(|(_, to)| to.as_str()).collect();

    let entry_points = task_ids
      .into_iter()
      .filter(|id| !has_incoming.contains(*id))
      .map(str::to_string)
      .collect();

    Self { entry_points }
  }

  pub(crate) fn is_entry_point(&self, task_id: &str) -> bool {
    self.entry_points.iter().any(|id| id == task_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn edges(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
      .iter()
      .map(|(a, b)| (a.to_string(), b.to_string()))
      .collect()
  }

  #[test]
  fn test_entry_points_keep_task_order() {
    let graph = Graph::new(
      ["a", "b", "c", "d"],
      &edges(&[("a", "c"), ("b", "c"), ("c", "d")]),
    );

    assert_eq!(graph.entry_points, vec!["a".to_string(), "b".to_string()]);
    assert!(graph.is_entry_point("b"));
    assert!(!graph.is_entry_point("c"));
  }

  #[test]
  fn test_unknown_upstream_still_counts() {
    let graph = Graph::new(["b"], &edges(&[("ghost", "b")]));

    assert!(graph.entry_points.is_empty());
    assert!(!graph.is_entry_point("b"));
  }
}
