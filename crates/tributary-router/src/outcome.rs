/// Where an event went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOutcome {
  /// Existing runs the event was queued into.
  pub routed: Vec<String>,
  /// Runs created for the event.
  pub kickstarted: Vec<String>,
}

impl RouteOutcome {
  /// No run took the event.
  pub fn is_dropped(&self) -> bool {
    self.routed.is_empty() && self.kickstarted.is_empty()
  }
}
