use std::sync::Arc;

use tokio::sync::Mutex;
use tributary_router::Router;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
  pub router: Arc<Mutex<Router>>,
  pub started_at: std::time::Instant,
}

impl AppState {
  pub fn new(router: Router) -> Self {
    Self {
      router: Arc::new(Mutex::new(router)),
      started_at: std::time::Instant::now(),
    }
  }
}
