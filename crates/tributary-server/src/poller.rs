//! Periodic run status polling.
//!
//! The `StatusPoller` asks every manager for the status of every active run on
//! a fixed interval, so runs whose terminal status was never reported are
//! eventually reconciled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tributary_router::Router;

/// Shortest allowed poll period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct StatusPoller {
  router: Arc<Mutex<Router>>,
  interval: Duration,
}

impl StatusPoller {
  /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
  pub fn new(router: Arc<Mutex<Router>>, interval: Duration) -> Self {
    if interval < MIN_POLL_INTERVAL {
      warn!(
        requested_secs = interval.as_secs_f64(),
        "status_poll_interval_raised_to_minimum"
      );
    }
    Self {
      router,
      interval: interval.max(MIN_POLL_INTERVAL),
    }
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Run one poll.
  pub async fn poll_once(&self) -> usize {
    self.router.lock().await.check_status_bulk().len()
  }

  /// Poll until the cancellation token is triggered. The first poll happens
  /// one interval after start.
  pub async fn start(self, cancel: CancellationToken) {
    info!(interval_secs = self.interval.as_secs_f64(), "starting status poller");

    let mut ticker =
      tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("status poller cancelled");
          break;
        }
        _ = ticker.tick() => {
          let runs = self.poll_once().await;
          debug!(runs = runs, "status_poll");
        }
      }
    }
  }
}
