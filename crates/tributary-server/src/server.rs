//! Server setup and lifecycle management.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tributary_router::Router;

use crate::error::ServerError;
use crate::poller::StatusPoller;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub listen_addr: SocketAddr,
  pub status_poll_interval: Duration,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
      status_poll_interval: Duration::from_secs(5),
    }
  }
}

/// The broker server: HTTP/websocket surfaces plus the status poller.
pub struct Server {
  config: ServerConfig,
  state: AppState,
}

impl Server {
  pub fn new(config: ServerConfig, router: Router) -> Self {
    Self {
      config,
      state: AppState::new(router),
    }
  }

  pub fn state(&self) -> &AppState {
    &self.state
  }

  /// Bind the listen address and serve until `shutdown` resolves.
  pub async fn run(
    self,
    shutdown: impl Future<Output = ()> + Send + 'static,
  ) -> Result<(), ServerError> {
    let addr = self.config.listen_addr;
    let listener = TcpListener::bind(addr)
      .await
      .map_err(|source| ServerError::Bind { addr, source })?;
    self.serve(listener, shutdown).await
  }

  /// Serve on an already bound listener until `shutdown` resolves, then stop
  /// the poller and close every session.
  pub async fn serve(
    self,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
  ) -> Result<(), ServerError> {
    let local_addr = listener.local_addr()?;
    let app = build_router(self.state.clone());

    let cancel = CancellationToken::new();
    let poller = StatusPoller::new(self.state.router.clone(), self.config.status_poll_interval);
    let poller_handle = tokio::spawn(poller.start(cancel.child_token()));

    info!(listen_addr = %local_addr, "tributary listening");

    // Sessions must be closed before graceful shutdown waits on their sockets
    let router = self.state.router.clone();
    let shutdown_cancel = cancel.clone();
    let result = axum::serve(listener, app)
      .with_graceful_shutdown(async move {
        shutdown.await;
        info!("shutting down");
        shutdown_cancel.cancel();
        router.lock().await.destroy_all();
      })
      .await;

    cancel.cancel();
    if let Err(e) = poller_handle.await {
      error!(error = %e, "status_poller_failed");
    }
    self.state.router.lock().await.destroy_all();
    info!("tributary stopped");

    result.map_err(ServerError::from)
  }
}

/// Resolves on ctrl-c or SIGTERM.
pub async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("received ctrl-c"),
    _ = terminate => info!("received terminate signal"),
  }
}
