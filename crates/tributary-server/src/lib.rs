//! Tributary Server
//!
//! Network surfaces over the router:
//! - `POST /intake` accepts events over plain HTTP
//! - `GET /ws` upgrades to a websocket, one per session
//! - `GET /health`
//!
//! plus a [`StatusPoller`] that periodically asks managers for run status.

mod dispatch;
mod error;
mod intake;
mod poller;
mod routes;
mod server;
mod state;
mod ws;

pub use dispatch::handle_frame;
pub use error::ServerError;
pub use poller::{MIN_POLL_INTERVAL, StatusPoller};
pub use routes::build_router;
pub use server::{Server, ServerConfig, shutdown_signal};
pub use state::AppState;
