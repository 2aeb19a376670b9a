//! Tributary Router
//!
//! The router owns every registered workflow, every active run and every
//! connected session, and decides where an incoming event goes:
//!
//! 1. Into every active run whose correlation state accepts it.
//! 2. Otherwise, if the topic kickstarts a workflow, into a brand-new run that
//!    managers are then asked to start.
//!
//! Run executors later pull queued events back out with
//! [`Router::fetch_event`].
//!
//! The router performs no I/O of its own beyond pushing messages to session
//! transports. Callers serialize access to it.

mod config;
mod error;
mod outcome;
mod router;

pub use config::{FetchMode, RouterConfig};
pub use error::{ErrorKind, RouterError};
pub use outcome::RouteOutcome;
pub use router::Router;
