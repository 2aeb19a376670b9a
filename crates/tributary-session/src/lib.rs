//! Tributary Session
//!
//! A session is one connected party: a probe emitting events, a workflow
//! manager starting runs, or a run executor consuming a run's events. Each
//! session exclusively owns a [`Transport`] used to push messages to it.

mod error;
mod registry;
mod role;
mod session;
mod transport;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use role::SessionRole;
pub use session::{Session, SessionParams};
pub use transport::{ChannelTransport, NoopTransport, Transport};
