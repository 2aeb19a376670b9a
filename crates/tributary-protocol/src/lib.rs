//! Tributary Protocol
//!
//! Every message exchanged with a session is a [`Frame`]: a topic plus a JSON
//! body. Inbound frames are decoded into a request enum fixed per session
//! role ([`ProbeRequest`], [`ManagerRequest`], [`RunRequest`]). Outbound
//! frames are built from [`ServerMessage`].

mod error;
mod frame;
mod request;
pub mod topics;

pub use error::ProtocolError;
pub use frame::{Frame, Response, RunRef, ServerMessage};
pub use request::{
  DEFAULT_REQ_ID, ManagerRequest, ProbeRequest, RunRequest, RunStatusReport, req_id,
};
