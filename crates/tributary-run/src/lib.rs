//! Tributary Run
//!
//! A workflow run is one in-flight execution of a registered workflow. The
//! broker keeps, per run:
//! - the correlation state deciding which events belong to it
//! - a FIFO of events waiting to be fetched by the run's tasks
//! - a bounded trash of events already fetched
//! - the status of each task, as reported by the run executor

mod correlation;
mod error;
mod event;
mod limits;
mod run;
mod status;

pub use correlation::{Correlation, KeyBinding};
pub use error::RunError;
pub use event::QueuedEvent;
pub use limits::RunLimits;
pub use run::{WorkflowRun, generate_run_id};
pub use status::{RunState, RunStatus, TaskStatus};
