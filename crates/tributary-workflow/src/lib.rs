//! Tributary Workflow
//!
//! This crate provides the loaded workflow representation for Tributary.
//! A loaded workflow is built from a `tributary-config` essence and is
//! immutable once registered with the router.
//!
//! Key differences from the essence:
//! - Every task knows the full set of topics it consumes (explicit `topic`
//!   plus the `datamodel.*` topics synthesized from `model_name`)
//! - A topic index maps each topic back to the tasks consuming it
//! - Kickstart tasks (no upstream dependencies) are identified via the graph

mod error;
mod graph;
mod task;
mod workflow;

pub use error::WorkflowError;
pub use task::WorkflowTask;
pub use workflow::{Workflow, load_workflows_from_essence};
