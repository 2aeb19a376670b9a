//! Tributary Config
//!
//! This crate contains the serializable workflow definition types for Tributary.
//! A definition is called an *essence*: the raw DAG document exported by the
//! workflow manager (tasks, dependencies, topics) before it is loaded into a
//! `tributary_workflow::Workflow`.
//!
//! Essences arrive from:
//! - JSON files discovered on disk at startup
//! - manager sessions registering workflows over the wire
//!
//! A single document can carry several workflows keyed by id. See
//! [`EssenceDocument`].

mod dependency;
mod essence;
mod task;

pub use dependency::DependencyEssence;
pub use essence::{DagEssence, EssenceDocument, WorkflowEssence};
pub use task::TaskEssence;
