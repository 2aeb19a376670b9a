//! Tributary Loader
//!
//! Discovers workflow essences on disk. A workflows directory holds `*.json`
//! documents, each mapping workflow ids to essences:
//!
//! ```text
//! {workflows_dir}/
//! ├── att_workflow.json
//! └── dhcp_workflows.json
//! ```

mod error;
mod fs_loader;

pub use error::LoaderError;
pub use fs_loader::{load_all_workflows, load_essence, load_workflows};
