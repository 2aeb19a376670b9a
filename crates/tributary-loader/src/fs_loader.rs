use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use tributary_config::EssenceDocument;
use tributary_workflow::{Workflow, load_workflows_from_essence};

use crate::error::LoaderError;

/// Read and parse one essence document.
pub async fn load_essence(path: impl AsRef<Path>) -> Result<EssenceDocument, LoaderError> {
  let path = path.as_ref();
  debug!(path = %path.display(), "loading_essence");

  let content = fs::read_to_string(path)
    .await
    .map_err(|source| LoaderError::Io {
      path: path.to_path_buf(),
      source,
    })?;
  let value: serde_json::Value =
    serde_json::from_str(&content).map_err(|source| LoaderError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

  match value {
    serde_json::Value::Object(document) => Ok(document),
    _ => Err(LoaderError::NotAnObject(path.to_path_buf())),
  }
}

/// Load every workflow in one document. Workflows that fail to load are
/// logged and skipped.
pub async fn load_workflows(path: impl AsRef<Path>) -> Result<Vec<Workflow>, LoaderError> {
  let path = path.as_ref();
  let document = load_essence(path).await?;

  let mut workflows = Vec::new();
  for (key, result) in load_workflows_from_essence(&document) {
    match result {
      Ok(workflow) => {
        debug!(path = %path.display(), workflow_id = %workflow.id(), "workflow_loaded");
        workflows.push(workflow);
      }
      Err(e) => {
        warn!(path = %path.display(), workflow_key = %key, error = %e, "workflow_load_failed");
      }
    }
  }
  Ok(workflows)
}

/// Load every `*.json` document in `dir`, in file name order.
///
/// Unreadable or malformed files are logged and skipped; only failing to list
/// the directory itself is an error.
pub async fn load_all_workflows(dir: impl AsRef<Path>) -> Result<Vec<Workflow>, LoaderError> {
  let dir = dir.as_ref();
  let mut entries = fs::read_dir(dir).await.map_err(|source| LoaderError::Io {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut paths: Vec<PathBuf> = Vec::new();
  loop {
    let entry = match entries.next_entry().await {
      Ok(Some(entry)) => entry,
      Ok(None) => break,
      Err(source) => {
        return Err(LoaderError::Io {
          path: dir.to_path_buf(),
          source,
        });
      }
    };
    let path = entry.path();
    if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
      paths.push(path);
    }
  }
  paths.sort();

  let mut workflows = Vec::new();
  for path in paths {
    match load_workflows(&path).await {
      Ok(loaded) => workflows.extend(loaded),
      Err(e) => warn!(path = %path.display(), error = %e, "essence_file_skipped"),
    }
  }
  Ok(workflows)
}
