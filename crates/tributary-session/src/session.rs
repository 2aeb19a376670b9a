use std::collections::BTreeMap;

use tributary_protocol::ServerMessage;

use crate::error::SessionError;
use crate::role::SessionRole;
use crate::transport::Transport;

/// Connect parameters, as received from the client.
pub type SessionParams = BTreeMap<String, String>;

/// A connected party.
#[derive(Debug)]
pub struct Session {
  id: String,
  role: SessionRole,
  name: Option<String>,
  workflow_id: Option<String>,
  workflow_run_id: Option<String>,
  params: SessionParams,
  transport: Box<dyn Transport>,
}

fn non_empty(params: &SessionParams, key: &str) -> Option<String> {
  params
    .get(key)
    .map(|v| v.trim())
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

impl Session {
  pub fn new(id: &str, role: SessionRole, transport: Box<dyn Transport>) -> Self {
    Self {
      id: id.to_lowercase(),
      role,
      name: None,
      workflow_id: None,
      workflow_run_id: None,
      params: SessionParams::new(),
      transport,
    }
  }

  /// Attach the run this executor session works for.
  pub fn with_run(
    mut self,
    workflow_id: impl Into<String>,
    workflow_run_id: impl Into<String>,
  ) -> Self {
    self.workflow_id = Some(workflow_id.into());
    self.workflow_run_id = Some(workflow_run_id.into());
    self
  }

  /// Build a session from connect parameters.
  ///
  /// Only `id` is required here; call [`Session::validate`] before admitting it.
  pub fn from_params(
    params: SessionParams,
    transport: Box<dyn Transport>,
  ) -> Result<Self, SessionError> {
    let id = non_empty(&params, "id").ok_or(SessionError::MissingId)?;
    let role = params
      .get("type")
      .map(|role| SessionRole::parse(role))
      .unwrap_or(SessionRole::Unknown);

    Ok(Self {
      id: id.to_lowercase(),
      role,
      name: non_empty(&params, "name"),
      workflow_id: non_empty(&params, "workflow_id"),
      workflow_run_id: non_empty(&params, "workflow_run_id"),
      params,
      transport,
    })
  }

  /// Check the role and the fields that role requires.
  pub fn validate(&self) -> Result<(), SessionError> {
    match self.role {
      SessionRole::Unknown => Err(SessionError::UnknownRole {
        id: self.id.clone(),
        role: self.params.get("type").cloned().unwrap_or_default(),
      }),
      SessionRole::RunExecutor if self.workflow_id.is_none() => {
        Err(SessionError::MissingWorkflowId(self.id.clone()))
      }
      SessionRole::RunExecutor if self.workflow_run_id.is_none() => {
        Err(SessionError::MissingWorkflowRunId(self.id.clone()))
      }
      _ => Ok(()),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn role(&self) -> SessionRole {
    self.role
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn workflow_id(&self) -> Option<&str> {
    self.workflow_id.as_deref()
  }

  pub fn workflow_run_id(&self) -> Option<&str> {
    self.workflow_run_id.as_deref()
  }

  pub fn params(&self) -> &SessionParams {
    &self.params
  }

  pub fn send(&self, message: ServerMessage) -> bool {
    self.transport.send(message)
  }

  pub fn close(&self) {
    self.transport.close();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transport::NoopTransport;

  fn params(pairs: &[(&str, &str)]) -> SessionParams {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_from_params_lowercases_id() {
    let session = Session::from_params(
      params(&[("id", "Probe-1"), ("type", "PROBE"), ("name", "onu probe")]),
      Box::new(NoopTransport),
    )
    .unwrap();

    assert_eq!(session.id(), "probe-1");
    assert_eq!(session.role(), SessionRole::Probe);
    assert_eq!(session.name(), Some("onu probe"));
    assert_eq!(session.params().len(), 3);
    assert!(session.validate().is_ok());
  }

  #[test]
  fn test_from_params_requires_id() {
    let result = Session::from_params(params(&[("type", "probe")]), Box::new(NoopTransport));
    assert!(matches!(result, Err(SessionError::MissingId)));

    let result = Session::from_params(params(&[("id", "  ")]), Box::new(NoopTransport));
    assert!(matches!(result, Err(SessionError::MissingId)));
  }

  #[test]
  fn test_validate_unknown_role() {
    let session = Session::from_params(
      params(&[("id", "x"), ("type", "observer")]),
      Box::new(NoopTransport),
    )
    .unwrap();

    assert!(matches!(
      session.validate(),
      Err(SessionError::UnknownRole { role, .. }) if role == "observer"
    ));
  }

  #[test]
  fn test_validate_run_executor_needs_both_ids() {
    let session = Session::from_params(
      params(&[("id", "x"), ("type", "workflow_run"), ("workflow_id", "wf")]),
      Box::new(NoopTransport),
    )
    .unwrap();
    assert!(matches!(
      session.validate(),
      Err(SessionError::MissingWorkflowRunId(_))
    ));

    let session = Session::from_params(
      params(&[("id", "x"), ("type", "workflow_run"), ("workflow_run_id", "wf_1")]),
      Box::new(NoopTransport),
    )
    .unwrap();
    assert!(matches!(
      session.validate(),
      Err(SessionError::MissingWorkflowId(_))
    ));

    let session = Session::new("x", SessionRole::RunExecutor, Box::new(NoopTransport)).with_run("wf", "wf_1");
    assert!(session.validate().is_ok());
  }
}
