use std::collections::HashMap;

use tracing::debug;
use tributary_protocol::ServerMessage;

use crate::error::SessionError;
use crate::role::SessionRole;
use crate::session::Session;

/// Connected sessions, keyed by id and kept in admission order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
  sessions: HashMap<String, Session>,
  order: Vec<String>,
}

impl SessionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Admit a session. A duplicate id is rejected and the registry is left
  /// unchanged.
  pub fn insert(&mut self, session: Session) -> Result<(), SessionError> {
    if self.sessions.contains_key(session.id()) {
      return Err(SessionError::Duplicate(session.id().to_string()));
    }
    let id = session.id().to_string();
    self.order.push(id.clone());
    self.sessions.insert(id, session);
    Ok(())
  }

  pub fn remove(&mut self, id: &str) -> Option<Session> {
    let id = id.to_lowercase();
    let session = self.sessions.remove(&id)?;
    self.order.retain(|existing| existing != &id);
    Some(session)
  }

  pub fn get(&self, id: &str) -> Option<&Session> {
    self.sessions.get(&id.to_lowercase())
  }

  pub fn contains(&self, id: &str) -> bool {
    self.sessions.contains_key(&id.to_lowercase())
  }

  pub fn len(&self) -> usize {
    self.sessions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.is_empty()
  }

  /// All sessions in admission order.
  pub fn iter(&self) -> impl Iterator<Item = &Session> {
    self.order.iter().filter_map(|id| self.sessions.get(id))
  }

  pub fn with_role(&self, role: SessionRole) -> impl Iterator<Item = &Session> {
    self.iter().filter(move |session| session.role() == role)
  }

  pub fn probes(&self) -> impl Iterator<Item = &Session> {
    self.with_role(SessionRole::Probe)
  }

  pub fn managers(&self) -> impl Iterator<Item = &Session> {
    self.with_role(SessionRole::Manager)
  }

  pub fn run_executors(&self) -> impl Iterator<Item = &Session> {
    self.with_role(SessionRole::RunExecutor)
  }

  /// Send a message to every session with `role`. Returns how many accepted it.
  pub fn broadcast(&self, role: SessionRole, message: &ServerMessage) -> usize {
    let mut delivered = 0;
    for session in self.with_role(role) {
      if session.send(message.clone()) {
        delivered += 1;
      } else {
        debug!(session_id = %session.id(), topic = %message.topic(), "send_to_closed_session");
      }
    }
    delivered
  }

  /// Remove every session, in admission order.
  pub fn drain(&mut self) -> Vec<Session> {
    let order = std::mem::take(&mut self.order);
    order
      .into_iter()
      .filter_map(|id| self.sessions.remove(&id))
      .collect()
  }
}
