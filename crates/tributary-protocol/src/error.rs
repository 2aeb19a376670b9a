use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
  #[error("message body for topic {0} is null or empty")]
  EmptyBody(String),

  #[error("field '{field}' does not exist in message body for topic {topic}")]
  MissingField { topic: String, field: String },

  #[error("field '{field}' for topic {topic} must be {expected}")]
  InvalidField {
    topic: String,
    field: String,
    expected: &'static str,
  },

  #[error("unknown topic: {0}")]
  UnknownTopic(String),
}
