use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tributary_protocol::ServerMessage;

/// Pushes messages to a connected session.
///
/// The router calls `send` for every outbound message; implementations decide
/// how to deliver it. `send` must not block.
pub trait Transport: Send + Sync + fmt::Debug {
  /// Queue a message for delivery. Returns false if the session is gone.
  fn send(&self, message: ServerMessage) -> bool;

  /// Disconnect the session.
  fn close(&self);
}

/// A transport that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoopTransport;

impl Transport for NoopTransport {
  fn send(&self, _message: ServerMessage) -> bool {
    true
  }

  fn close(&self) {}
}

/// A transport backed by an unbounded channel.
///
/// The receiving half is drained by the session's socket task, which also
/// watches the cancellation token to learn that the broker closed it.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
  sender: mpsc::UnboundedSender<ServerMessage>,
  cancel: CancellationToken,
}

impl ChannelTransport {
  pub fn new(sender: mpsc::UnboundedSender<ServerMessage>, cancel: CancellationToken) -> Self {
    Self { sender, cancel }
  }

  /// Create a transport together with the receiver it feeds.
  pub fn pair() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender, CancellationToken::new()), receiver)
  }

  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }
}

impl Transport for ChannelTransport {
  fn send(&self, message: ServerMessage) -> bool {
    if self.cancel.is_cancelled() {
      return false;
    }
    self.sender.send(message).is_ok()
  }

  fn close(&self) {
    self.cancel.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_channel_transport_delivers() {
    let (transport, mut receiver) = ChannelTransport::pair();

    assert!(transport.send(ServerMessage::NotifyEvent {
      topic: "onu.events".to_string()
    }));

    let message = receiver.recv().await.unwrap();
    assert_eq!(
      message,
      ServerMessage::NotifyEvent {
        topic: "onu.events".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_closed_transport_refuses() {
    let (transport, _receiver) = ChannelTransport::pair();
    let token = transport.cancellation_token();

    transport.close();

    assert!(token.is_cancelled());
    assert!(!transport.send(ServerMessage::NotifyEvent {
      topic: "t".to_string()
    }));
  }

  #[test]
  fn test_dropped_receiver_refuses() {
    let (transport, receiver) = ChannelTransport::pair();
    drop(receiver);

    assert!(!transport.send(ServerMessage::NotifyEvent {
      topic: "t".to_string()
    }));
  }
}
