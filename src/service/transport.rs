//! Outbound send primitive.
//!
//! The dispatcher never touches a socket. Replies and heartbeats are handed to a
//! [`Transport`], which frames them with [`OutboundMessage::encode`], applies the session
//! cipher when [`EncryptionState`](crate::protocol::state::EncryptionState) says so, and
//! writes them out.
//!
//! Heartbeats are sent from the timer task, so implementations must be `Send + Sync` and
//! serialize concurrent sends themselves.

use crate::error::{ProtocolError, Result};
use crate::protocol::message::OutboundMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

pub trait Transport: Send + Sync {
    fn send(&self, message: OutboundMessage) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, message: OutboundMessage) -> Result<()> {
        (**self).send(message)
    }
}

/// Forwards outbound messages to a channel drained by the connection's writer task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: OutboundMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| ProtocolError::TransportError("Connection closed".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::protocol::message::EMsg;
    use bytes::Bytes;

    fn heartbeat() -> OutboundMessage {
        OutboundMessage {
            kind: EMsg::CLIENT_HEART_BEAT,
            job_id: 0,
            body: Bytes::new(),
            encrypted: true,
        }
    }

    #[test]
    fn test_channel_transport_forwards_in_order() {
        let (transport, mut rx) = ChannelTransport::new();
        transport.send(heartbeat()).unwrap();
        let mut second = heartbeat();
        second.job_id = 9;
        transport.send(second).unwrap();

        assert_eq!(rx.try_recv().unwrap().job_id, 0);
        assert_eq!(rx.try_recv().unwrap().job_id, 9);
    }

    #[test]
    fn test_send_after_receiver_dropped_fails() {
        let (transport, rx) = ChannelTransport::new();
        drop(rx);
        assert!(matches!(
            transport.send(heartbeat()),
            Err(ProtocolError::TransportError(_))
        ));
    }
}
