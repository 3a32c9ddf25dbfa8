//! The message envelope routed by the hub.

use crate::codec;
use crate::id::Id;
use serde::{Deserialize, Serialize};

/// An addressed message: sender, destination and ordered payload fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender identifier. Empty for messages built on the client side.
    pub from: Id,
    /// Destination identifier (agent or service).
    pub to: Id,
    /// Ordered payload fields.
    pub data: Vec<String>,
}

impl Message {
    /// Build a message from its three parts.
    pub fn new<I, S>(from: impl Into<Id>, to: impl Into<Id>, data: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from: from.into(),
            to: to.into(),
            data: data.into_iter().map(Into::into).collect(),
        }
    }

    /// Frame as seen by the receiving agent: `(from, data)`.
    pub fn encode_inbound(&self) -> Vec<u8> {
        codec::encode(self.from.as_str(), &self.data)
    }

    /// Frame as sent by a client to the hub: `(to, data)`.
    pub fn encode_outbound(&self) -> Vec<u8> {
        codec::encode(self.to.as_str(), &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_collects_fields() {
        let msg = Message::new("A", "B", ["x", "y"]);
        assert_eq!(msg.from, "A");
        assert_eq!(msg.to, "B");
        assert_eq!(msg.data, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_inbound_frame_carries_sender() {
        let msg = Message::new("A", "B", ["x", "y"]);
        assert_eq!(msg.encode_inbound(), b"A\x1Fx\x1Fy".to_vec());
    }

    #[test]
    fn test_outbound_frame_carries_destination() {
        let msg = Message::new("", "@echo", ["hi"]);
        assert_eq!(msg.encode_outbound(), b"@echo\x1Fhi".to_vec());
    }
}
