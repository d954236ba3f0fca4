use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier carried by every [`Message`].
///
/// Backed by a random (v4) UUID, so identifiers are unique with overwhelming
/// probability and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Immutable envelope moved between submitters, engines and queues.
///
/// A fresh message gets a new identifier and a new correlation identifier.
/// A reply gets a new identifier and takes the identifier of the message it
/// answers as its correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    correlation_id: MessageId,
    payload: String,
}

impl Message {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            correlation_id: MessageId::new(),
            payload: payload.into(),
        }
    }

    /// Builds a reply correlated to this message.
    pub fn reply(&self, payload: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            correlation_id: self.id,
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn correlation_id(&self) -> &MessageId {
        &self.correlation_id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_correlates_to_parent() {
        let request = Message::new("<request/>");
        let reply = request.reply("<reply/>");

        assert_eq!(reply.correlation_id(), request.id());
        assert_ne!(reply.id(), request.id());
        assert_eq!(reply.payload(), "<reply/>");
    }

    #[test]
    fn test_fresh_messages_do_not_share_identifiers() {
        let first = Message::new("a");
        let second = Message::new("a");

        assert_ne!(first.id(), second.id());
        assert_ne!(first.correlation_id(), second.correlation_id());
        assert_ne!(first.id(), first.correlation_id());
    }

    #[test]
    fn test_message_id_text_form() {
        let id = MessageId::new();
        let parsed: MessageId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        assert!("not-a-message-id".parse::<MessageId>().is_err());
    }
}
