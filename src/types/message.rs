use serde::{Deserialize, Serialize};

/// Role type for a conversation message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// One entry in the conversation log.
///
/// Messages are immutable once appended. The `sequence` number is assigned
/// by the pipeline at append time and defines display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// The role of the message.
    pub role: MessageRole,

    /// The raw, unparsed text payload.
    pub content: String,

    /// Monotonically increasing position in the log.
    pub sequence: u64,
}

impl Message {
    /// Create a new `Message` with the given role, content, and sequence.
    pub fn new(role: MessageRole, content: impl Into<String>, sequence: u64) -> Self {
        Self {
            role,
            content: content.into(),
            sequence,
        }
    }

    /// Returns true if this message was produced by the assistant.
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}
