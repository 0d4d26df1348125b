use serde::{Deserialize, Serialize};

/// Request body for the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,

    /// Opaque session token from a previous reply, if any.
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Create a new `ChatRequest`.
    pub fn new(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}

/// Response body from the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    /// The assistant's response text.
    pub content: String,

    /// Session token to use for subsequent requests.
    #[serde(default)]
    pub session_id: Option<String>,

    /// Server-side processing time in seconds.
    #[serde(default)]
    pub request_time: Option<f64>,
}

impl ChatReply {
    /// Create a new `ChatReply` with just content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            session_id: None,
            request_time: None,
        }
    }

    /// Attach a session token to the reply.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach the server-side processing time, in seconds.
    pub fn with_request_time(mut self, seconds: f64) -> Self {
        self.request_time = Some(seconds);
        self
    }
}

/// Response body from the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    /// Either `"ok"` or `"error"`.
    pub status: String,

    /// Number of sessions the server is tracking.
    #[serde(default)]
    pub active_sessions: Option<u64>,

    /// Optional detail accompanying an error status.
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    /// A healthy status.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            active_sessions: None,
            message: None,
        }
    }

    /// An unhealthy status with an optional detail message.
    pub fn error(message: Option<String>) -> Self {
        Self {
            status: "error".to_string(),
            active_sessions: None,
            message,
        }
    }

    /// Returns true if the service reported itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
