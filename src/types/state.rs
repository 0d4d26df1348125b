use std::fmt;

use serde::{Deserialize, Serialize};

/// The session's current relationship to the remote service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// The last probe succeeded; submissions are allowed.
    Connected,

    /// The last probe failed or a send lost the connection.
    Disconnected,

    /// The first probe has not resolved yet. Transient: entered only by
    /// `SessionManager::initialize` and always resolves before another
    /// probe starts.
    Reconnecting,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Connected => write!(f, "connected"),
            Connectivity::Disconnected => write!(f, "disconnected"),
            Connectivity::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// Classification of the most recent failure observed by the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// A health probe failed or returned a non-ok status.
    Health,

    /// A send failed at the transport or service level.
    Send,

    /// A send exceeded its deadline.
    Timeout,
}
