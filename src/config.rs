//! Configuration types for the chat client.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for the session, pipeline, and REPL. Every user-facing string
//! (error messages, input placeholders) lives here so presentation wording is
//! overridable and never hardcoded in client logic.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::Connectivity;

/// Default interval between health probes.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default deadline for one send.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Default path of the session token file.
const DEFAULT_SESSION_FILE: &str = "ragline_session.json";

/// Command-line arguments for the ragline-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat service.
    #[arrrg(optional, "Base URL of the chat service", "URL")]
    pub url: Option<String>,

    /// Seconds between health probes.
    #[arrrg(optional, "Health poll interval in seconds (default: 30)", "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Seconds before an in-flight send is abandoned.
    #[arrrg(optional, "Send timeout in seconds (default: 60)", "SECONDS")]
    pub send_timeout: Option<u64>,

    /// Where to persist the session token.
    #[arrrg(optional, "Path of the session token file", "PATH")]
    pub session_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// The synthetic assistant messages injected on failed sends.
///
/// Worded for a non-technical reader; raw transport errors never reach the
/// message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessages {
    /// Shown for service failures and blank replies.
    pub general: String,

    /// Shown when the connection to the service was lost mid-send.
    pub disconnected: String,

    /// Shown when the send exceeded its deadline.
    pub timeout: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            general: "I encountered an error while generating the response. Please try again."
                .to_string(),
            disconnected:
                "The connection to the server was lost. Please try again when reconnected."
                    .to_string(),
            timeout: "The request took too long to process. Please try a simpler query."
                .to_string(),
        }
    }
}

/// Input placeholder wording per connectivity phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    /// Connected and idle.
    pub ready: String,

    /// First probe not yet resolved.
    pub reconnecting: String,

    /// A send is in flight.
    pub waiting: String,

    /// The service is unreachable.
    pub disconnected: String,
}

impl Placeholders {
    /// Selects the placeholder for the current phase.
    pub fn for_phase(&self, connectivity: Connectivity, pending: bool) -> &str {
        match connectivity {
            Connectivity::Reconnecting => &self.reconnecting,
            Connectivity::Disconnected => &self.disconnected,
            Connectivity::Connected if pending => &self.waiting,
            Connectivity::Connected => &self.ready,
        }
    }
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            ready: "Type a message".to_string(),
            reconnecting: "Connecting to the server...".to_string(),
            waiting: "Waiting for a reply...".to_string(),
            disconnected: "Server unavailable. Retrying shortly...".to_string(),
        }
    }
}

/// Configuration for a chat client.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the chat service. `None` defers to the transport default.
    pub base_url: Option<String>,

    /// Interval between health probes.
    pub poll_interval: Duration,

    /// Deadline for one send.
    pub send_timeout: Duration,

    /// Path of the persisted session token file.
    pub session_file: PathBuf,

    /// Synthetic error message wording.
    pub error_messages: ErrorMessages,

    /// Input placeholder wording.
    pub placeholders: Placeholders,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Poll interval: 30 seconds
    /// - Send timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            error_messages: ErrorMessages::default(),
            placeholders: Placeholders::default(),
            use_color: true,
        }
    }

    /// Sets the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the health poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Sets the session token file path.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Overrides the synthetic error message wording.
    pub fn with_error_messages(mut self, messages: ErrorMessages) -> Self {
        self.error_messages = messages;
        self
    }

    /// Overrides the placeholder wording.
    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            base_url: args.url,
            poll_interval: args
                .poll_interval
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            send_timeout: args
                .send_timeout
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SEND_TIMEOUT),
            session_file: args
                .session_file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            use_color: !args.no_color,
            ..ChatConfig::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.send_timeout, Duration::from_secs(60));
        assert!(config.base_url.is_none());
        assert!(config.use_color);
        assert_eq!(config.session_file, PathBuf::from("ragline_session.json"));
    }

    #[test]
    fn config_from_args() {
        let args = ChatArgs {
            url: Some("http://chat.example.com/".to_string()),
            poll_interval: Some(5),
            send_timeout: Some(10),
            session_file: Some("/tmp/session.json".to_string()),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.base_url.as_deref(), Some("http://chat.example.com/"));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.send_timeout, Duration::from_secs(10));
        assert_eq!(config.session_file, PathBuf::from("/tmp/session.json"));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://host:9000")
            .with_poll_interval(Duration::from_secs(1))
            .with_send_timeout(Duration::from_secs(2))
            .with_session_file("state.json")
            .without_color();

        assert_eq!(config.base_url.as_deref(), Some("http://host:9000"));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.send_timeout, Duration::from_secs(2));
        assert_eq!(config.session_file, PathBuf::from("state.json"));
        assert!(!config.use_color);
    }

    #[test]
    fn placeholder_selection() {
        let placeholders = Placeholders::default();
        assert_eq!(
            placeholders.for_phase(Connectivity::Reconnecting, false),
            "Connecting to the server..."
        );
        assert_eq!(
            placeholders.for_phase(Connectivity::Connected, true),
            "Waiting for a reply..."
        );
        assert_eq!(
            placeholders.for_phase(Connectivity::Connected, false),
            "Type a message"
        );
        assert_eq!(
            placeholders.for_phase(Connectivity::Disconnected, true),
            "Server unavailable. Retrying shortly..."
        );
    }
}
