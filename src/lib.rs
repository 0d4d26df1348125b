// Public modules
pub mod commands;
pub mod config;
pub mod error;
pub mod observability;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

// Re-exports
pub use config::{ChatArgs, ChatConfig, ErrorMessages, Placeholders};
pub use error::{Error, Result};
pub use pipeline::{ConversationPipeline, SkipReason, SubmitOutcome, ViewEntry};
pub use session::SessionManager;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ChatTransport, HttpTransport};
pub use types::*;
