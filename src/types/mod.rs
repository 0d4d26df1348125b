// Public modules
pub mod message;
pub mod state;
pub mod wire;

// Re-exports
pub use message::{Message, MessageRole};
pub use state::{Connectivity, FailureKind};
pub use wire::{ChatReply, ChatRequest, HealthStatus};
