pub mod client;
pub mod error;
pub mod types;

pub use client::{CompletionSender, OpenAiClient};
pub use error::CompletionError;
pub use types::{ChatMessage, ChatRequest, ChatResponse};
