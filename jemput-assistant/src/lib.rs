//! Waste-management chat assistant for Jemput.
//!
//! Keeps a transcript seeded with a topic-restricting system prompt and sends
//! it to the Mistral chat completions API.

/// HTTP client and error mapping.
pub mod client;
/// Transcript and system prompt.
pub mod conversation;
/// Keyword check for on-topic questions.
pub mod topic;

pub use client::{AssistantError, MistralClient};
pub use conversation::Conversation;
pub use jemput_core::model::{ChatMessage, ChatRole};
pub use topic::is_topic_related;
