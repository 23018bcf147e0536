//! Text generation adapter.
//!
//! [`client`] talks to an OpenAI-compatible chat-completions endpoint;
//! [`writer`] turns a compiled prompt into moderated story text.

pub mod client;
pub mod config;
pub mod writer;

pub use client::{ChatCompletion, ChatMessage, ChatRole, CompletionClient, CompletionError};
pub use config::LlmConfig;
pub use writer::StoryWriter;
