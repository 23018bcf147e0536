//! ComfyUI REST client library.
//!
//! Provides HTTP API wrappers, typed history parsing, and a text-to-image
//! workflow builder for driving a ComfyUI image-generation server.

pub mod api;
pub mod history;
pub mod workflow;
