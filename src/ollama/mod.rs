//! Ollama LLM integration module
//!
//! This module provides a client for Ollama's `/api/chat` endpoint and the
//! parse boundary that turns the model's JSON text into an `AssistantReply`.

pub mod client;
pub mod message;
pub mod reply;

pub use client::{ModelClient, ModelError, OllamaChatClient};
pub use message::{ChatMessage, Role};
pub use reply::AssistantReply;
