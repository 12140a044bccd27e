//! Transport-only client primitives for the OpenAI chat-completions endpoint.
//!
//! This crate owns request building, header construction and response/error
//! parsing for a single non-streaming completion call. It contains no session
//! state, no retry policy and no credential loading.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::OpenAiApiClient;
pub use config::OpenAiApiConfig;
pub use error::OpenAiApiError;
pub use payload::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};
pub use url::normalize_chat_url;

pub use reqwest::StatusCode;
