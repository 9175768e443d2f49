//! Gemini `generateContent` API client

mod client;
mod types;

pub use client::{DEFAULT_ENDPOINT, GeminiClient};
pub use types::*;

/// Result type for Gemini calls
pub type Result<T> = std::result::Result<T, GeminiError>;

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Prompt blocked: {0}")]
    Blocked(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Invalid inline data: {0}")]
    Decode(String),
}
