//! Error types for the comparison-shopping pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unreadable search configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Settings file could not be parsed
    #[error("invalid settings file: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// A required credential variable is not set
    #[error("missing credential: set {var} to use the {platform} platform")]
    MissingCredential {
        platform: &'static str,
        var: &'static str,
    },

    /// LLM client error
    #[error("LLM error: {0}")]
    Llm(#[from] async_openai::error::OpenAIError),

    /// The LLM returned a response with no usable content
    #[error("empty response from model {model}")]
    EmptyCompletion { model: String },

    /// The browsing agent itself failed
    #[error("agent execution failed: {0}")]
    Agent(String),

    /// An output artifact could not be written
    #[error("failed to write {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
