//! Error types for leakhunt-core

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using leakhunt Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for leakhunt
///
/// Tool failures never show up here: they are isolated as
/// [`ToolError`](crate::tools::ToolError) values inside the tool layer.
/// Everything in this enum is structural and ends a run.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(leakhunt::config))]
    Config(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(leakhunt::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(leakhunt::serde))]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    #[diagnostic(code(leakhunt::toml))]
    Toml(#[from] toml::de::Error),

    #[error("Provider error: {0}")]
    #[diagnostic(code(leakhunt::provider))]
    Provider(String),

    #[error("Oracle error: {0}")]
    #[diagnostic(
        code(leakhunt::oracle),
        help("the decision oracle must answer with select, handoff or terminate")
    )]
    Oracle(String),

    #[error("Capability already registered: {0}")]
    #[diagnostic(code(leakhunt::registry::duplicate))]
    DuplicateCapability(String),

    #[error("Unknown capability: {0}")]
    #[diagnostic(code(leakhunt::registry::unknown))]
    UnknownCapability(String),

    #[error("Invalid hand-off from {from} to {to}: {reason}")]
    #[diagnostic(code(leakhunt::handoff))]
    InvalidHandoff {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Capability error: {0}")]
    #[diagnostic(code(leakhunt::agent))]
    Agent(String),

    #[error("Transcript already terminated")]
    #[diagnostic(code(leakhunt::transcript))]
    TranscriptClosed,

    #[error("Run cancelled: {0}")]
    #[diagnostic(code(leakhunt::cancelled))]
    Cancelled(String),
}
