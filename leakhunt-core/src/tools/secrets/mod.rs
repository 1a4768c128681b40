//! Secret scanner tools

mod gitleaks;
mod trufflehog;

pub use gitleaks::{GitleaksTool, REPORT_FILE};
pub use trufflehog::{parse_stream, TrufflehogTool, PROVENANCE_MARKER};

use super::ToolError;

/// Reject inputs that would be read as scanner flags
pub(crate) fn validate_repository(input: &str) -> Result<&str, ToolError> {
    let repository = input.trim();
    if repository.is_empty() {
        return Err(ToolError::InvalidInput("empty repository reference".to_string()));
    }
    if repository.starts_with('-') {
        return Err(ToolError::InvalidInput(format!(
            "repository reference may not start with '-': {}",
            repository
        )));
    }
    Ok(repository)
}
