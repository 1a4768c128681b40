//! Normalized secret findings

pub mod models;
pub mod normalizer;

pub use models::{FindingRecord, RepositoryOutcome, Severity, ToolFailure, VerificationStatus};
pub use normalizer::{aggregate, dedupe, normalize};
