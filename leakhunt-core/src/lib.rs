//! leakhunt-core: capability orchestration for secret-exposure investigations

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod agents;
pub mod config;
pub mod error;
pub mod findings;
pub mod oracle;
pub mod orchestrator;
pub mod providers;
pub mod tools;

pub use error::{Error, Result};
