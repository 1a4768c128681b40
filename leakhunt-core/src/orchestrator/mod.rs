//! Orchestration loop, run state and transcript

pub mod events;
pub mod runner;
pub mod state;
pub mod transcript;

use std::sync::Arc;

pub use events::{EventSender, NoopEvents};
pub use runner::{Orchestrator, RunOutcome, Termination};
pub use state::{LoopPhase, PendingHandoff, RunState};
pub use transcript::{Message, MessageKind, Payload, Transcript, ORCHESTRATOR, USER};

use crate::agents::{build_registry, Prompts};
use crate::config::LeakhuntConfig;
use crate::oracle;
use crate::tools::ToolExecutor;
use crate::Result;

impl Orchestrator {
    /// Wire the standard capabilities, real tools and the configured oracle
    pub fn from_config(config: &LeakhuntConfig) -> Result<Self> {
        let prompts = match &config.orchestrator.prompts_path {
            Some(path) => Prompts::from_file(path)?,
            None => Prompts::default(),
        };
        let executor = Arc::new(ToolExecutor::system());
        let registry = build_registry(config, executor.clone(), &prompts)?;
        let oracle = oracle::from_config(config, &prompts)?;

        Ok(Self::new(Arc::new(registry), oracle, config.orchestrator.clone())
            .with_executor(executor))
    }
}
