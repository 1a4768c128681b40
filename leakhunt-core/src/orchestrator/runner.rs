//! The orchestration loop
//!
//! Each turn either honors a pending hand-off or asks the oracle, dispatches
//! one capability and appends what it said. The loop stops on a terminate
//! message, on the turn budget, or on the first structural error.

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agents::{AgentStatus, Capability, CapabilityRegistry, TurnContext};
use crate::config::OrchestratorConfig;
use crate::oracle::{Decision, DecisionOracle, OracleRequest};
use crate::tools::{ToolExecution, ToolExecutor};
use crate::{Error, Result};

use super::events::{EventSender, NoopEvents};
use super::state::{LoopPhase, PendingHandoff, RunState};
use super::transcript::{Message, MessageKind, Transcript, ORCHESTRATOR};

/// How a run ended
#[derive(Debug)]
pub enum Termination {
    /// A terminate message was appended
    Completed,
    /// The turn budget ran out first
    BudgetExceeded { max_turns: u32 },
    /// A structural error ended the run
    Failed(Error),
}

/// Final transcript and termination cause of a run
#[derive(Debug)]
pub struct RunOutcome {
    pub transcript: Transcript,
    pub turns: u32,
    pub termination: Termination,
    /// Processes started during the run, in start order
    pub tool_executions: Vec<ToolExecution>,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.termination, Termination::Completed)
    }

    /// Content of the last message, usually the report
    pub fn final_message(&self) -> Option<&str> {
        self.transcript.last().map(|m| m.content.as_str())
    }
}

/// Drives capabilities turn by turn
pub struct Orchestrator {
    registry: Arc<CapabilityRegistry>,
    oracle: Arc<dyn DecisionOracle>,
    settings: OrchestratorConfig,
    events: Arc<dyn EventSender>,
    executor: Option<Arc<ToolExecutor>>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        oracle: Arc<dyn DecisionOracle>,
        settings: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            oracle,
            settings,
            events: Arc::new(NoopEvents),
            executor: None,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSender>) -> Self {
        self.events = events;
        self
    }

    /// Collect the process records of `executor` into each `RunOutcome`
    pub fn with_executor(mut self, executor: Arc<ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub async fn run(&self, request: &str) -> RunOutcome {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run until termination, budget exhaustion, error or cancellation
    ///
    /// Cancelling `cancel` or passing the configured deadline drops whatever
    /// oracle call or capability turn is in flight.
    pub async fn run_with_cancel(&self, request: &str, cancel: CancellationToken) -> RunOutcome {
        let max_turns = self.settings.max_turns;
        let deadline = self.settings.run_timeout().map(|t| Instant::now() + t);
        let mut state = RunState::new(request);

        info!(
            oracle = self.oracle.name(),
            max_turns,
            capabilities = ?self.registry.names(),
            "starting run"
        );
        if let Some(seed) = state.transcript.last() {
            self.events.send_message(seed);
        }

        let termination = loop {
            if state.is_terminated() {
                break Termination::Completed;
            }
            if state.turn_count >= max_turns {
                info!(max_turns, "turn budget exhausted");
                break Termination::BudgetExceeded { max_turns };
            }

            if let Err(error) = self.step(&mut state, &cancel, deadline).await {
                warn!(%error, turn = state.turn_count, "run aborted");
                if !state.transcript.is_terminated() {
                    let abort = Message::new(
                        ORCHESTRATOR,
                        format!("Run aborted: {}", error),
                        MessageKind::Terminate,
                    );
                    if let Err(e) = self.append(&mut state, abort) {
                        debug!(error = %e, "could not record abort");
                    }
                }
                break Termination::Failed(error);
            }
        };

        state.phase = LoopPhase::Terminated;
        state.active_capability = None;
        let tool_executions = self
            .executor
            .as_ref()
            .map(|executor| executor.take_executions())
            .unwrap_or_default();
        info!(
            turns = state.turn_count,
            messages = state.transcript.len(),
            processes = tool_executions.len(),
            "run finished"
        );

        RunOutcome {
            transcript: state.transcript,
            turns: state.turn_count,
            termination,
            tool_executions,
        }
    }

    /// One selection step, followed by a dispatch when something was selected
    async fn step(
        &self,
        state: &mut RunState,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let target = match state.pending_handoff.take() {
            Some(handoff) => {
                debug!(from = %handoff.from, to = %handoff.to, "honoring hand-off");
                handoff.to
            }
            None => {
                let descriptions = self.registry.descriptions();
                let request = OracleRequest {
                    transcript: &state.transcript,
                    descriptions: &descriptions,
                    remaining_turns: state.remaining_turns(self.settings.max_turns),
                };
                let decision = guarded(self.oracle.decide(&request), cancel, deadline).await?;
                debug!(?decision, "oracle decision");

                match decision {
                    Decision::Select(name) => name,
                    Decision::Handoff { from, to, reason } => {
                        self.registry.validate_handoff(&from, &to)?;
                        let message = Message::new(
                            ORCHESTRATOR,
                            format!("HANDOFF TO {}: {}", to, reason),
                            MessageKind::Handoff {
                                target: to.clone(),
                                reason: reason.clone(),
                            },
                        );
                        self.append(state, message)?;
                        state.pending_handoff = Some(PendingHandoff { from, to, reason });
                        return Ok(());
                    }
                    Decision::Terminate => {
                        let message = Message::new(
                            ORCHESTRATOR,
                            self.settings.termination_phrase.clone(),
                            MessageKind::Terminate,
                        );
                        return self.append(state, message);
                    }
                    Decision::Undecided => match self.registry.clarifier() {
                        Some(clarifier) => clarifier.name().to_string(),
                        None => {
                            return Err(Error::Oracle(
                                "no capability selected and no clarifier registered".to_string(),
                            ))
                        }
                    },
                }
            }
        };

        let capability = self.registry.resolve(&target)?;
        self.dispatch(state, capability, cancel, deadline).await
    }

    async fn dispatch(
        &self,
        state: &mut RunState,
        capability: Arc<dyn Capability>,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let name = capability.name().to_string();
        state.phase = LoopPhase::Dispatching;
        state.active_capability = Some(name.clone());
        info!(turn = state.turn_count + 1, capability = %name, "dispatching");
        self.events.send_status(&name, AgentStatus::Executing);

        let ctx = TurnContext::new(
            &state.transcript,
            state.remaining_turns(self.settings.max_turns),
        );
        let replies = match guarded(capability.act(&ctx), cancel, deadline).await {
            Ok(replies) => replies,
            Err(e) => {
                self.events.send_status(&name, AgentStatus::Failed);
                return Err(e);
            }
        };

        state.turn_count += 1;
        state.phase = LoopPhase::AwaitingSelection;

        for reply in replies {
            if state.transcript.is_terminated() {
                debug!(capability = %name, "dropping reply after termination");
                break;
            }

            // Replies carrying tool data never end the run by their wording
            let spoken = reply.payload.is_none() && self.is_sentinel(&reply.content);
            let kind = match reply.kind {
                MessageKind::Normal if spoken => MessageKind::Terminate,
                kind => kind,
            };
            let handoff = match &kind {
                MessageKind::Handoff { target, reason } => Some(PendingHandoff {
                    from: name.clone(),
                    to: target.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            };

            let message = Message::new(name.as_str(), reply.content, kind).with_payload(reply.payload);
            self.append(state, message)?;

            if let Some(handoff) = handoff {
                if let Err(e) = self.registry.validate_handoff(&handoff.from, &handoff.to) {
                    self.events.send_status(&name, AgentStatus::Failed);
                    return Err(e);
                }
                state.pending_handoff = Some(handoff);
            }
        }

        self.events.send_status(&name, AgentStatus::Completed);
        Ok(())
    }

    /// True when the last non-empty line ends with the termination phrase as a word
    fn is_sentinel(&self, content: &str) -> bool {
        let phrase = self.settings.termination_phrase.trim();
        if phrase.is_empty() {
            return false;
        }
        let Some(line) = content.lines().map(str::trim).rfind(|l| !l.is_empty()) else {
            return false;
        };
        let line = line.trim_end_matches(|c: char| c.is_ascii_punctuation());
        match line.strip_suffix(phrase) {
            Some(rest) => rest.is_empty() || rest.ends_with(char::is_whitespace),
            None => false,
        }
    }

    fn append(&self, state: &mut RunState, message: Message) -> Result<()> {
        let appended = state.transcript.append(message)?;
        let terminal = appended.is_terminate();
        self.events.send_message(appended);
        if terminal {
            state.phase = LoopPhase::Terminated;
            state.pending_handoff = None;
        }
        Ok(())
    }
}

/// Race a step against cancellation and the run deadline
async fn guarded<T>(
    work: impl Future<Output = Result<T>>,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<T> {
    let expired = async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = work => result,
        _ = cancel.cancelled() => Err(Error::Cancelled("cancelled by user".to_string())),
        _ = expired => Err(Error::Cancelled("run timeout exceeded".to_string())),
    }
}
