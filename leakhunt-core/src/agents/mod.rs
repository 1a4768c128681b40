//! Capabilities available to the orchestration loop

pub mod clarify;
pub mod prompts;
pub mod recon;
pub mod registry;
pub mod report;
pub mod request;
pub mod scanner;
pub mod search;
pub mod traits;

use std::sync::Arc;

pub use clarify::ClarifyAgent;
pub use prompts::Prompts;
pub use recon::ReconAgent;
pub use registry::{CapabilityDescription, CapabilityRegistry};
pub use report::ReportAgent;
pub use request::{classify, RequestKind};
pub use scanner::ScanAgent;
pub use search::SearchAgent;
pub use traits::{AgentStatus, Capability, CapabilityProfile, Reply, TurnContext};

use crate::config::LeakhuntConfig;
use crate::tools::{
    CodeSearchTool, GitleaksTool, PortScanTool, ToolExecutor, ToolRef, TrufflehogTool, WhoisTool,
};
use crate::{Error, Result};

/// Capability names
pub const SEARCH: &str = "search";
pub const SCAN: &str = "scan";
pub const REPORT: &str = "report";
pub const RECON: &str = "recon";
pub const CLARIFY: &str = "clarify";

/// Build the standard registry with real tools
///
/// `clarify` is registered as the fallback for oracle indecision.
pub fn build_registry(
    config: &LeakhuntConfig,
    executor: Arc<ToolExecutor>,
    prompts: &Prompts,
) -> Result<CapabilityRegistry> {
    let code_search: ToolRef = Arc::new(
        CodeSearchTool::new(&config.github)
            .map_err(|e| Error::Config(format!("Failed to build code search: {}", e)))?,
    );
    let trufflehog: ToolRef = Arc::new(TrufflehogTool::new(executor.clone(), &config.scanners));
    let gitleaks: ToolRef = Arc::new(GitleaksTool::new(executor.clone(), &config.scanners));
    let whois: ToolRef = Arc::new(WhoisTool::new(executor.clone(), &config.recon));
    let port_scan: ToolRef = Arc::new(PortScanTool::new(executor, &config.recon));

    let describe = |name: &str| prompts.description(name).unwrap_or_default().trim().to_string();

    let mut registry = CapabilityRegistry::new();
    registry.register(Arc::new(SearchAgent::new(
        code_search,
        describe(SEARCH),
        config.github.query_terms.clone(),
    )))?;
    registry.register(Arc::new(ScanAgent::new(
        vec![trufflehog, gitleaks],
        describe(SCAN),
    )))?;
    registry.register(Arc::new(ReportAgent::new(describe(REPORT))))?;
    registry.register(Arc::new(ReconAgent::new(
        whois,
        port_scan,
        config.recon.nmap_args.clone(),
        describe(RECON),
    )))?;
    registry.register(Arc::new(ClarifyAgent::new(describe(CLARIFY))))?;
    registry.set_clarifier(CLARIFY)?;

    Ok(registry)
}
