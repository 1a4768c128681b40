//! Network reconnaissance capability

use async_trait::async_trait;

use crate::tools::{ToolOutput, ToolRef, ToolResult, PORT_SCAN, WHOIS};
use crate::{Error, Result};

use super::request::{classify, RequestKind};
use super::{Capability, CapabilityProfile, Reply, TurnContext, RECON};

/// Runs WHOIS and a port scan against the requested domain
///
/// Output is passed through untouched and the run ends.
pub struct ReconAgent {
    profile: CapabilityProfile,
    nmap_args: String,
}

impl ReconAgent {
    pub fn new(
        whois: ToolRef,
        port_scan: ToolRef,
        nmap_args: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            profile: CapabilityProfile::new(RECON, description)
                .with_tool(whois)
                .with_tool(port_scan),
            nmap_args: nmap_args.into(),
        }
    }

    fn tool(&self, name: &str) -> Result<&ToolRef> {
        self.profile
            .tool(name)
            .ok_or_else(|| Error::Agent(format!("{} has no {} tool", RECON, name)))
    }
}

fn section(title: &str, result: ToolResult) -> String {
    match result {
        Ok(ToolOutput::Text(text)) if !text.trim().is_empty() => {
            format!("## {}\n{}", title, text.trim_end())
        }
        Ok(_) => format!("## {}\n(no output)", title),
        Err(e) => format!("## {}\nfailed: {}", title, e),
    }
}

#[async_trait]
impl Capability for ReconAgent {
    fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    async fn act(&self, ctx: &TurnContext<'_>) -> Result<Vec<Reply>> {
        let domain = match classify(ctx.request()) {
            RequestKind::Domain(domain) => domain,
            _ => {
                return Ok(vec![Reply::terminate(
                    "Reconnaissance needs a domain name, for example example.com.",
                )])
            }
        };

        let whois = self.tool(WHOIS)?;
        let port_scan = self.tool(PORT_SCAN)?;
        let scan_args = format!("{} {}", self.nmap_args, domain);

        let (whois_result, scan_result) =
            tokio::join!(whois.invoke(&domain), port_scan.invoke(&scan_args));

        let content = format!(
            "{}\n\n{}",
            section(&format!("WHOIS {}", domain), whois_result),
            section(&format!("Port scan: nmap {}", scan_args.trim()), scan_result)
        );
        Ok(vec![Reply::terminate(content)])
    }
}
