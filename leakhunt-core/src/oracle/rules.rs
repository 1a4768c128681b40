//! Deterministic rule-table oracle

use async_trait::async_trait;

use crate::agents::{classify, RequestKind, CLARIFY, RECON, REPORT, SCAN, SEARCH};
use crate::orchestrator::{Payload, USER};
use crate::Result;

use super::{Decision, DecisionOracle, OracleRequest};

/// Routes on who spoke last and what they produced
///
/// | last speaker | outcome                                            |
/// |--------------|----------------------------------------------------|
/// | user         | `search` (brand, URL), `recon` (domain), undecided |
/// | search       | `scan` with repositories, otherwise `report`       |
/// | scan         | `report`                                           |
/// | anything else| terminate                                          |
///
/// A target that is not registered is skipped in favour of termination, so
/// a trimmed registry never makes this oracle select an unknown name.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleOracle;

impl RuleOracle {
    pub fn new() -> Self {
        Self
    }
}

fn available(request: &OracleRequest<'_>, name: &str) -> bool {
    request.descriptions.iter().any(|d| d.name == name)
}

#[async_trait]
impl DecisionOracle for RuleOracle {
    fn name(&self) -> &str {
        "rules"
    }

    async fn decide(&self, request: &OracleRequest<'_>) -> Result<Decision> {
        let Some(last) = request.transcript.last() else {
            return Ok(Decision::Undecided);
        };

        let next = match last.speaker.as_str() {
            USER => match classify(&last.content) {
                RequestKind::Repository(_) | RequestKind::Brand(_) => SEARCH,
                RequestKind::Domain(_) => RECON,
                RequestKind::Unclear => return Ok(Decision::Undecided),
            },
            SEARCH => match &last.payload {
                Some(Payload::Repositories(repos)) if !repos.is_empty() => SCAN,
                _ => REPORT,
            },
            SCAN => REPORT,
            REPORT | RECON | CLARIFY => return Ok(Decision::Terminate),
            _ => return Ok(Decision::Undecided),
        };

        if available(request, next) {
            Ok(Decision::Select(next.to_string()))
        } else {
            Ok(Decision::Terminate)
        }
    }
}
