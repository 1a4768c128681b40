//! Capability registry
//!
//! Built once at startup and shared read-only behind an `Arc` afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Error, Result};

use super::Capability;

/// Name and description pair shown to the decision oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescription {
    pub name: String,
    pub description: String,
}

/// Static table of the capabilities available to a run
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<Arc<dyn Capability>>,
    index: HashMap<String, usize>,
    clarifier: Option<String>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability; names are unique
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateCapability(name));
        }
        self.index.insert(name, self.capabilities.len());
        self.capabilities.push(capability);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Capability>> {
        self.index
            .get(name)
            .and_then(|&i| self.capabilities.get(i))
            .cloned()
            .ok_or_else(|| Error::UnknownCapability(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Descriptions in registration order
    pub fn descriptions(&self) -> Vec<CapabilityDescription> {
        self.capabilities
            .iter()
            .map(|c| CapabilityDescription {
                name: c.name().to_string(),
                description: c.profile().description.clone(),
            })
            .collect()
    }

    /// Designate the capability used when the oracle cannot decide
    pub fn set_clarifier(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(Error::UnknownCapability(name.to_string()));
        }
        self.clarifier = Some(name.to_string());
        Ok(())
    }

    pub fn clarifier(&self) -> Option<Arc<dyn Capability>> {
        self.clarifier
            .as_deref()
            .and_then(|name| self.resolve(name).ok())
    }

    /// Check that `from` may hand control to `to`
    ///
    /// The target must be registered. When `from` is a registered capability
    /// the target must also be one of its declared hand-off targets.
    pub fn validate_handoff(&self, from: &str, to: &str) -> Result<()> {
        if !self.contains(to) {
            return Err(Error::InvalidHandoff {
                from: from.to_string(),
                to: to.to_string(),
                reason: "target is not a registered capability".to_string(),
            });
        }
        if let Ok(source) = self.resolve(from) {
            if !source.profile().can_handoff_to.contains(to) {
                return Err(Error::InvalidHandoff {
                    from: from.to_string(),
                    to: to.to_string(),
                    reason: format!("{} does not hand off to {}", from, to),
                });
            }
        }
        Ok(())
    }
}
