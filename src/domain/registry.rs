//! Output registry
//!
//! Captures the handles each stack exposes and hands them to downstream
//! consumers. Writes are once per `(stack, output)` key; reads are limited
//! to the requester's declared dependencies.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::graph::StackGraph;
use crate::error::RegistryError;

/// Opaque reference to a provisioned resource
///
/// The orchestrator passes handles through unchanged; only stack
/// constructors look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(serde_json::Value);

impl ResourceHandle {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for ResourceHandle {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Outputs of one stack, keyed by output name
pub type StackOutputs = BTreeMap<String, ResourceHandle>;

/// Per-run registry of stack outputs
#[derive(Debug, Clone)]
pub struct OutputRegistry {
    /// stack -> declared dependencies
    visibility: HashMap<String, Vec<String>>,
    /// stack -> output name -> handle
    entries: HashMap<String, StackOutputs>,
}

impl OutputRegistry {
    /// Create an empty registry scoped to the stacks in `graph`.
    pub fn new(graph: &StackGraph) -> Self {
        let visibility = graph
            .nodes()
            .iter()
            .map(|n| (n.name().to_string(), n.dependencies().to_vec()))
            .collect();

        Self {
            visibility,
            entries: HashMap::new(),
        }
    }

    /// Record an output produced by `stack`.
    pub fn record(
        &mut self,
        stack: &str,
        output: &str,
        handle: ResourceHandle,
    ) -> Result<(), RegistryError> {
        if !self.visibility.contains_key(stack) {
            return Err(RegistryError::UnknownStack {
                stack: stack.to_string(),
            });
        }

        let outputs = self.entries.entry(stack.to_string()).or_default();
        if outputs.contains_key(output) {
            return Err(RegistryError::DuplicateOutput {
                stack: stack.to_string(),
                output: output.to_string(),
            });
        }

        outputs.insert(output.to_string(), handle);
        Ok(())
    }

    /// Read `owner.output` on behalf of `requester`.
    ///
    /// `owner` must be one of the requester's declared dependencies.
    pub fn lookup(
        &self,
        requester: &str,
        owner: &str,
        output: &str,
    ) -> Result<&ResourceHandle, RegistryError> {
        let allowed = self
            .visibility
            .get(requester)
            .is_some_and(|deps| deps.iter().any(|d| d == owner));

        if !allowed {
            return Err(RegistryError::UnauthorizedAccess {
                requester: requester.to_string(),
                owner: owner.to_string(),
                output: output.to_string(),
            });
        }

        self.entries
            .get(owner)
            .and_then(|outputs| outputs.get(output))
            .ok_or_else(|| RegistryError::MissingOutput {
                stack: owner.to_string(),
                output: output.to_string(),
                requested_by: requester.to_string(),
            })
    }

    /// All outputs recorded for `stack`, ordered by name.
    pub fn outputs_of(&self, stack: &str) -> Option<&StackOutputs> {
        self.entries.get(stack)
    }

    /// Total number of recorded outputs
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
