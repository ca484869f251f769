//! Infrastructure layer - stack constructor adapters
//!
//! The orchestrator never creates resources itself. It hands each stack to a
//! [`StackConstructor`], which returns the named handles the stack exposes.
//!
//! - [`SynthConstructor`]: built-in constructor that synthesizes logical
//!   resource descriptions without calling any provider

pub mod synth;

use async_trait::async_trait;

use crate::config::{DeploymentParameters, EnvironmentContext};
use crate::domain::graph::StackNode;
use crate::domain::registry::{ResourceHandle, StackOutputs};
use crate::domain::tags::TagSet;

pub use synth::SynthConstructor;

/// Handles a stack receives, keyed by its local input names
pub type StackInputs = std::collections::BTreeMap<String, ResourceHandle>;

/// Everything a constructor needs to build one stack
#[derive(Debug, Clone, Copy)]
pub struct ConstructRequest<'a> {
    pub stack: &'a StackNode,
    /// Physical stack identifier, e.g. `hrapp-lab01-network`
    pub stack_id: &'a str,
    pub inputs: &'a StackInputs,
    pub params: &'a DeploymentParameters,
    pub tags: &'a TagSet,
    pub env: &'a EnvironmentContext,
}

impl<'a> ConstructRequest<'a> {
    /// Fetch a required input by its local name
    pub fn input(&self, name: &str) -> anyhow::Result<&'a ResourceHandle> {
        self.inputs.get(name).ok_or_else(|| {
            anyhow::anyhow!(
                "stack '{}' was not given input '{}'",
                self.stack.name(),
                name
            )
        })
    }
}

/// Builds a single logical stack.
///
/// Called once per stack per run. Implementations may block for as long
/// as provisioning takes; they are never interrupted mid-call.
#[async_trait]
pub trait StackConstructor: Send + Sync {
    async fn construct(&self, request: ConstructRequest<'_>) -> anyhow::Result<StackOutputs>;
}
