//! Deployment plan
//!
//! The synthesized result of a successful run: which stacks exist, in what
//! order they were built, and the handles each one exposes.

use serde::Serialize;

use crate::config::{DeploymentParameters, EnvironmentContext};
use crate::domain::graph::StackGraph;
use crate::domain::registry::{OutputRegistry, StackOutputs};
use crate::domain::tags::{TagSet, PROJECT};
use crate::domain::topology::stack_id;

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStack {
    pub name: String,
    pub stack_id: String,
    pub dependencies: Vec<String>,
    pub outputs: StackOutputs,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub project: String,
    pub deployment_id: String,
    pub environment: EnvironmentContext,
    pub tags: TagSet,
    /// Stacks in construction order
    pub stacks: Vec<PlannedStack>,
}

impl DeploymentPlan {
    /// Assemble the plan from a completed run
    ///
    /// `order` is the construction order; stacks not in the graph are skipped.
    pub fn assemble(
        params: &DeploymentParameters,
        tags: &TagSet,
        env: &EnvironmentContext,
        graph: &StackGraph,
        order: &[String],
        registry: &OutputRegistry,
    ) -> Self {
        let stacks = order
            .iter()
            .filter_map(|name| graph.node(name))
            .map(|node| PlannedStack {
                name: node.name().to_string(),
                stack_id: stack_id(params.deployment_id(), node.name()),
                dependencies: node.dependencies().to_vec(),
                outputs: registry
                    .outputs_of(node.name())
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            project: PROJECT.to_string(),
            deployment_id: params.deployment_id().to_string(),
            environment: env.clone(),
            tags: tags.clone(),
            stacks,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.name.as_str()).collect()
    }
}
