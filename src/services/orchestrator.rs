//! Stack orchestrator - executes the stack graph
//!
//! Walks the graph in topological order, wires each stack's inputs from the
//! output registry, invokes the constructor once per stack, and records what
//! it returns. Execution is strictly sequential: a consumer never starts
//! before every producer it reads from has finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{DeploymentParameters, EnvironmentContext};
use crate::domain::graph::{StackGraph, StackNode};
use crate::domain::registry::OutputRegistry;
use crate::domain::tags::TagSet;
use crate::domain::topology::stack_id;
use crate::error::{ProvisionError, RegistryError, StackConstructionError};
use crate::infrastructure::{ConstructRequest, StackConstructor, StackInputs};
use crate::observability::{EventMetadata, RunTracker, StackDuration};

/// Coarse cancellation for a run
///
/// Once set, no further stack is started. A construction already in
/// progress always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunOutcome {
    /// Every output recorded during the run
    pub registry: OutputRegistry,
    /// Stacks in the order they were constructed
    pub order: Vec<String>,
    /// Per-stack timings
    pub stacks: Vec<StackDuration>,
}

/// Executes a stack graph against a constructor
pub struct StackOrchestrator<'c> {
    constructor: &'c dyn StackConstructor,
    cancellation: CancellationFlag,
    emit_events: bool,
}

impl<'c> StackOrchestrator<'c> {
    pub fn new(constructor: &'c dyn StackConstructor) -> Self {
        Self {
            constructor,
            cancellation: CancellationFlag::new(),
            emit_events: false,
        }
    }

    /// Builder: share a cancellation flag with the caller
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Builder: write structured run events to stderr
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.emit_events = enabled;
        self
    }

    /// Construct every stack in `graph`.
    ///
    /// The first failure aborts the run; nothing is retried or rolled back.
    pub async fn execute(
        &self,
        graph: &StackGraph,
        params: &DeploymentParameters,
        tags: &TagSet,
        env: &EnvironmentContext,
    ) -> Result<RunOutcome, ProvisionError> {
        let mut tracker = RunTracker::new(EventMetadata::new(params, env), self.emit_events);
        let mut registry = OutputRegistry::new(graph);
        let mut completed: Vec<String> = Vec::with_capacity(graph.nodes().len());

        let order = graph.order_names();
        info!(
            "Constructing {} stacks for deployment {}: {}",
            order.len(),
            params.deployment_id(),
            order.join(" → ")
        );
        tracker.emit_started(order);

        for node in graph.topological_order() {
            let result = self
                .construct_node(node, params, tags, env, &mut registry, &completed, &mut tracker)
                .await;

            if let Err(e) = result {
                warn!("Run aborted at stack {}: {}", node.name(), e);
                tracker.emit_failed(&e.to_string());
                return Err(e);
            }

            completed.push(node.name().to_string());
        }

        info!(
            "All {} stacks constructed in {:.1}s",
            completed.len(),
            tracker.elapsed_secs()
        );

        Ok(RunOutcome {
            registry,
            order: completed,
            stacks: tracker.emit_completed(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn construct_node(
        &self,
        node: &StackNode,
        params: &DeploymentParameters,
        tags: &TagSet,
        env: &EnvironmentContext,
        registry: &mut OutputRegistry,
        completed: &[String],
        tracker: &mut RunTracker,
    ) -> Result<(), ProvisionError> {
        if self.cancellation.is_cancelled() {
            return Err(ProvisionError::Cancelled {
                next: node.name().to_string(),
                completed: completed.to_vec(),
            });
        }

        let inputs = gather_inputs(registry, node)?;
        let id = stack_id(params.deployment_id(), node.name());

        info!("Starting stack {} ({})", node.name(), id);
        tracker.start_stack(node.name());

        let request = ConstructRequest {
            stack: node,
            stack_id: &id,
            inputs: &inputs,
            params,
            tags,
            env,
        };

        let outputs = match self.constructor.construct(request).await {
            Ok(outputs) => outputs,
            Err(e) => {
                let err = StackConstructionError {
                    stack: node.name().to_string(),
                    completed: completed.to_vec(),
                    reason: format!("{:#}", e),
                };
                tracker.fail_stack(&err.to_string());
                return Err(err.into());
            }
        };

        let mut recorded = Vec::with_capacity(outputs.len());
        for (name, handle) in outputs {
            if !node.declares_output(&name) {
                warn!(
                    "Stack {} produced undeclared output '{}'; recording it anyway",
                    node.name(),
                    name
                );
            }
            registry.record(node.name(), &name, handle)?;
            recorded.push(name);
        }

        debug!("Stack {} recorded outputs: {:?}", node.name(), recorded);
        tracker.complete_stack(recorded);
        Ok(())
    }
}

/// Look up every input a node consumes, on the node's behalf.
fn gather_inputs(registry: &OutputRegistry, node: &StackNode) -> Result<StackInputs, RegistryError> {
    node.inputs()
        .iter()
        .map(|input| {
            registry
                .lookup(node.name(), &input.producer, &input.output)
                .map(|handle| (input.name.clone(), handle.clone()))
        })
        .collect()
}
