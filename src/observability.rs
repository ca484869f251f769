//! # Run Observability Module
//!
//! Structured events for provisioning runs.
//!
//! ## Event Flow
//!
//! ```text
//! hrapp-provision → JSON stderr (HRAPP_EVENT: prefix) → log shipper
//! ```
//!
//! Events are only written when enabled (`--events`), so interactive runs
//! stay readable. Stdout is reserved for the deployment plan.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{DeploymentParameters, EnvironmentContext};

/// Event prefix so collectors can pick events out of the log stream
const EVENT_PREFIX: &str = "HRAPP_EVENT:";

/// Run event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum RunEvent {
    /// Orchestration started
    RunStarted(RunStartedEvent),
    /// A stack's constructor is about to be invoked
    StackStarted(StackStartedEvent),
    /// A stack's outputs were recorded
    StackCompleted(StackCompletedEvent),
    /// A stack failed; the run aborts
    StackFailed(StackFailedEvent),
    /// Every stack completed
    RunCompleted(RunCompletedEvent),
    /// The run aborted
    RunFailed(RunFailedEvent),
}

/// Common fields for all events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Timestamp in RFC3339 format
    pub timestamp: String,
    pub deployment_id: String,
    pub owner: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Hostname of the machine running the orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl EventMetadata {
    pub fn new(params: &DeploymentParameters, env: &EnvironmentContext) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            deployment_id: params.deployment_id().to_string(),
            owner: params.owner().to_string(),
            region: env.region.clone(),
            account: env.account.clone(),
            hostname: std::env::var("HOSTNAME").ok(),
        }
    }

    /// Copy of the metadata stamped with the current time
    fn now(&self) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// Stacks in construction order
    pub stacks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackStartedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub stack: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackCompletedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub stack: String,
    pub duration_secs: f64,
    /// Names of the outputs recorded for the stack
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackFailedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub stack: String,
    pub duration_secs: f64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub duration_secs: f64,
    pub stack_durations: Vec<StackDuration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub duration_secs: f64,
    /// Stacks that completed before the failure
    pub completed: Vec<String>,
    pub error: String,
}

/// Timing of a single stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDuration {
    pub stack: String,
    pub duration_secs: f64,
    pub status: StackStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    Success,
    Failed,
}

/// Writes a structured event as JSON to stderr
///
/// Events are prefixed with `HRAPP_EVENT:`.
pub fn emit_event(event: &RunEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            eprintln!("{}{}", EVENT_PREFIX, json);
        }
        Err(e) => {
            tracing::error!("Failed to serialize event: {}", e);
        }
    }
}

/// Helper to track stack timing
struct StackTimer {
    name: String,
    start: Instant,
}

impl StackTimer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    fn finish(self, status: StackStatus) -> StackDuration {
        StackDuration {
            stack: self.name,
            duration_secs: self.start.elapsed().as_secs_f64(),
            status,
        }
    }
}

/// Per-run tracker: timings plus optional event emission
pub struct RunTracker {
    metadata: EventMetadata,
    start: Instant,
    stacks: Vec<StackDuration>,
    current: Option<StackTimer>,
    emit: bool,
}

impl RunTracker {
    pub fn new(metadata: EventMetadata, emit: bool) -> Self {
        Self {
            metadata,
            start: Instant::now(),
            stacks: Vec::new(),
            current: None,
            emit,
        }
    }

    fn send(&self, event: RunEvent) {
        if self.emit {
            emit_event(&event);
        }
    }

    pub fn emit_started(&self, stacks: Vec<String>) {
        self.send(RunEvent::RunStarted(RunStartedEvent {
            metadata: self.metadata.now(),
            stacks,
        }));
    }

    /// Start timing a stack
    pub fn start_stack(&mut self, name: &str) {
        self.current = Some(StackTimer::new(name));
        self.send(RunEvent::StackStarted(StackStartedEvent {
            metadata: self.metadata.now(),
            stack: name.to_string(),
        }));
    }

    /// Mark the current stack as completed
    pub fn complete_stack(&mut self, outputs: Vec<String>) {
        if let Some(timer) = self.current.take() {
            let duration = timer.finish(StackStatus::Success);
            self.send(RunEvent::StackCompleted(StackCompletedEvent {
                metadata: self.metadata.now(),
                stack: duration.stack.clone(),
                duration_secs: duration.duration_secs,
                outputs,
            }));
            self.stacks.push(duration);
        }
    }

    /// Mark the current stack as failed
    pub fn fail_stack(&mut self, error: &str) {
        if let Some(timer) = self.current.take() {
            let duration = timer.finish(StackStatus::Failed);
            self.send(RunEvent::StackFailed(StackFailedEvent {
                metadata: self.metadata.now(),
                stack: duration.stack.clone(),
                duration_secs: duration.duration_secs,
                error: error.to_string(),
            }));
            self.stacks.push(duration);
        }
    }

    /// Emit the completion event and hand back the stack timings
    pub fn emit_completed(self) -> Vec<StackDuration> {
        self.send(RunEvent::RunCompleted(RunCompletedEvent {
            metadata: self.metadata.now(),
            duration_secs: self.elapsed_secs(),
            stack_durations: self.stacks.clone(),
        }));
        self.stacks
    }

    pub fn emit_failed(mut self, error: &str) {
        // A stack still in flight here failed outside its constructor
        if self.current.is_some() {
            self.fail_stack(error);
        }

        let completed = self
            .stacks
            .iter()
            .filter(|s| s.status == StackStatus::Success)
            .map(|s| s.stack.clone())
            .collect();

        self.send(RunEvent::RunFailed(RunFailedEvent {
            metadata: self.metadata.now(),
            duration_secs: self.elapsed_secs(),
            completed,
            error: error.to_string(),
        }));
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
