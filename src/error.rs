//! Centralized error types for hrapp-provision
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for a provisioning run
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stack graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Output registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Construction(#[from] StackConstructionError),

    #[error("Run cancelled before stack '{next}' started (completed: {completed:?})")]
    Cancelled { next: String, completed: Vec<String> },
}

/// Deployment parameter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required context parameter missing: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Context file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse context: {message}")]
    ParseError { message: String },
}

impl ConfigError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Structural defects in a stack topology
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Circular dependency detected among stacks: {stacks:?}")]
    Cycle { stacks: Vec<String> },

    #[error("Stack '{stack}' depends on unknown stack '{dependency}'")]
    UnknownDependency { stack: String, dependency: String },

    #[error("Stack '{stack}' is declared more than once")]
    DuplicateStack { stack: String },

    #[error("Stack '{stack}' consumes input '{input}' from '{producer}', which is not a declared dependency")]
    InputNotFromDependency {
        stack: String,
        input: String,
        producer: String,
    },

    #[error("Stack '{stack}' consumes output '{output}' which stack '{producer}' does not produce")]
    UnknownOutput {
        stack: String,
        producer: String,
        output: String,
    },
}

/// Output registry contract violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Output '{stack}.{output}' was never produced (requested by '{requested_by}')")]
    MissingOutput {
        stack: String,
        output: String,
        requested_by: String,
    },

    #[error("Output '{stack}.{output}' was already recorded")]
    DuplicateOutput { stack: String, output: String },

    #[error("Stack '{requester}' may not read '{owner}.{output}': '{owner}' is not one of its dependencies")]
    UnauthorizedAccess {
        requester: String,
        owner: String,
        output: String,
    },

    #[error("Stack '{stack}' is not part of the stack graph")]
    UnknownStack { stack: String },
}

/// Failure reported by the stack constructor for a single node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Stack '{stack}' failed to construct (completed: {completed:?}): {reason}")]
pub struct StackConstructionError {
    /// Stack whose construction failed
    pub stack: String,
    /// Stacks that finished before the failure, in construction order
    pub completed: Vec<String>,
    /// Rendered error chain from the constructor
    pub reason: String,
}
