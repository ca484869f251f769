//! Domain layer - pure orchestration logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod graph;
pub mod plan;
pub mod registry;
pub mod tags;
pub mod topology;

// Re-export commonly used types
pub use graph::{InputBinding, StackGraph, StackNode};
pub use plan::{DeploymentPlan, PlannedStack};
pub use registry::{OutputRegistry, ResourceHandle, StackOutputs};
pub use tags::{derive_tags, TagSet};
pub use topology::build_graph;
