//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and the stack constructors.

pub mod deployment;
pub mod orchestrator;

// Re-export commonly used types
pub use deployment::{synthesize, RunOptions};
pub use orchestrator::{CancellationFlag, RunOutcome, StackOrchestrator};
