//! hrapp-provision
//!
//! Configuration-driven stack orchestration for the HR App Lab:
//! resolve parameters, derive tags, validate the stack graph, then construct
//! stacks in dependency order while threading named outputs between them.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod observability;
pub mod services;
pub mod ui;
pub mod validation;

pub use error::{ConfigError, GraphError, ProvisionError, RegistryError, StackConstructionError};
