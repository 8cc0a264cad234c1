//! Alchemist Config
//!
//! This crate contains the serializable workflow configuration types for Alchemist.
//! These types represent workflow definitions before their components are built
//! by a registry and registered into a workflow graph.
//!
//! Configuration can be loaded from:
//! - JSON or YAML files (via CLI with `alchemist run workflow workflow.yaml`)
//! - Any other source that can produce a [`WorkflowDef`] through serde
//!
//! The registry takes these definitions, creates one component per enabled
//! [`ComponentDef`], and registers them with their declared dependencies.

mod component;
mod loader;
mod settings;
mod workflow;

pub use component::ComponentDef;
pub use loader::{
  ConfigError, Format, load_workflow_def, parse_workflow_def, parse_workflow_def_as,
  save_workflow_def,
};
pub use settings::{FailurePolicy, RunSettings};
pub use workflow::WorkflowDef;
