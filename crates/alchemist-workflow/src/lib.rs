//! Alchemist Workflow
//!
//! This crate provides the workflow graph for Alchemist. A [`Workflow`] is
//! built by registering components with their upstream dependencies, then
//! validated into a [`ValidatedWorkflow`]:
//!
//! - every dependency names a registered component
//! - the dependency relation has no cycles
//! - entry points, join points and execution waves are identified
//!
//! Only a [`ValidatedWorkflow`] can be handed to the orchestrator.

mod error;
mod graph;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use workflow::{Registration, ValidatedWorkflow, Workflow};
