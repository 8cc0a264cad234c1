//! Orchestrator error types.

use alchemist_workflow::WorkflowError;

/// Broken internal invariants. These indicate a defect in the orchestrator,
/// never a component failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
  /// A second terminal result was recorded for the same component.
  #[error("result for component '{0}' was already recorded")]
  DuplicateResult(String),

  /// A result with a non-terminal status was handed to the aggregator.
  #[error("result for component '{component}' is not terminal (status: {status})")]
  NonTerminalResult { component: String, status: String },

  /// Input was requested for a component whose dependency has not completed.
  #[error("dependency '{dependency}' of component '{component}' has not completed")]
  UnfinalizedDependency {
    component: String,
    dependency: String,
  },

  /// A component was launched twice within one run.
  #[error("component '{0}' was already started")]
  AlreadyStarted(String),

  /// A name that is not part of the workflow graph reached the scheduler.
  #[error("component '{0}' is not part of the workflow")]
  UnknownComponent(String),

  /// The run ended with components that were neither started nor skipped.
  #[error("components never scheduled: {}", .0.join(", "))]
  Stalled(Vec<String>),

  /// A component task did not hand back a result.
  #[error("component task join error: {0}")]
  TaskJoin(String),
}

/// Errors returned by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
  /// The workflow failed structural validation before anything ran.
  #[error("invalid workflow: {0}")]
  Workflow(#[from] WorkflowError),

  /// The requested component does not exist in the workflow.
  #[error("component not found: {0}")]
  ComponentNotFound(String),

  /// An internal invariant was violated during the run.
  #[error("orchestrator invariant violated: {0}")]
  Invariant(#[from] InvariantViolation),
}
