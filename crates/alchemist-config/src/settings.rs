use serde::{Deserialize, Serialize};

/// What happens to the rest of a run when a component fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Dependents of a failed component are skipped as soon as it fails;
  /// independent branches run to completion.
  #[default]
  FailFast,
  /// Dependents are skipped only once they would otherwise become ready,
  /// because one of their inputs is missing.
  Continue,
  /// The first failure cancels the run. Running components finish, nothing
  /// new is started.
  Abort,
}

/// Run-level settings carried by a workflow definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
  #[serde(default)]
  pub failure_policy: FailurePolicy,

  /// Upper bound on concurrently running components. Unbounded when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_concurrency: Option<usize>,

  /// Per-component execution timeout in milliseconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub component_timeout_ms: Option<u64>,
}
