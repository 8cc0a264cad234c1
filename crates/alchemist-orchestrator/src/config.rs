//! Configuration for the orchestrator.

use std::time::Duration;

use alchemist_config::{FailurePolicy, RunSettings};

/// Configuration for orchestrator runs.
///
/// ```ignore
/// let config = OrchestratorConfig::new()
///   .with_failure_policy(FailurePolicy::Continue)
///   .with_max_concurrency(4)
///   .with_component_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
  /// How a component failure affects the rest of the run.
  pub failure_policy: FailurePolicy,

  /// Maximum number of components executing at once.
  ///
  /// `None` runs every ready component immediately. A value of zero is
  /// treated as one.
  pub max_concurrency: Option<usize>,

  /// Deadline for a single `execute` call. Expiry produces a failed result
  /// with the error `timeout`.
  pub component_timeout: Option<Duration>,
}

impl OrchestratorConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
    self.failure_policy = policy;
    self
  }

  pub fn with_max_concurrency(mut self, max: usize) -> Self {
    self.max_concurrency = Some(max);
    self
  }

  pub fn with_component_timeout(mut self, timeout: Duration) -> Self {
    self.component_timeout = Some(timeout);
    self
  }

  pub(crate) fn permits(&self) -> Option<usize> {
    self.max_concurrency.map(|max| max.max(1))
  }
}

impl From<&RunSettings> for OrchestratorConfig {
  fn from(settings: &RunSettings) -> Self {
    Self {
      failure_policy: settings.failure_policy,
      max_concurrency: settings.max_concurrency,
      component_timeout: settings.component_timeout_ms.map(Duration::from_millis),
    }
  }
}
