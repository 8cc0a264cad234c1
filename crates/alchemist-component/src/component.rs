use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::result::ComponentResult;

/// Input handed to a component: upstream dependency name -> that dependency's output.
pub type ComponentInput = BTreeMap<String, serde_json::Value>;

/// Per-invocation context passed alongside the input.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
  pub execution_id: String,
  pub component: String,
  /// Signalled when the run is cancelled. Honouring it is up to the component;
  /// the orchestrator never interrupts a running component.
  pub cancel: CancellationToken,
}

impl ExecutionContext {
  pub fn new(execution_id: impl Into<String>, component: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
      component: component.into(),
      cancel: CancellationToken::new(),
    }
  }

  pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }
}

/// A unit of work the orchestrator can schedule.
///
/// Implementations own their configuration and must not share mutable state
/// with other components. Their only interaction is the input mapping.
#[async_trait]
pub trait Component: Send + Sync {
  /// Check that the component's configuration is well-formed.
  ///
  /// Must be pure. A component whose config is invalid is never registered.
  fn validate_config(&self) -> bool;

  /// Do the work.
  ///
  /// Failures are reported through [`ComponentResult::failed`], never by
  /// panicking. Any retry policy belongs inside this call.
  async fn execute(&self, input: &ComponentInput, ctx: &ExecutionContext) -> ComponentResult;
}
