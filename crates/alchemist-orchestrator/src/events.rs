//! Execution events and notifiers for observability.
//!
//! Events are emitted by the coordinating task during a run, in causal order:
//! a component's `ComponentStarted` always follows the terminal event of each
//! of its dependencies.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::report::WorkflowStatus;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// A run has started.
  RunStarted {
    execution_id: String,
    workflow: String,
  },

  /// A component has been handed its input and is executing.
  ComponentStarted {
    execution_id: String,
    component: String,
  },

  /// A component has completed successfully.
  ComponentCompleted {
    execution_id: String,
    component: String,
    data: serde_json::Value,
  },

  /// A component reported a failure.
  ComponentFailed {
    execution_id: String,
    component: String,
    errors: Vec<String>,
  },

  /// A component was never started.
  ComponentSkipped {
    execution_id: String,
    component: String,
    reason: String,
  },

  /// The run has finished and its report is assembled.
  RunFinished {
    execution_id: String,
    status: WorkflowStatus,
  },
}

impl ExecutionEvent {
  /// The component this event is about, if any.
  pub fn component(&self) -> Option<&str> {
    match self {
      Self::ComponentStarted { component, .. }
      | Self::ComponentCompleted { component, .. }
      | Self::ComponentFailed { component, .. }
      | Self::ComponentSkipped { component, .. } => Some(component),
      Self::RunStarted { .. } | Self::RunFinished { .. } => None,
    }
  }
}

/// Trait for receiving execution events.
///
/// The orchestrator calls `notify` for each event - implementations decide
/// what to do with them (persist, broadcast, log, ignore, etc.).
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Use this to consume events asynchronously (stream to a UI, persist, or
/// assert on ordering in tests).
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls the coordinating task. Volume is
  // a handful of events per component.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
