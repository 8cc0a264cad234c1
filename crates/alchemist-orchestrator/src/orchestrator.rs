//! Workflow orchestrator.
//!
//! The `Orchestrator` drives validated workflows to completion, running every
//! component whose dependencies have completed concurrently.

use alchemist_component::{ComponentInput, ComponentResult, ExecutionContext, duration_ms};
use alchemist_workflow::{ValidatedWorkflow, Workflow};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::report::WorkflowReport;
use crate::scheduler::{Scheduler, execute_guarded};

/// Runs workflows.
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `Orchestrator::new()` for an orchestrator with no-op notifications,
/// or `Orchestrator::with_notifier()` to observe events.
///
/// Holds no per-run state, so one orchestrator can drive any number of runs,
/// concurrently or not.
pub struct Orchestrator<N: ExecutionNotifier = NoopNotifier> {
  config: OrchestratorConfig,
  notifier: N,
}

impl Orchestrator<NoopNotifier> {
  /// Create an orchestrator that discards events.
  pub fn new(config: OrchestratorConfig) -> Self {
    Self::with_notifier(config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> Orchestrator<N> {
  /// Create an orchestrator with a custom notifier.
  pub fn with_notifier(config: OrchestratorConfig, notifier: N) -> Self {
    Self { config, notifier }
  }

  pub fn config(&self) -> &OrchestratorConfig {
    &self.config
  }

  /// Execute every component of `workflow` and aggregate the outcome.
  ///
  /// Component failures never surface as `Err`; they are part of the report.
  /// Cancelling `cancel` stops new components from starting. Components that
  /// are already running are left to finish.
  pub async fn run(
    &self,
    workflow: &ValidatedWorkflow,
    cancel: CancellationToken,
  ) -> Result<WorkflowReport, OrchestratorError> {
    self
      .run_with_inputs(workflow, ComponentInput::new(), cancel)
      .await
  }

  /// Like [`run`](Self::run), but every entry point receives `initial` as
  /// its input instead of an empty mapping.
  #[instrument(name = "workflow_run", skip_all, fields(workflow = %workflow.name()))]
  pub async fn run_with_inputs(
    &self,
    workflow: &ValidatedWorkflow,
    initial: ComponentInput,
    cancel: CancellationToken,
  ) -> Result<WorkflowReport, OrchestratorError> {
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(
      execution_id = %execution_id,
      components = workflow.len(),
      initial_inputs = initial.len(),
      failure_policy = ?self.config.failure_policy,
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.clone(),
      workflow: workflow.name().to_string(),
    });

    // Our own token, so the abort policy never cancels the caller's.
    let run_cancel = cancel.child_token();
    let aggregator = Scheduler::new(
      workflow,
      &self.config,
      &self.notifier,
      execution_id.clone(),
      run_cancel,
      initial,
    )
    .run()
    .await?;

    let report = aggregator.finish(execution_id.clone(), workflow);

    info!(
      execution_id = %execution_id,
      status = %report.status,
      duration_ms = duration_ms::millis(report.duration),
      "workflow_completed"
    );
    self.notifier.notify(ExecutionEvent::RunFinished {
      execution_id,
      status: report.status,
    });

    Ok(report)
  }

  /// Validate `workflow`, then run it.
  pub async fn run_workflow(
    &self,
    workflow: &Workflow,
    cancel: CancellationToken,
  ) -> Result<WorkflowReport, OrchestratorError> {
    let validated = workflow.validate()?;
    self.run(&validated, cancel).await
  }

  /// Run a single component in isolation with a caller-supplied input.
  ///
  /// Dependencies are not consulted. Useful for debugging one component
  /// against a hand-written input.
  #[instrument(name = "component_execute", skip(self, workflow, input))]
  pub async fn execute_component(
    &self,
    workflow: &ValidatedWorkflow,
    name: &str,
    input: ComponentInput,
  ) -> Result<ComponentResult, OrchestratorError> {
    let component = workflow
      .get_component(name)
      .cloned()
      .ok_or_else(|| OrchestratorError::ComponentNotFound(name.to_string()))?;

    let execution_id = uuid::Uuid::new_v4().to_string();
    let ctx = ExecutionContext::new(execution_id, name);
    let result = execute_guarded(component, &input, &ctx, self.config.component_timeout).await;

    info!(
      component = %name,
      status = %result.status,
      duration_ms = duration_ms::millis(result.duration),
      "component_finished"
    );
    Ok(result)
  }
}
