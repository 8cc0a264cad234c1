//! Completion-driven scheduling of one run.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alchemist_component::{
  Component, ComponentInput, ComponentResult, ComponentStatus, ExecutionContext, duration_ms,
};
use alchemist_config::FailurePolicy;
use alchemist_workflow::ValidatedWorkflow;
use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::aggregator::RunAggregator;
use crate::config::OrchestratorConfig;
use crate::error::InvariantViolation;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::router::DataRouter;

pub(crate) const CANCELLED_REASON: &str = "run cancelled";
pub(crate) const TIMEOUT_ERROR: &str = "timeout";

/// What a component task hands back to the coordinator.
type Finished = (String, ComponentResult);

/// State of one run.
///
/// Owned by a single coordinating task. Component tasks never touch it; they
/// return their result through the join set and the coordinator records it.
pub(crate) struct Scheduler<'a, N: ExecutionNotifier> {
  workflow: &'a ValidatedWorkflow,
  config: &'a OrchestratorConfig,
  notifier: &'a N,
  execution_id: String,
  cancel: CancellationToken,
  semaphore: Option<Arc<Semaphore>>,
  /// Input handed to every entry point.
  initial: ComponentInput,
  aggregator: RunAggregator,
  /// Per component, how many dependencies have not finalized yet.
  remaining: BTreeMap<String, usize>,
  /// Components whose dependencies have all finalized, in the order they got there.
  ready: VecDeque<String>,
  started: BTreeSet<String>,
  in_flight: JoinSet<Finished>,
}

impl<'a, N: ExecutionNotifier> Scheduler<'a, N> {
  pub(crate) fn new(
    workflow: &'a ValidatedWorkflow,
    config: &'a OrchestratorConfig,
    notifier: &'a N,
    execution_id: String,
    cancel: CancellationToken,
    initial: ComponentInput,
  ) -> Self {
    let graph = workflow.graph();
    let remaining = graph
      .names()
      .map(|name| (name.to_string(), graph.upstream(name).len()))
      .collect();

    Self {
      workflow,
      config,
      notifier,
      execution_id,
      cancel,
      semaphore: config.permits().map(|n| Arc::new(Semaphore::new(n))),
      initial,
      aggregator: RunAggregator::new(),
      remaining,
      ready: graph.entry_points().iter().cloned().collect(),
      started: BTreeSet::new(),
      in_flight: JoinSet::new(),
    }
  }

  /// Drive the run until every component has a terminal result.
  pub(crate) async fn run(mut self) -> Result<RunAggregator, InvariantViolation> {
    loop {
      if !self.cancel.is_cancelled() {
        self.advance()?;
      }

      if self.in_flight.is_empty() {
        break;
      }

      match self.in_flight.join_next().await {
        Some(Ok((name, result))) => self.finalize(&name, result)?,
        Some(Err(e)) => return Err(InvariantViolation::TaskJoin(e.to_string())),
        None => break,
      }
    }

    self.skip_unstarted()?;
    Ok(self.aggregator)
  }

  /// Components that have neither started nor finalized.
  fn pending(&self) -> Vec<String> {
    self
      .workflow
      .graph()
      .names()
      .filter(|name| !self.started.contains(*name) && !self.aggregator.is_finalized(name))
      .map(str::to_string)
      .collect()
  }

  /// Start every ready component, skipping those whose inputs can no longer
  /// be produced. Each skip may make further components ready, which are
  /// handled in the same pass.
  fn advance(&mut self) -> Result<(), InvariantViolation> {
    let mut blocked = VecDeque::new();

    while let Some(name) = self.ready.pop_front() {
      if self.started.contains(&name) || self.aggregator.is_finalized(&name) {
        continue;
      }

      let router = DataRouter::new(self.workflow.graph(), &self.aggregator);
      if let Some(dep) = router.unmet_dependency(&name) {
        let reason = format!("dependency '{dep}' did not complete");
        self.skip(&name, reason)?;
        continue;
      }

      let permit = match &self.semaphore {
        Some(semaphore) => match semaphore.clone().try_acquire_owned() {
          Ok(permit) => Some(permit),
          // Gate full. This component starts once a running one finishes.
          Err(_) => {
            blocked.push_back(name);
            continue;
          }
        },
        None => None,
      };

      let input = if self.workflow.graph().upstream(&name).is_empty() {
        self.initial.clone()
      } else {
        router.build_input(&name)?
      };
      self.launch(&name, input, permit)?;
    }

    self.ready = blocked;
    Ok(())
  }

  /// Count `name` as finalized for its dependents and queue the ones it
  /// was the last dependency of.
  fn release_dependents(&mut self, name: &str) {
    let workflow = self.workflow;
    for dependent in workflow.graph().downstream(name) {
      if let Some(count) = self.remaining.get_mut(dependent) {
        *count = count.saturating_sub(1);
        if *count == 0 {
          self.ready.push_back(dependent.clone());
        }
      }
    }
  }

  /// Spawn the execution of one component.
  fn launch(
    &mut self,
    name: &str,
    input: ComponentInput,
    permit: Option<OwnedSemaphorePermit>,
  ) -> Result<(), InvariantViolation> {
    let component = self
      .workflow
      .get_component(name)
      .cloned()
      .ok_or_else(|| InvariantViolation::UnknownComponent(name.to_string()))?;
    if !self.started.insert(name.to_string()) {
      return Err(InvariantViolation::AlreadyStarted(name.to_string()));
    }

    info!(
      execution_id = %self.execution_id,
      component = %name,
      upstream = ?input.keys().collect::<Vec<_>>(),
      "component_started"
    );
    self.notifier.notify(ExecutionEvent::ComponentStarted {
      execution_id: self.execution_id.clone(),
      component: name.to_string(),
    });

    let ctx = ExecutionContext::new(self.execution_id.clone(), name)
      .with_cancel(self.cancel.child_token());
    let timeout = self.config.component_timeout;
    let span = info_span!("component_execute", component = %name);
    let name = name.to_string();

    self.in_flight.spawn(
      async move {
        let _permit = permit;
        let result = execute_guarded(component, &input, &ctx, timeout).await;
        (name, result)
      }
      .instrument(span),
    );

    Ok(())
  }

  /// Record a finished component and apply the failure policy.
  fn finalize(&mut self, name: &str, result: ComponentResult) -> Result<(), InvariantViolation> {
    let status = result.status;
    let event = match status {
      ComponentStatus::Completed => {
        info!(
          execution_id = %self.execution_id,
          component = %name,
          duration_ms = duration_ms::millis(result.duration),
          "component_completed"
        );
        ExecutionEvent::ComponentCompleted {
          execution_id: self.execution_id.clone(),
          component: name.to_string(),
          data: result.data.clone(),
        }
      }
      ComponentStatus::Skipped => {
        info!(
          execution_id = %self.execution_id,
          component = %name,
          "component_skipped"
        );
        ExecutionEvent::ComponentSkipped {
          execution_id: self.execution_id.clone(),
          component: name.to_string(),
          reason: result.errors.join("; "),
        }
      }
      _ => {
        error!(
          execution_id = %self.execution_id,
          component = %name,
          errors = ?result.errors,
          "component_failed"
        );
        ExecutionEvent::ComponentFailed {
          execution_id: self.execution_id.clone(),
          component: name.to_string(),
          errors: result.errors.clone(),
        }
      }
    };

    self.aggregator.record(name, result)?;
    self.notifier.notify(event);
    self.release_dependents(name);

    if status == ComponentStatus::Failed {
      self.on_failure(name)?;
    }
    Ok(())
  }

  fn on_failure(&mut self, name: &str) -> Result<(), InvariantViolation> {
    // Once cancelled, everything unstarted is settled as cancelled when the
    // run drains, whatever failed in the meantime.
    if self.cancel.is_cancelled() {
      return Ok(());
    }

    match self.config.failure_policy {
      FailurePolicy::FailFast => {
        let reason = format!("upstream component '{name}' failed");
        for dependent in self.workflow.graph().transitive_dependents(name) {
          if self.started.contains(&dependent) || self.aggregator.is_finalized(&dependent) {
            continue;
          }
          self.skip(&dependent, reason.clone())?;
        }
      }
      // Dependents are settled lazily by `advance`.
      FailurePolicy::Continue => {}
      FailurePolicy::Abort => {
        warn!(
          execution_id = %self.execution_id,
          component = %name,
          "aborting run after component failure"
        );
        self.cancel.cancel();
      }
    }
    Ok(())
  }

  fn skip(&mut self, name: &str, reason: String) -> Result<(), InvariantViolation> {
    debug!(
      execution_id = %self.execution_id,
      component = %name,
      reason = %reason,
      "component_skipped"
    );
    self
      .aggregator
      .record(name, ComponentResult::skipped(reason.clone()))?;
    self.notifier.notify(ExecutionEvent::ComponentSkipped {
      execution_id: self.execution_id.clone(),
      component: name.to_string(),
      reason,
    });
    self.release_dependents(name);
    Ok(())
  }

  /// Settle whatever never started once nothing is running.
  fn skip_unstarted(&mut self) -> Result<(), InvariantViolation> {
    let pending = self.pending();
    if pending.is_empty() {
      return Ok(());
    }
    if !self.cancel.is_cancelled() {
      return Err(InvariantViolation::Stalled(pending));
    }

    warn!(
      execution_id = %self.execution_id,
      skipped = pending.len(),
      "run cancelled before all components started"
    );
    for name in pending {
      self.skip(&name, CANCELLED_REASON.to_string())?;
    }
    Ok(())
  }
}

/// Run a component's `execute` behind the orchestrator boundary.
///
/// Applies the optional timeout, turns a panic into a failed result, and
/// stamps the measured wall-clock duration. Never fails.
pub(crate) async fn execute_guarded(
  component: Arc<dyn Component>,
  input: &ComponentInput,
  ctx: &ExecutionContext,
  timeout: Option<Duration>,
) -> ComponentResult {
  let started = Instant::now();

  let execution = AssertUnwindSafe(async {
    match timeout {
      Some(limit) => tokio::time::timeout(limit, component.execute(input, ctx))
        .await
        .unwrap_or_else(|_| {
          warn!(component = %ctx.component, timeout_ms = duration_ms::millis(limit), "component timed out");
          ComponentResult::failed([TIMEOUT_ERROR])
        }),
      None => component.execute(input, ctx).await,
    }
  })
  .catch_unwind()
  .await;

  let result = match execution {
    Ok(result) if result.status.is_terminal() => result,
    Ok(result) => ComponentResult::failed([format!(
      "component returned non-terminal status '{}'",
      result.status
    )]),
    Err(panic) => {
      let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
      error!(component = %ctx.component, panic = %message, "component panicked");
      ComponentResult::failed([format!("component panicked: {message}")])
    }
  };

  result.with_duration(started.elapsed())
}
