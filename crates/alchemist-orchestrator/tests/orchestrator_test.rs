//! End-to-end tests for running workflows.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alchemist_component::{
  Component, ComponentInput, ComponentResult, ComponentStatus, ExecutionContext,
};
use alchemist_orchestrator::{
  ChannelNotifier, ExecutionEvent, FailurePolicy, Orchestrator, OrchestratorConfig,
  OrchestratorError, WorkflowStatus,
};
use alchemist_workflow::{Workflow, WorkflowError};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

const NO_DEPS: [&str; 0] = [];

/// Completes with a fixed value.
struct Emit(Value);

#[async_trait]
impl Component for Emit {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    ComponentResult::completed(self.0.clone())
  }
}

/// Completes with its input mapping as an object.
struct Echo;

#[async_trait]
impl Component for Echo {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    let data = input.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    ComponentResult::completed(Value::Object(data))
  }
}

struct Fail(&'static str);

#[async_trait]
impl Component for Fail {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    ComponentResult::failed([self.0])
  }
}

/// Sleeps, ignoring cancellation, then completes.
struct Sleep(u64);

#[async_trait]
impl Component for Sleep {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    tokio::time::sleep(Duration::from_millis(self.0)).await;
    ComponentResult::completed(json!(self.0))
  }
}

/// Sleeps until done or cancelled, failing when cancelled.
struct Interruptible(u64);

#[async_trait]
impl Component for Interruptible {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, ctx: &ExecutionContext) -> ComponentResult {
    tokio::select! {
      _ = tokio::time::sleep(Duration::from_millis(self.0)) => ComponentResult::completed(json!(self.0)),
      _ = ctx.cancel.cancelled() => ComponentResult::failed(["cancelled"]),
    }
  }
}

struct Panic;

#[async_trait]
impl Component for Panic {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    panic!("kaboom");
  }
}

/// Reports a status the orchestrator must never record.
struct StillRunning;

#[async_trait]
impl Component for StillRunning {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    let mut result = ComponentResult::completed(Value::Null);
    result.status = ComponentStatus::Running;
    result
  }
}

/// Tracks how many instances run at the same time.
struct Tracked {
  current: Arc<AtomicUsize>,
  peak: Arc<AtomicUsize>,
}

#[async_trait]
impl Component for Tracked {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    self.current.fetch_sub(1, Ordering::SeqCst);
    ComponentResult::completed(Value::Null)
  }
}

fn orchestrator(policy: FailurePolicy) -> Orchestrator {
  Orchestrator::new(OrchestratorConfig::new().with_failure_policy(policy))
}

fn skip_reason<'a>(report: &'a alchemist_orchestrator::WorkflowReport, name: &str) -> &'a str {
  let result = &report.results[name];
  assert_eq!(result.status, ComponentStatus::Skipped, "{name} should be skipped");
  &result.errors[0]
}

#[tokio::test]
async fn test_failing_filter_yields_partial_completion() {
  let mut workflow = Workflow::new("ingest-filter-report");
  workflow
    .register_component("ingest", NO_DEPS, Arc::new(Emit(json!([1, 2, 3]))))
    .unwrap();
  workflow
    .register_component("filter", ["ingest"], Arc::new(Fail("bad rule")))
    .unwrap();
  workflow
    .register_component("report", ["filter"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = Orchestrator::new(OrchestratorConfig::default())
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::PartiallyCompleted);
  assert_eq!(report.status_of("ingest"), Some(ComponentStatus::Completed));
  assert_eq!(report.status_of("filter"), Some(ComponentStatus::Failed));
  assert_eq!(
    skip_reason(&report, "report"),
    "upstream component 'filter' failed"
  );
  assert_eq!(report.errors, vec!["filter: bad rule".to_string()]);
  assert_eq!(report.workflow, "ingest-filter-report");
}

#[tokio::test]
async fn test_outputs_are_routed_to_dependents() {
  let mut workflow = Workflow::new("routing");
  workflow
    .register_component("ingest", NO_DEPS, Arc::new(Emit(json!([1, 2, 3]))))
    .unwrap();
  workflow
    .register_component("lookup", NO_DEPS, Arc::new(Emit(json!({ "unit": "kg" }))))
    .unwrap();
  workflow
    .register_component("enrich", ["ingest", "lookup"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Completed);
  assert_eq!(
    report.results["enrich"].data,
    json!({ "ingest": [1, 2, 3], "lookup": { "unit": "kg" } })
  );
  assert_eq!(report.outputs().len(), 3);
}

#[tokio::test]
async fn test_fail_fast_skips_chain_without_starting_it() {
  let mut workflow = Workflow::new("chain");
  workflow
    .register_component("a", NO_DEPS, Arc::new(Fail("boom")))
    .unwrap();
  workflow.register_component("b", ["a"], Arc::new(Echo)).unwrap();
  workflow.register_component("c", ["b"], Arc::new(Echo)).unwrap();
  let validated = workflow.validate().unwrap();

  let (notifier, mut events) = ChannelNotifier::channel();
  let report = Orchestrator::with_notifier(OrchestratorConfig::default(), notifier)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Failed);
  assert_eq!(skip_reason(&report, "b"), "upstream component 'a' failed");
  assert_eq!(skip_reason(&report, "c"), "upstream component 'a' failed");

  let mut started = Vec::new();
  while let Ok(event) = events.try_recv() {
    if let ExecutionEvent::ComponentStarted { component, .. } = event {
      started.push(component);
    }
  }
  assert_eq!(started, vec!["a".to_string()]);
}

#[tokio::test]
async fn test_independent_branch_is_isolated_from_failure() {
  let mut workflow = Workflow::new("branches");
  workflow
    .register_component("left", NO_DEPS, Arc::new(Fail("boom")))
    .unwrap();
  workflow
    .register_component("left_child", ["left"], Arc::new(Echo))
    .unwrap();
  workflow
    .register_component("right", NO_DEPS, Arc::new(Sleep(10)))
    .unwrap();
  workflow
    .register_component("right_child", ["right"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::PartiallyCompleted);
  assert_eq!(report.status_of("right"), Some(ComponentStatus::Completed));
  assert_eq!(report.status_of("right_child"), Some(ComponentStatus::Completed));
  assert_eq!(report.results["right_child"].data, json!({ "right": 10 }));
  assert_eq!(report.status_of("left_child"), Some(ComponentStatus::Skipped));
}

#[tokio::test]
async fn test_continue_policy_skips_lazily() {
  let mut workflow = Workflow::new("continue");
  workflow
    .register_component("a", NO_DEPS, Arc::new(Fail("boom")))
    .unwrap();
  workflow.register_component("b", ["a"], Arc::new(Echo)).unwrap();
  workflow.register_component("c", ["b"], Arc::new(Echo)).unwrap();
  workflow
    .register_component("d", NO_DEPS, Arc::new(Emit(json!("ok"))))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::Continue)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::PartiallyCompleted);
  assert_eq!(skip_reason(&report, "b"), "dependency 'a' did not complete");
  assert_eq!(skip_reason(&report, "c"), "dependency 'b' did not complete");
  assert_eq!(report.status_of("d"), Some(ComponentStatus::Completed));
}

#[tokio::test]
async fn test_abort_policy_cancels_unstarted_components() {
  let mut workflow = Workflow::new("abort");
  workflow
    .register_component("boom", NO_DEPS, Arc::new(Fail("boom")))
    .unwrap();
  workflow
    .register_component("slow", NO_DEPS, Arc::new(Sleep(50)))
    .unwrap();
  workflow
    .register_component("after_slow", ["slow"], Arc::new(Echo))
    .unwrap();
  workflow
    .register_component("after_boom", ["boom"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let caller = CancellationToken::new();
  let report = orchestrator(FailurePolicy::Abort)
    .run(&validated, caller.clone())
    .await
    .unwrap();

  // Already running when the run was aborted, so it finishes.
  assert_eq!(report.status_of("slow"), Some(ComponentStatus::Completed));
  assert_eq!(report.status_of("boom"), Some(ComponentStatus::Failed));
  assert_eq!(skip_reason(&report, "after_slow"), "run cancelled");
  assert_eq!(skip_reason(&report, "after_boom"), "run cancelled");
  assert_eq!(report.status, WorkflowStatus::PartiallyCompleted);
  assert!(!caller.is_cancelled());
}

#[tokio::test]
async fn test_external_cancellation() {
  let mut workflow = Workflow::new("cancel");
  workflow
    .register_component("slow", NO_DEPS, Arc::new(Sleep(100)))
    .unwrap();
  workflow
    .register_component("next", ["slow"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    trigger.cancel();
  });

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, cancel)
    .await
    .unwrap();

  assert_eq!(report.status_of("slow"), Some(ComponentStatus::Completed));
  assert_eq!(skip_reason(&report, "next"), "run cancelled");
}

#[tokio::test]
async fn test_cancellation_wins_over_failure_of_interrupted_component() {
  let mut workflow = Workflow::new("interrupted");
  workflow
    .register_component("slow", NO_DEPS, Arc::new(Interruptible(10_000)))
    .unwrap();
  workflow
    .register_component("next", ["slow"], Arc::new(Echo))
    .unwrap();
  workflow
    .register_component("last", ["next"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    trigger.cancel();
  });

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, cancel)
    .await
    .unwrap();

  assert_eq!(report.results["slow"].errors, vec!["cancelled".to_string()]);
  assert_eq!(report.results["next"].errors, vec!["run cancelled".to_string()]);
  assert_eq!(report.results["last"].errors, vec!["run cancelled".to_string()]);
  assert_eq!(report.status, WorkflowStatus::Failed);
}

#[tokio::test]
async fn test_cancelled_before_start_skips_everything() {
  let mut workflow = Workflow::new("cancelled");
  workflow
    .register_component("a", NO_DEPS, Arc::new(Emit(json!(1))))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let cancel = CancellationToken::new();
  cancel.cancel();
  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, cancel)
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Failed);
  assert_eq!(skip_reason(&report, "a"), "run cancelled");
}

#[tokio::test]
async fn test_max_concurrency_bounds_in_flight_components() {
  let current = Arc::new(AtomicUsize::new(0));
  let peak = Arc::new(AtomicUsize::new(0));

  let mut workflow = Workflow::new("bounded");
  for i in 0..6 {
    let component = Tracked {
      current: current.clone(),
      peak: peak.clone(),
    };
    workflow
      .register_component(format!("worker_{i}"), NO_DEPS, Arc::new(component))
      .unwrap();
  }
  let validated = workflow.validate().unwrap();

  let config = OrchestratorConfig::new().with_max_concurrency(2);
  let report = Orchestrator::new(config)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Completed);
  assert_eq!(report.results.len(), 6);
  assert!(peak.load(Ordering::SeqCst) <= 2);
  assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_component_timeout() {
  let mut workflow = Workflow::new("timeout");
  workflow
    .register_component("slow", NO_DEPS, Arc::new(Sleep(500)))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let config = OrchestratorConfig::new().with_component_timeout(Duration::from_millis(20));
  let report = Orchestrator::new(config)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  let result = &report.results["slow"];
  assert_eq!(result.status, ComponentStatus::Failed);
  assert_eq!(result.errors, vec!["timeout".to_string()]);
}

#[tokio::test]
async fn test_panic_is_trapped() {
  let mut workflow = Workflow::new("panic");
  workflow
    .register_component("unstable", NO_DEPS, Arc::new(Panic))
    .unwrap();
  workflow
    .register_component("steady", NO_DEPS, Arc::new(Emit(json!(true))))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  let result = &report.results["unstable"];
  assert_eq!(result.status, ComponentStatus::Failed);
  assert_eq!(result.errors, vec!["component panicked: kaboom".to_string()]);
  assert_eq!(report.status_of("steady"), Some(ComponentStatus::Completed));
}

#[tokio::test]
async fn test_non_terminal_status_is_recorded_as_failure() {
  let mut workflow = Workflow::new("non-terminal");
  workflow
    .register_component("confused", NO_DEPS, Arc::new(StillRunning))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status_of("confused"), Some(ComponentStatus::Failed));
}

#[tokio::test]
async fn test_events_follow_dependency_order() {
  let mut workflow = Workflow::new("diamond");
  workflow
    .register_component("a", NO_DEPS, Arc::new(Emit(json!(1))))
    .unwrap();
  workflow.register_component("b", ["a"], Arc::new(Sleep(10))).unwrap();
  workflow.register_component("c", ["a"], Arc::new(Echo)).unwrap();
  workflow
    .register_component("d", ["b", "c"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let (notifier, mut receiver) = ChannelNotifier::channel();
  let report = Orchestrator::with_notifier(OrchestratorConfig::default(), notifier)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.status, WorkflowStatus::Completed);

  let mut events = Vec::new();
  while let Ok(event) = receiver.try_recv() {
    events.push(event);
  }

  assert!(matches!(events.first(), Some(ExecutionEvent::RunStarted { .. })));
  assert!(matches!(
    events.last(),
    Some(ExecutionEvent::RunFinished {
      status: WorkflowStatus::Completed,
      ..
    })
  ));

  let position = |name: &str, terminal: bool| {
    events
      .iter()
      .position(|e| {
        e.component() == Some(name) && (matches!(e, ExecutionEvent::ComponentStarted { .. }) != terminal)
      })
      .unwrap()
  };
  for (component, deps) in [("b", vec!["a"]), ("c", vec!["a"]), ("d", vec!["b", "c"])] {
    for dep in deps {
      assert!(position(dep, true) < position(component, false));
    }
  }
}

#[tokio::test]
async fn test_initial_inputs_reach_entry_points_only() {
  let mut workflow = Workflow::new("seeded");
  workflow.register_component("ingest", NO_DEPS, Arc::new(Echo)).unwrap();
  workflow.register_component("audit", NO_DEPS, Arc::new(Echo)).unwrap();
  workflow
    .register_component("report", ["ingest"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let mut initial = ComponentInput::new();
  initial.insert("source".to_string(), json!("s3://bucket/rows.csv"));

  let report = orchestrator(FailurePolicy::FailFast)
    .run_with_inputs(&validated, initial, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Completed);
  assert_eq!(report.results["ingest"].data, json!({ "source": "s3://bucket/rows.csv" }));
  assert_eq!(report.results["audit"].data, json!({ "source": "s3://bucket/rows.csv" }));
  assert_eq!(
    report.results["report"].data,
    json!({ "ingest": { "source": "s3://bucket/rows.csv" } })
  );
}

#[tokio::test]
async fn test_long_chain_completes() {
  let len = 2_000;
  let name = |i: usize| format!("step-{i:04}");

  let mut workflow = Workflow::new("chain");
  workflow
    .register_component(&name(0), NO_DEPS, Arc::new(Emit(json!(0))))
    .unwrap();
  for i in 1..len {
    workflow
      .register_component(&name(i), [name(i - 1)], Arc::new(Emit(json!(i))))
      .unwrap();
  }
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Completed);
  assert_eq!(report.results.len(), len);
  assert_eq!(report.results[&name(len - 1)].data, json!(len - 1));
}

#[tokio::test]
async fn test_empty_workflow_is_completed() {
  let validated = Workflow::new("empty").validate().unwrap();
  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(report.status, WorkflowStatus::Completed);
  assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_run_workflow_rejects_cycles() {
  let mut workflow = Workflow::new("cyclic");
  workflow.register_component("a", ["c"], Arc::new(Echo)).unwrap();
  workflow.register_component("b", ["a"], Arc::new(Echo)).unwrap();
  workflow.register_component("c", ["b"], Arc::new(Echo)).unwrap();

  let err = orchestrator(FailurePolicy::FailFast)
    .run_workflow(&workflow, CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    OrchestratorError::Workflow(WorkflowError::CycleDetected { .. })
  ));
}

#[tokio::test]
async fn test_execute_component_in_isolation() {
  let mut workflow = Workflow::new("single");
  workflow
    .register_component("ingest", NO_DEPS, Arc::new(Emit(json!([]))))
    .unwrap();
  workflow
    .register_component("report", ["ingest"], Arc::new(Echo))
    .unwrap();
  let validated = workflow.validate().unwrap();
  let orchestrator = orchestrator(FailurePolicy::FailFast);

  let mut input = ComponentInput::new();
  input.insert("ingest".to_string(), json!(["hand", "written"]));
  let result = orchestrator
    .execute_component(&validated, "report", input)
    .await
    .unwrap();
  assert_eq!(result.status, ComponentStatus::Completed);
  assert_eq!(result.data, json!({ "ingest": ["hand", "written"] }));

  let err = orchestrator
    .execute_component(&validated, "ghost", ComponentInput::new())
    .await
    .unwrap_err();
  assert!(matches!(err, OrchestratorError::ComponentNotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn test_report_serializes_to_json() {
  let mut workflow = Workflow::new("serialize");
  workflow
    .register_component("a", NO_DEPS, Arc::new(Fail("nope")))
    .unwrap();
  let validated = workflow.validate().unwrap();

  let report = orchestrator(FailurePolicy::FailFast)
    .run(&validated, CancellationToken::new())
    .await
    .unwrap();
  let value = serde_json::to_value(&report).unwrap();

  assert_eq!(value["status"], "failed");
  assert_eq!(value["results"]["a"]["status"], "failed");
  assert_eq!(value["results"]["a"]["errors"], json!(["nope"]));
  assert!(value["duration_ms"].is_u64());
}
