//! Workflow orchestrator for alchemist.
//!
//! Runs a validated component graph: components start as soon as every one
//! of their dependencies has completed, their outputs are routed to their
//! dependents, and the run ends with a single [`WorkflowReport`].
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//! ├── run(workflow, cancel) -> WorkflowReport
//! ├── run_workflow(workflow, cancel) - validate, then run
//! └── execute_component(workflow, name, input) -> ComponentResult
//!
//! Scheduler (one per run, single coordinating task)
//! ├── DataRouter    - input = outputs of completed dependencies
//! ├── RunAggregator - one terminal result per component
//! └── JoinSet       - one tokio task per started component
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use alchemist_orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let validated = workflow.validate()?;
//! let orchestrator = Orchestrator::new(OrchestratorConfig::default());
//! let report = orchestrator.run(&validated, CancellationToken::new()).await?;
//! ```

mod aggregator;
mod config;
mod error;
mod events;
mod orchestrator;
mod report;
mod router;
mod scheduler;

pub use aggregator::RunAggregator;
pub use alchemist_config::FailurePolicy;
pub use config::OrchestratorConfig;
pub use error::{InvariantViolation, OrchestratorError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use orchestrator::Orchestrator;
pub use report::{WorkflowReport, WorkflowStatus};
pub use router::DataRouter;
