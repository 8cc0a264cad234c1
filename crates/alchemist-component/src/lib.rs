//! Alchemist Component
//!
//! This crate defines the contract between the orchestrator and the units of
//! work it schedules. Every component implements [`Component`]:
//!
//! - `validate_config` is a pure check run once, when the component is
//!   registered into a workflow.
//! - `execute` receives the outputs of its upstream dependencies, keyed by
//!   dependency name, and reports a [`ComponentResult`].
//!
//! Components never return errors out of `execute`. Internal failures are
//! reported as a `failed` result with a populated error list, so the
//! orchestrator always has a well-formed result to act on.

mod component;
mod config;
mod result;

pub mod duration_ms;

pub use component::{Component, ComponentInput, ExecutionContext};
pub use config::ComponentConfig;
pub use result::{ComponentResult, ComponentStatus};
