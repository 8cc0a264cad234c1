//! Component registry for alchemist.
//!
//! Maps component kinds to factories and turns a [`WorkflowDef`] into a
//! [`Workflow`] ready for validation.
//!
//! [`WorkflowDef`]: alchemist_config::WorkflowDef
//! [`Workflow`]: alchemist_workflow::Workflow

mod builtin;
mod error;
mod registry;
mod resolve;

pub use builtin::{Constant, Delay, Fail, Passthrough};
pub use error::{RegistryError, ResolveError};
pub use registry::{ComponentFactory, ComponentRegistry};
pub use resolve::resolve;
