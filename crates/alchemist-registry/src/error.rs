use alchemist_workflow::WorkflowError;
use thiserror::Error;

/// Errors raised while building components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  /// No factory is registered for the kind.
  #[error("unknown component kind: {0}")]
  UnknownKind(String),

  /// A factory is already registered for the kind.
  #[error("component kind already registered: {0}")]
  DuplicateKind(String),

  /// The factory rejected the configuration.
  #[error("invalid config for component kind '{kind}': {message}")]
  InvalidConfig { kind: String, message: String },
}

/// Errors that can occur while resolving a workflow definition.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Component `name` could not be built.
  #[error("component '{name}': {source}")]
  Component {
    name: String,
    #[source]
    source: RegistryError,
  },

  /// The component was built but could not be registered.
  #[error(transparent)]
  Workflow(#[from] WorkflowError),
}
