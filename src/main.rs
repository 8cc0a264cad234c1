use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use alchemist_component::ComponentInput;
use alchemist_config::{WorkflowDef, load_workflow_def};
use alchemist_orchestrator::{Orchestrator, OrchestratorConfig, WorkflowStatus};
use alchemist_registry::{ComponentRegistry, resolve};
use alchemist_workflow::ValidatedWorkflow;

mod logging;

/// Alchemist - run component workflows as dependency graphs
#[derive(Parser)]
#[command(name = "alchemist")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log level used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow file and print its execution waves
  Validate {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,
  },

  /// Run a workflow or a single component
  Run {
    #[command(subcommand)]
    target: RunTarget,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire workflow, feeding an optional input mapping from stdin
  /// to its entry points
  Workflow {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,
  },

  /// Run a single component with an input mapping read from stdin
  Component {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,

    /// The component to execute
    #[arg(long)]
    name: String,
  },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  logging::init(&cli.log_level);

  match cli.command {
    Some(Commands::Validate { workflow_file }) => validate(&workflow_file),
    Some(Commands::Run { target }) => {
      let rt = tokio::runtime::Runtime::new()?;
      match target {
        RunTarget::Workflow { workflow_file } => rt.block_on(run_workflow(&workflow_file)),
        RunTarget::Component {
          workflow_file,
          name,
        } => rt.block_on(run_component(&workflow_file, &name)),
      }
    }
    None => {
      println!("alchemist - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

/// Load, resolve and validate a workflow file.
fn load(workflow_file: &Path) -> Result<(WorkflowDef, ValidatedWorkflow)> {
  let def = load_workflow_def(workflow_file)
    .with_context(|| format!("failed to load workflow file: {}", workflow_file.display()))?;

  let registry = ComponentRegistry::with_builtins();
  let workflow = resolve(&def, &registry).context("failed to resolve workflow")?;
  let validated = workflow
    .validate()
    .with_context(|| format!("workflow '{}' is invalid", def.name))?;

  info!(workflow = %def.name, components = validated.len(), "workflow_loaded");
  Ok((def, validated))
}

fn validate(workflow_file: &Path) -> Result<ExitCode> {
  let (def, validated) = load(workflow_file)?;

  println!("workflow '{}' is valid ({} components)", def.name, validated.len());
  for (index, wave) in validated.graph().waves().iter().enumerate() {
    println!("  wave {index}: {}", wave.join(", "));
  }
  Ok(ExitCode::SUCCESS)
}

async fn run_workflow(workflow_file: &Path) -> Result<ExitCode> {
  let (def, validated) = load(workflow_file)?;
  let initial = read_input_from_stdin()?;
  let orchestrator = Orchestrator::new(OrchestratorConfig::from(&def.settings));

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt received, cancelling run");
      on_interrupt.cancel();
    }
  });

  let report = orchestrator
    .run_with_inputs(&validated, initial, cancel)
    .await
    .context("workflow execution failed")?;

  println!("{}", serde_json::to_string_pretty(&report)?);

  if report.status == WorkflowStatus::Completed {
    Ok(ExitCode::SUCCESS)
  } else {
    Ok(ExitCode::FAILURE)
  }
}

async fn run_component(workflow_file: &Path, name: &str) -> Result<ExitCode> {
  let (def, validated) = load(workflow_file)?;
  let input = read_input_from_stdin()?;

  let orchestrator = Orchestrator::new(OrchestratorConfig::from(&def.settings));
  let result = orchestrator
    .execute_component(&validated, name, input)
    .await
    .with_context(|| format!("failed to execute component '{name}'"))?;

  println!("{}", serde_json::to_string_pretty(&result)?);

  if result.is_completed() {
    Ok(ExitCode::SUCCESS)
  } else {
    Ok(ExitCode::FAILURE)
  }
}

/// Read an input mapping (name -> payload) from stdin.
///
/// Empty when stdin is a terminal or blank.
fn read_input_from_stdin() -> Result<ComponentInput> {
  if io::stdin().is_terminal() {
    return Ok(ComponentInput::new());
  }

  let mut raw = String::new();
  io::stdin()
    .read_to_string(&mut raw)
    .context("failed to read input from stdin")?;
  if raw.trim().is_empty() {
    return Ok(ComponentInput::new());
  }

  let value: serde_json::Value =
    serde_json::from_str(&raw).context("failed to parse input JSON from stdin")?;
  match value {
    serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
    other => bail!("input must be a JSON object keyed by name, got: {other}"),
  }
}
