//! HR App Lab stack orchestrator
//!
//! Resolves the deployment context, validates the stack graph, and
//! constructs each stack in dependency order:
//! network, security, storage → data → secrets → compute
//!
//! Every stack and resource carries the same Project/DeploymentID/Owner tags.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod cli;

use cli::{Cli, Commands, ContextArgs, OutputFormat};
use hrapp_provision::config::{load_raw_context, EnvironmentContext};
use hrapp_provision::domain::build_graph;
use hrapp_provision::infrastructure::SynthConstructor;
use hrapp_provision::services::{synthesize, CancellationFlag, RunOptions};
use hrapp_provision::ui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_filter = if cli.verbose {
        "hrapp_provision=debug"
    } else {
        "hrapp_provision=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Synth {
            context,
            format,
            output,
            events,
        } => handle_synth(context, format, output, events).await,
        Commands::Graph => handle_graph(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::print_error(&format!("Provisioning failed: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn handle_synth(
    context: ContextArgs,
    format: OutputFormat,
    output: Option<std::path::PathBuf>,
    events: bool,
) -> Result<()> {
    if let Some(path) = &context.context_file {
        info!("Loading deployment context from: {}", path.display());
    }

    let raw = load_raw_context(context.context_file.as_deref(), &context.overrides)
        .context("Failed to load deployment context")?;
    let env = EnvironmentContext::resolve(context.account, context.region);

    let cancellation = CancellationFlag::new();
    let flag = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing the current stack, then stopping");
            flag.cancel();
        }
    });

    let constructor = SynthConstructor::new();
    let plan = synthesize(
        &raw,
        &env,
        &constructor,
        RunOptions {
            cancellation,
            emit_events: events,
        },
    )
    .await?;

    let rendered = match format {
        OutputFormat::Json => plan.to_json().context("Failed to render plan as JSON")?,
        OutputFormat::Yaml => plan.to_yaml().context("Failed to render plan as YAML")?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            info!("Plan written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    ui::print_plan_summary(&plan);
    ui::print_success(&format!(
        "Deployment {} synthesized ({} stacks)",
        plan.deployment_id,
        plan.stacks.len()
    ));
    Ok(())
}

fn handle_graph() -> Result<()> {
    let graph = build_graph().context("Stack graph is invalid")?;

    ui::print_header("Stack construction order");
    ui::print_stack_order(
        graph
            .topological_order()
            .map(|n| (n.name(), n.dependencies())),
    );
    eprintln!();
    ui::print_info(&format!("{} stacks, no cycles", graph.nodes().len()));

    // The order itself is the command's output
    for name in graph.order_names() {
        println!("{}", name);
    }
    Ok(())
}
