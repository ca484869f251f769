//! CLI definitions for hrapp-provision
//!
//! This module contains all CLI argument parsing structures using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "hrapp-provision",
    version,
    about = "Stack orchestrator for the HR App Lab infrastructure",
    long_about = "Resolves deployment context, validates the stack graph, and constructs every stack\n\
    in dependency order, threading outputs between them.\n\n\
    The deployment plan is written to stdout (or --output); diagnostics go to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Construct every stack and write the deployment plan
    #[command(visible_alias = "deploy")]
    Synth {
        #[command(flatten)]
        context: ContextArgs,

        /// Plan output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the plan to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit structured HRAPP_EVENT lines to stderr
        #[arg(long)]
        events: bool,
    },

    /// Validate the stack graph and print the construction order
    Graph,
}

/// Deployment context sources
#[derive(Args, Debug, Clone)]
pub struct ContextArgs {
    /// YAML or JSON context file (flat mapping or cdk.json with a `context` key)
    #[arg(long, env = "HRAPP_CONTEXT_FILE")]
    pub context_file: Option<PathBuf>,

    /// Context override, repeatable (e.g. -c deployment_id=lab01 -c owner=alice)
    #[arg(short = 'c', long = "context", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Target account
    #[arg(long, env = "CDK_DEFAULT_ACCOUNT")]
    pub account: Option<String>,

    /// Target region (default: us-east-1)
    #[arg(long, env = "CDK_DEFAULT_REGION")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_synth() {
        let cli = Cli::parse_from([
            "hrapp-provision",
            "synth",
            "-c",
            "deployment_id=lab01",
            "-c",
            "owner=alice",
            "--format",
            "yaml",
            "--region",
            "eu-west-1",
        ]);

        match cli.command {
            Commands::Synth {
                context, format, ..
            } => {
                assert_eq!(context.overrides, vec!["deployment_id=lab01", "owner=alice"]);
                assert_eq!(context.region.as_deref(), Some("eu-west-1"));
                assert_eq!(format, OutputFormat::Yaml);
            }
            Commands::Graph => panic!("expected synth"),
        }
    }

    #[test]
    fn test_deploy_alias() {
        let cli = Cli::parse_from(["hrapp-provision", "deploy", "-c", "owner=alice"]);
        assert!(matches!(cli.command, Commands::Synth { .. }));
    }
}
