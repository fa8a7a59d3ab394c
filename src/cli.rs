//! Command-Line Interface
//!
//! Argument surface and command execution for the `toolsmith` binary:
//! `generate` runs the synthesis pipeline and persists the artifact,
//! `doctor` probes provider connectivity, and the `config` group manages the
//! configuration file.

use crate::config::{ConfigLoader, ProviderConfig, ProviderKind, ToolConfig};
use crate::diagnostics::{self, DiagnosticReport};
use crate::error::ToolError;
use crate::pipeline::SynthesisPipeline;
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use dialoguer::{Confirm, Input};
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "toolsmith",
    version,
    about = "Generate self-contained HTML tools from free-text requests"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an HTML tool and save it to the output directory
    Generate {
        /// Free-text description of the tool
        request: String,

        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Probe provider connectivity and report the first broken layer
    Doctor {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactively create a configuration file
    Init,

    /// Write a commented example configuration
    Example {
        /// Destination path (default: toolsmith.example.toml)
        path: Option<PathBuf>,
    },

    /// Load and validate the configuration, listing providers
    Check,
}

/// Execute a parsed command.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Generate {
            request,
            output_dir,
        } => {
            let mut config = load_config(cli)?;
            if let Some(dir) = output_dir {
                config.output_dir = dir.clone();
            }
            generate(&config, request).await
        }
        Command::Doctor { json } => {
            let config = load_config(cli)?;
            doctor(&config, *json).await
        }
        Command::Config { command } => match command {
            ConfigCommand::Init => config_init(),
            ConfigCommand::Example { path } => {
                let path = path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("toolsmith.example.toml"));
                ConfigLoader::write_example(&path)?;
                println!(
                    "{} example configuration written to {}",
                    "✓".green(),
                    path.display()
                );
                Ok(())
            }
            ConfigCommand::Check => {
                let config = load_config(cli)?;
                config_check(&config)
            }
        },
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ToolConfig> {
    ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")
}

async fn generate(config: &ToolConfig, request: &str) -> anyhow::Result<()> {
    let pipeline = SynthesisPipeline::from_config(config)?;

    let content = match pipeline.synthesize(request).await {
        Ok(content) => content,
        Err(e) => {
            if let Some(hint) = advice(&e) {
                eprintln!("{} {}", "hint:".yellow(), hint);
            }
            return Err(e.into());
        }
    };

    let path = pipeline.store().save(request, &content)?;
    println!("{} tool generated", "✓".green());
    println!("saved to: {}", path.display());
    println!("open it directly in a browser");
    Ok(())
}

/// Operator advice for common failure shapes.
fn advice(err: &ToolError) -> Option<&'static str> {
    match err {
        ToolError::GenerationUnavailable(_) => {
            Some("run `toolsmith config init` to configure a provider, or `toolsmith config check`")
        }
        ToolError::AllProvidersFailed(_) => {
            Some("run `toolsmith doctor` to find out which layer is failing")
        }
        ToolError::ProviderAuthFailed(_) => Some("check the api_key values in your configuration"),
        ToolError::ProviderRequestFailed(msg) if msg.contains("timeout") => {
            Some("consider raising generation.read_timeout_secs in the configuration")
        }
        _ => None,
    }
}

async fn doctor(config: &ToolConfig, json: bool) -> anyhow::Result<()> {
    let report = diagnostics::diagnose(config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    if report.healthy() {
        Ok(())
    } else {
        anyhow::bail!("diagnostics failed: {}", report.overall_status)
    }
}

fn print_report(report: &DiagnosticReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["check", "status", "detail"]);
    for check in &report.checks {
        let status = if check.success {
            "pass".green().to_string()
        } else {
            "fail".red().to_string()
        };
        table.add_row(vec![
            Cell::new(&check.name),
            Cell::new(status),
            Cell::new(&check.message),
        ]);
    }
    println!("{table}");
    if report.healthy() {
        println!("{} {}", "✓".green(), report.summary);
    } else {
        println!("{} {}: {}", "✗".red(), report.overall_status, report.summary);
    }
}

fn config_check(config: &ToolConfig) -> anyhow::Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["priority", "name", "kind", "endpoint", "model"]);
    for (i, provider) in config.providers.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&provider.name),
            Cell::new(format!("{:?}", provider.kind).to_lowercase()),
            Cell::new(provider.effective_base_url()),
            Cell::new(&provider.model),
        ]);
    }
    println!("{table}");

    if config.providers.is_empty() {
        println!("{} no providers configured", "✗".red());
    } else if config.generation.enabled {
        println!(
            "{} generation enabled with {} provider(s)",
            "✓".green(),
            config.providers.len()
        );
    } else {
        println!(
            "{} generation disabled (generation.enabled = false)",
            "✗".red()
        );
    }
    Ok(())
}

/// Interactive configuration setup. Writes `toolsmith.toml` in the current
/// directory; additional providers become failover backups in prompt order.
fn config_init() -> anyhow::Result<()> {
    let mut config = ToolConfig::default();
    let mut index = 1usize;

    loop {
        let label = if index == 1 {
            "ark-primary".to_string()
        } else {
            format!("ark-backup-{}", index)
        };
        println!("Provider '{}'", label);

        let api_key: String = Input::new().with_prompt("  api_key").interact_text()?;
        let model: String = Input::new()
            .with_prompt("  endpoint/model id")
            .interact_text()?;
        let base_url: String = Input::new()
            .with_prompt("  base_url (empty for the Ark default)")
            .allow_empty(true)
            .interact_text()?;

        config.providers.push(ProviderConfig {
            name: label,
            kind: ProviderKind::Ark,
            api_key,
            model,
            base_url: if base_url.trim().is_empty() {
                None
            } else {
                Some(base_url)
            },
        });

        if !Confirm::new()
            .with_prompt("Add a failover backup provider?")
            .default(false)
            .interact()?
        {
            break;
        }
        index += 1;
    }

    config
        .validate()
        .map_err(|errors| anyhow::anyhow!(errors.join("; ")))?;

    let path = PathBuf::from("toolsmith.toml");
    std::fs::write(&path, toml::to_string_pretty(&config)?)?;
    println!(
        "{} configuration written to {}",
        "✓".green(),
        path.display()
    );
    Ok(())
}
