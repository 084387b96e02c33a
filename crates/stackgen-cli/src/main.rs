mod ask_cmd;
mod batch_cmd;
mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use stackgen_core::generator::presets;
use stackgen_core::task::GenerationMode;

use config::{CliOverrides, StackgenConfig};

#[derive(Parser)]
#[command(
    name = "stackgen",
    about = "Generate code and dependency manifests across technology stacks and LLM backends"
)]
struct Cli {
    /// Comma-separated backend presets (overrides STACKGEN_BACKENDS env var)
    #[arg(long, global = true)]
    backends: Option<String>,

    /// Maximum technology stacks per task (overrides STACKGEN_STACK_LIMIT env var)
    #[arg(long, global = true)]
    stack_limit: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default stackgen config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run one task and print the resulting JSON
    Ask {
        /// Free-text description of the software task
        task_description: String,
        /// Generation mode: code or dependencies
        #[arg(long, default_value = "dependencies")]
        mode: String,
        /// Comma-separated subset of the configured backends
        #[arg(long)]
        only: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Run every prompt in a file and save one JSON result per prompt
    Batch {
        /// File with one task description per line
        prompts_file: PathBuf,
        /// Directory for result files
        #[arg(long, default_value = "generated_data")]
        output_dir: PathBuf,
        /// Generation mode: code or dependencies
        #[arg(long, default_value = "dependencies")]
        mode: String,
        /// Retries per prompt after a request-level error
        #[arg(long, default_value_t = 3)]
        max_retries: u32,
        /// Seconds to wait between retries
        #[arg(long, default_value_t = 10)]
        retry_delay: u64,
    },
}

/// Execute the `stackgen init` command: write a default config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  backends.enabled = {}", cfg.backends.enabled.join(","));
    println!("  engine.stack_limit = {}", cfg.engine.stack_limit);
    println!();
    println!("API keys are read from the environment:");
    for name in &cfg.backends.enabled {
        if let Some(preset) = presets::preset(name) {
            println!("  {name}: {}", preset.api_key_env);
        }
    }
    println!("Other presets: {}", presets::available().join(", "));

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let overrides = CliOverrides {
        backends: cli.backends,
        stack_limit: cli.stack_limit,
    };

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Ask {
            task_description,
            mode,
            only,
        } => {
            let resolved = StackgenConfig::resolve(&overrides)?;
            let orchestrator = resolved.build_orchestrator()?;
            let subset = only.as_deref().map(config::split_list);
            ask_cmd::run_ask(&orchestrator, &task_description, &mode, subset).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = StackgenConfig::resolve(&overrides)?;
            let orchestrator = resolved.build_orchestrator()?;
            serve_cmd::run_serve(orchestrator, &bind, port).await?;
        }
        Commands::Batch {
            prompts_file,
            output_dir,
            mode,
            max_retries,
            retry_delay,
        } => {
            let resolved = StackgenConfig::resolve(&overrides)?;
            let orchestrator = resolved.build_orchestrator()?;
            let prompts = batch_cmd::read_prompts(&prompts_file)?;
            let options = batch_cmd::BatchOptions {
                output_dir,
                mode: GenerationMode::from(mode),
                max_retries,
                retry_delay: Duration::from_secs(retry_delay),
            };

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted; finishing current prompt");
                    on_interrupt.cancel();
                }
            });

            let summary = batch_cmd::run_batch(&orchestrator, &prompts, &options, cancel).await?;
            println!(
                "Batch finished: {} succeeded, {} failed, {} skipped",
                summary.succeeded, summary.failed, summary.skipped
            );
        }
    }

    Ok(())
}
