//! The `tagsplice models` command: inspect interrogation backends.

use clap::{Args, Subcommand};
use tagsplice_core::interrogate::{Interrogator, InterrogatorRegistry};
use tagsplice_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for interrogation backends.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List enabled backends, whether they respond, and their models
    List,

    /// Ask every backend to release its loaded models
    Unload,
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    let registry = InterrogatorRegistry::from_config(&config);
    if registry.names().is_empty() {
        println!("No interrogation backends enabled.");
        println!("Enable one under [host], [tagger] or [caption] in the config file.");
        return Ok(());
    }

    match args.command {
        ModelsCommand::List => {
            println!("Interrogation backends:\n");
            for backend in registry.iter() {
                print_backend(backend).await;
            }
            println!("\n  Select with `--model backend:model`; a bare backend uses its default.");
        }

        ModelsCommand::Unload => {
            for backend in registry.iter() {
                match backend.unload().await {
                    Ok(()) => println!("  {:10} unloaded", backend.name()),
                    Err(e) => {
                        tracing::warn!("Failed to unload {}: {e}", backend.name());
                        println!("  {:10} failed: {e}", backend.name());
                    }
                }
            }
        }
    }

    Ok(())
}

async fn print_backend(backend: &dyn Interrogator) {
    let status = if backend.available().await {
        "available"
    } else {
        "unreachable"
    };
    println!("  {:10} {}", backend.name(), status);

    match backend.models().await {
        Ok(models) => {
            for model in models {
                let marker = if model == backend.default_model() {
                    " (default)"
                } else {
                    ""
                };
                println!("    - {model}{marker}");
            }
        }
        Err(e) => {
            tracing::debug!("Listing models for {} failed: {e}", backend.name());
            println!("    - {} (default, model list unavailable)", backend.default_model());
        }
    }
}
