//! tagsplice CLI - interrogate images and splice the tags into img2img
//! prompts.
//!
//! # Usage
//!
//! ```bash
//! # Tag a directory with two models and run img2img on every image
//! tagsplice run ./inputs --prompt "oil painting" -m tagger:wd14-vit-v2-git -m host:clip
//!
//! # See what prompts would be sent, without generating
//! tagsplice run ./inputs --prompt "oil painting" --dry-run --format jsonl
//!
//! # Compose offline from known tags
//! tagsplice compose --prompt forest --tags "cat, dog" --position prepend
//!
//! # Manage the saved custom filter
//! tagsplice filter save "watermark, signature"
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// tagsplice - batch img2img with interrogated tags spliced into the prompt.
#[derive(Parser, Debug)]
#[command(name = "tagsplice")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Interrogate images, compose prompts, and run img2img
    Run(cli::run::RunArgs),

    /// Compose a prompt from tag strings without any backend
    Compose(cli::compose::ComposeArgs),

    /// Show or edit the saved custom filter
    Filter(cli::filter::FilterArgs),

    /// Inspect interrogation backends and their models
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match tagsplice_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tagsplice config check`."
            );
            tagsplice_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("tagsplice v{}", tagsplice_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Compose(args) => cli::compose::execute(args, config).await,
        Commands::Filter(args) => cli::filter::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
