//! The `tagsplice run` command: interrogate a batch and run img2img.

mod batch;
mod options;
pub mod types;

pub use options::PromptOptions;
pub use types::{OutputFormat, Position};

use clap::Args;
use std::path::PathBuf;
use tagsplice_core::generate::{DryRun, ImageGenerator, Img2ImgClient};
use tagsplice_core::{Config, TagSplice};

use batch::run_batch;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Base prompt the tags are spliced into
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Negative prompt
    #[arg(short, long, default_value = "")]
    pub negative: String,

    /// Interrogation model as `backend:model` (repeatable, order matters)
    #[arg(short, long = "model", value_name = "BACKEND:MODEL")]
    pub models: Vec<String>,

    #[command(flatten)]
    pub prompt_options: PromptOptions,

    /// Save the --custom-filter text for later runs
    #[arg(long, requires = "custom_filter")]
    pub save_filter: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `[output].format`)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Directory for generated images
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Interrogate and compose prompts without calling img2img
    #[arg(long)]
    pub dry_run: bool,

    /// Unload interrogation models when the batch finishes
    #[arg(long)]
    pub unload: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    if let Some(dir) = &args.out_dir {
        config.generation.output_dir = dir.to_string_lossy().into_owned();
    }
    if args.unload {
        config.interrogation.unload_after = true;
    }

    let splice = TagSplice::new(config);
    let mut ctx = splice.context(&args.prompt, &args.negative, &args.models)?;
    args.prompt_options.apply(&mut ctx, splice.filter_store())?;

    if args.save_filter {
        if let Some(text) = &args.prompt_options.custom_filter {
            splice.filter_store().save(text)?;
        }
    }

    let files = splice.discover(&args.input)?;
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s), models: {}",
        files.len(),
        ctx.selections
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let generator: Box<dyn ImageGenerator> = if args.dry_run {
        Box::new(DryRun)
    } else {
        Box::new(Img2ImgClient::from_config(splice.config()))
    };

    let format: tagsplice_core::OutputFormat = match args.format {
        Some(format) => format.into(),
        None => tagsplice_core::OutputFormat::parse(&splice.config().output.format)
            .unwrap_or_default(),
    };

    run_batch(&splice, &mut ctx, generator.as_ref(), &files, &args, format).await
}
