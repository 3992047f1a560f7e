//! The `tagsplice compose` command: build a prompt offline from known tags.

use clap::Args;
use tagsplice_core::batch::BatchContext;
use tagsplice_core::{Config, FilterStore};

use super::run::PromptOptions;

/// Arguments for the `compose` command.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Base prompt
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Tag string from one model (repeat to join several, in order)
    #[arg(short, long = "tags", required = true)]
    pub tags: Vec<String>,

    /// Negative prompt
    #[arg(short, long, default_value = "")]
    pub negative: String,

    #[command(flatten)]
    pub prompt_options: PromptOptions,
}

/// Execute the compose command.
pub async fn execute(args: ComposeArgs, config: Config) -> anyhow::Result<()> {
    let store = FilterStore::new(config.custom_filter_path());
    let prompt = compose_prompt(&args, &config, &store)?;
    println!("{prompt}");
    Ok(())
}

fn compose_prompt(args: &ComposeArgs, config: &Config, store: &FilterStore) -> anyhow::Result<String> {
    let mut ctx = BatchContext::from_config(config, &args.prompt, &args.negative, vec![]);
    if ctx.filter.use_custom_filter {
        ctx.filter.custom_filter = store.load()?;
    }
    args.prompt_options.apply(&mut ctx, store)?;

    let plan = ctx.plan(args.tags.as_slice());
    tracing::debug!("Aggregated: {}", plan.aggregated);
    tracing::debug!("Filtered: {}", plan.filtered);
    Ok(plan.prompt)
}
