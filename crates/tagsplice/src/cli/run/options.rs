//! Filter and compose flags shared by `run` and `compose`.

use clap::Args;
use tagsplice_core::batch::BatchContext;
use tagsplice_core::FilterStore;

use super::types::Position;

/// Flags that override `[compose]` and `[filter]` for one invocation.
#[derive(Args, Debug, Default)]
pub struct PromptOptions {
    /// Put tags before or after the prompt
    #[arg(long, value_enum)]
    pub position: Option<Position>,

    /// Attention weight wrapped around the tags (0.0 to 1.0)
    #[arg(long, value_parser = parse_weight)]
    pub weight: Option<f32>,

    /// Insert tags without an attention weight
    #[arg(long)]
    pub no_weight: bool,

    /// Drop tags already in the prompt
    #[arg(long)]
    pub remove_prompt_tags: bool,

    /// Drop tags found in the negative prompt
    #[arg(long)]
    pub remove_negative_tags: bool,

    /// Comma-separated tags to drop
    #[arg(long)]
    pub custom_filter: Option<String>,

    /// Drop tags listed in the saved custom filter
    #[arg(long)]
    pub use_saved_filter: bool,
}

impl PromptOptions {
    /// Layer these flags over the config-derived options in `ctx`.
    ///
    /// `--custom-filter` text takes precedence over the saved filter.
    pub fn apply(&self, ctx: &mut BatchContext, store: &FilterStore) -> anyhow::Result<()> {
        if let Some(position) = self.position {
            ctx.compose.position = position.into();
        }
        if let Some(weight) = self.weight {
            ctx.compose.weight = weight;
        }
        if self.no_weight {
            ctx.compose.use_weight = false;
        }

        ctx.filter.remove_prompt_tags |= self.remove_prompt_tags;
        ctx.filter.remove_negative_tags |= self.remove_negative_tags;

        if let Some(text) = &self.custom_filter {
            ctx.filter.use_custom_filter = true;
            ctx.filter.custom_filter = text.clone();
        } else if self.use_saved_filter {
            ctx.filter.use_custom_filter = true;
            ctx.filter.custom_filter = store.load()?;
            tracing::debug!("Loaded saved filter from {:?}", store.path());
        }
        Ok(())
    }
}

fn parse_weight(s: &str) -> Result<f32, String> {
    let weight: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err(format!("weight must be between 0.0 and 1.0, got {weight}"))
    }
}
