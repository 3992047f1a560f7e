//! The `tagsplice filter` command for the saved custom filter.

use clap::{Args, Subcommand};
use tagsplice_core::{filter_tags, Config, FilterStore};

/// Arguments for the `filter` command.
#[derive(Args, Debug)]
pub struct FilterArgs {
    #[command(subcommand)]
    pub command: FilterCommand,
}

/// Subcommands for the saved custom filter.
#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// Print the saved filter
    Show,

    /// Replace the saved filter
    Save {
        /// Comma-separated tags to drop from interrogator output
        text: String,
    },

    /// Delete the saved filter
    Clear,

    /// Show the filter file path
    Path,
}

/// Execute the filter command.
pub async fn execute(args: FilterArgs, config: Config) -> anyhow::Result<()> {
    let store = FilterStore::new(config.custom_filter_path());

    match args.command {
        FilterCommand::Show => {
            let saved = store.load()?;
            if saved.is_empty() {
                println!("No custom filter saved.");
                println!("Save one with `tagsplice filter save \"tag, tag\"`.");
            } else {
                println!("{saved}");
            }
        }

        FilterCommand::Save { text } => {
            let normalized = normalize(&text);
            store.save(&normalized)?;
            println!("Custom filter saved to: {}", store.path().display());
        }

        FilterCommand::Clear => {
            store.clear()?;
            println!("Custom filter cleared.");
        }

        FilterCommand::Path => {
            println!("{}", store.path().display());
        }
    }

    Ok(())
}

/// Tidy user input into `tag, tag` form, keeping each tag as typed.
fn normalize(text: &str) -> String {
    filter_tags(text, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_drops_empty_tags() {
        assert_eq!(normalize(" watermark,, signature ,"), "watermark, signature");
        assert_eq!(normalize("(text:1.2)"), "(text:1.2)");
        assert_eq!(normalize(""), "");
    }
}
