//! The `tagsplice config` command: inspect, check, and create the config file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use tagsplice_core::{Config, TagSplice};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config file to operate on (defaults to the platform config path)
    #[arg(long, global = true, env = "TAGSPLICE_CONFIG")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Parse the file and check that its models and paths resolve
    Check,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// Unlike startup, a broken file is an error here rather than a fallback to
/// defaults.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let path = args.file.unwrap_or_else(Config::default_path);
    match args.command {
        ConfigCommand::Show => print!("{}", render(&path)?),
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Check => {
            for line in check(&path)? {
                println!("{line}");
            }
        }
        ConfigCommand::Init { force } => {
            write_default(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }
    Ok(())
}

/// Load `path`, or defaults when it doesn't exist.
fn load(path: &Path) -> anyhow::Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let config = Config::load_from(path)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(Some(config))
}

/// The effective config as TOML, headed by where it came from.
fn render(path: &Path) -> anyhow::Result<String> {
    let (header, config) = match load(path)? {
        Some(config) => (format!("# {}", path.display()), config),
        None => (
            format!("# {} not found, showing defaults", path.display()),
            Config::default(),
        ),
    };
    Ok(format!("{header}\n{}\n", config.to_toml()?))
}

/// Resolve the default model list and derived paths, one line per result.
fn check(path: &Path) -> anyhow::Result<Vec<String>> {
    let config = load(path)?
        .with_context(|| format!("No config file at {}", path.display()))?;
    let splice = TagSplice::new(config);
    let selections = splice.selections::<&str>(&[])?;

    Ok(vec![
        format!("ok: {}", path.display()),
        format!(
            "models: {}",
            selections
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!("output dir: {}", splice.config().output_dir().display()),
        format!("custom filter: {}", splice.filter_store().path().display()),
    ])
}

/// Write the default config to `path`, refusing to replace a file unless
/// `force` is set.
fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_default(&path, false).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.interrogation.models, Config::default().interrogation.models);
    }

    #[test]
    fn test_init_refuses_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[compose]\nweight = 0.8\n").unwrap();

        let err = write_default(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("0.8"));

        write_default(&path, true).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.compose.weight, Config::default().compose.weight);
    }

    #[test]
    fn test_render_marks_missing_file_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let text = render(&path).unwrap();
        assert!(text.starts_with('#'));
        assert!(text.contains("showing defaults"));
        assert!(text.contains("[compose]"));
    }

    #[test]
    fn test_render_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[compose]\nweight = 3.0\n").unwrap();
        assert!(render(&path).is_err());
    }

    #[test]
    fn test_check_resolves_models_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[interrogation]\nmodels = [\"tagger\", \"host:clip\"]\n",
        )
        .unwrap();

        let lines = check(&path).unwrap();
        assert!(lines[0].starts_with("ok: "));
        assert_eq!(lines[1], "models: tagger:wd14-vit-v2-git, host:clip");
    }

    #[test]
    fn test_check_rejects_unknown_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[interrogation]\nmodels = [\"nope:model\"]\n").unwrap();
        assert!(check(&path).is_err());

        assert!(check(&dir.path().join("missing.toml")).is_err());
    }
}
