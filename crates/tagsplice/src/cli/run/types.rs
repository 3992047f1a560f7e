//! CLI enum types shared by `run` and `compose`: output format, tag position.

use clap::ValueEnum;
use tagsplice_core::{OutputFormat as CoreOutputFormat, TagPosition};

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document with every record and the summary
    Json,
    /// One JSON object per line, streamed as images finish
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Where interrogated tags go relative to the prompt.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Position {
    /// Tags first, then the prompt
    Prepend,
    /// Prompt first, then the tags
    Append,
}

impl From<Position> for TagPosition {
    fn from(position: Position) -> Self {
        match position {
            Position::Prepend => TagPosition::Prepend,
            Position::Append => TagPosition::Append,
        }
    }
}
