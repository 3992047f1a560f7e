//! Result types emitted by a batch run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output of one selected model for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Selection label, `backend:model`
    pub model: String,

    /// Tag string produced (empty on failure)
    pub tags: String,

    /// Failure message when the model could not run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything recorded for one processed image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Source image path
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Per-model outputs in selection order
    pub interrogations: Vec<ModelOutput>,

    /// Aggregated tags before filtering
    pub tags: String,

    /// Tags after the enabled filters
    pub filtered_tags: String,

    /// Prompt sent to img2img
    pub prompt: String,

    /// Generated image files
    pub images: Vec<PathBuf>,

    /// Generation failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchRecord {
    /// Whether img2img succeeded for this image.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counters for a finished (or interrupted) batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Images that went through img2img
    pub succeeded: u64,

    /// Images that could not be read or generated
    pub failed: u64,

    /// Images never started because the batch was interrupted
    pub skipped: u64,

    /// Whether the batch stopped early
    pub interrupted: bool,
}

impl BatchSummary {
    /// Images that were attempted.
    pub fn attempted(&self) -> u64 {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_skips_empty_error() {
        let record = BatchRecord {
            file_path: PathBuf::from("/in/cat.png"),
            file_name: "cat.png".to_string(),
            interrogations: vec![ModelOutput {
                model: "host:clip".to_string(),
                tags: "a cat".to_string(),
                error: None,
            }],
            tags: "a cat".to_string(),
            filtered_tags: "a cat".to_string(),
            prompt: "forest, (a cat:0.5)".to_string(),
            images: vec![],
            error: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"error\""));
        assert!(json.contains("\"prompt\":\"forest, (a cat:0.5)\""));
        assert!(record.is_success());
    }

    #[test]
    fn test_summary_attempted() {
        let summary = BatchSummary {
            succeeded: 3,
            failed: 1,
            skipped: 2,
            interrupted: true,
        };
        assert_eq!(summary.attempted(), 4);
    }
}
