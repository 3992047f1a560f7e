//! Per-batch state.
//!
//! The base prompt lives in the request owned by the context. Each image
//! swaps in its composed prompt for the img2img call and swaps the base
//! back afterwards, so no image ever sees another image's tags.

use crate::config::Config;
use crate::generate::GenerationRequest;
use crate::interrogate::ModelSelection;
use crate::prompt::{aggregate, apply_filters, compose_with, ComposeOptions, FilterOptions};

/// Options and prompt state for one batch.
#[derive(Debug, Clone)]
pub struct BatchContext {
    /// Request template; `prompt` holds the base prompt between images
    pub request: GenerationRequest,

    /// Resolved model selections, in the order their outputs are joined
    pub selections: Vec<ModelSelection>,

    /// Tag exclusion filters
    pub filter: FilterOptions,

    /// Tag placement and weighting
    pub compose: ComposeOptions,
}

/// The prompt built for one image, with its intermediate steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPlan {
    /// Per-model outputs joined in selection order
    pub aggregated: String,
    /// Aggregated tags after the enabled filters
    pub filtered: String,
    /// Final prompt for img2img
    pub prompt: String,
}

impl BatchContext {
    pub fn new(request: GenerationRequest, selections: Vec<ModelSelection>) -> Self {
        Self {
            request,
            selections,
            filter: FilterOptions::default(),
            compose: ComposeOptions::default(),
        }
    }

    /// Build a context from config defaults. The custom filter text is not
    /// read here; callers load it from the filter store.
    pub fn from_config(
        config: &Config,
        prompt: &str,
        negative_prompt: &str,
        selections: Vec<ModelSelection>,
    ) -> Self {
        let request =
            GenerationRequest::new(prompt, negative_prompt).with_params(&config.generation.params);
        Self {
            request,
            selections,
            filter: FilterOptions {
                remove_prompt_tags: config.filter.remove_prompt_tags,
                remove_negative_tags: config.filter.remove_negative_tags,
                use_custom_filter: config.filter.use_saved_filter,
                custom_filter: String::new(),
            },
            compose: config.compose.clone(),
        }
    }

    /// The prompt every image starts from.
    pub fn base_prompt(&self) -> &str {
        &self.request.prompt
    }

    /// Aggregate, filter, and compose the tag outputs for one image.
    pub fn plan<S: AsRef<str>>(&self, outputs: &[S]) -> PromptPlan {
        let aggregated = aggregate(outputs);
        let filtered = apply_filters(
            &aggregated,
            &self.request.prompt,
            &self.request.negative_prompt,
            &self.filter,
        );
        let prompt = compose_with(&self.request.prompt, &filtered, &self.compose);
        PromptPlan {
            aggregated,
            filtered,
            prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::TagPosition;

    fn context(prompt: &str, negative: &str) -> BatchContext {
        BatchContext::new(GenerationRequest::new(prompt, negative), vec![])
    }

    #[test]
    fn test_plan_default_options() {
        let ctx = context("forest", "");
        let plan = ctx.plan(&["cat", "", "dog"]);
        assert_eq!(plan.aggregated, "cat, dog");
        assert_eq!(plan.filtered, "cat, dog");
        assert_eq!(plan.prompt, "forest, (cat, dog:0.5)");
    }

    #[test]
    fn test_plan_filters_against_prompt_and_negative() {
        let mut ctx = context("forest, (cat:1.2)", "blurry");
        ctx.filter.remove_prompt_tags = true;
        ctx.filter.remove_negative_tags = true;
        ctx.compose = ComposeOptions {
            position: TagPosition::Prepend,
            use_weight: false,
            weight: 0.5,
        };
        let plan = ctx.plan(&["cat, tree", "blurry, forest, sky"]);
        assert_eq!(plan.aggregated, "cat, tree, blurry, forest, sky");
        assert_eq!(plan.filtered, "tree, sky");
        assert_eq!(plan.prompt, "tree, sky, forest, (cat:1.2)");
    }

    #[test]
    fn test_plan_with_empty_prompt_uses_tags_only() {
        let ctx = context("", "");
        assert_eq!(ctx.plan(&["cat, dog"]).prompt, "cat, dog");
    }

    #[test]
    fn test_plan_with_no_tags_keeps_prompt() {
        let ctx = context("forest", "");
        assert_eq!(ctx.plan(&["", ""]).prompt, "forest");
    }

    #[test]
    fn test_from_config_copies_options() {
        let mut config = Config::default();
        config.filter.remove_negative_tags = true;
        config.filter.use_saved_filter = true;
        config.compose.weight = 0.7;
        let ctx = BatchContext::from_config(&config, "forest", "blurry", vec![]);
        assert_eq!(ctx.base_prompt(), "forest");
        assert!(ctx.filter.remove_negative_tags);
        assert!(ctx.filter.use_custom_filter);
        assert!(ctx.filter.custom_filter.is_empty());
        assert_eq!(ctx.compose.weight, 0.7);
        assert_eq!(ctx.request.params["steps"], serde_json::json!(20));
    }
}
