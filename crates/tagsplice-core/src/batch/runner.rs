//! The per-image loop: interrogate, build the prompt, run img2img.
//!
//! Everything is sequential. Images run one at a time and, for each image,
//! the selected models run one at a time in selection order.

use std::path::Path;

use super::context::BatchContext;
use super::discovery::DiscoveredFile;
use super::interrupt::Interrupt;
use crate::error::{PipelineError, PipelineResult};
use crate::generate::ImageGenerator;
use crate::interrogate::{ImageInput, InterrogatorRegistry, ModelSelection};
use crate::types::{BatchRecord, BatchSummary, ModelOutput};

/// Result of processing a single image.
#[derive(Debug)]
pub enum ImageOutcome {
    /// The image went through img2img (successfully or not)
    Done(BatchRecord),
    /// An interrupt arrived first; partial results were discarded
    Interrupted,
}

/// Progress notifications from [`BatchRunner::run`].
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// An image finished; check `record.error` for generation failures
    Completed(&'a BatchRecord),
    /// An image could not be started (unreadable file)
    Failed {
        path: &'a Path,
        error: &'a PipelineError,
    },
}

/// Drives a batch against a registry of interrogators and a generator.
pub struct BatchRunner<'a> {
    registry: &'a InterrogatorRegistry,
    generator: &'a dyn ImageGenerator,
    interrupt: Interrupt,
    unload_after: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(registry: &'a InterrogatorRegistry, generator: &'a dyn ImageGenerator) -> Self {
        Self {
            registry,
            generator,
            interrupt: Interrupt::new(),
            unload_after: false,
        }
    }

    /// Observe `interrupt` between model calls and between images.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Unload every backend the batch used once it finishes.
    pub fn unload_after(mut self, unload: bool) -> Self {
        self.unload_after = unload;
        self
    }

    /// Run every selected model on `image`, in selection order.
    ///
    /// A failing model is logged and contributes an empty tag string.
    /// Returns `None` if interrupted before all models ran.
    pub async fn interrogate(
        &self,
        selections: &[ModelSelection],
        image: &ImageInput,
    ) -> Option<Vec<ModelOutput>> {
        let mut outputs = Vec::with_capacity(selections.len());

        for selection in selections {
            if self.interrupt.is_triggered() {
                tracing::info!("Interrupted during interrogation of {:?}", image.path);
                return None;
            }

            let label = selection.label();
            let result = match self.registry.get(&selection.backend) {
                Some(backend) => {
                    let model = selection
                        .model
                        .as_deref()
                        .unwrap_or_else(|| backend.default_model());
                    backend.run(image, model).await
                }
                None => Err(PipelineError::UnknownBackend(selection.backend.clone())),
            };

            outputs.push(match result {
                Ok(tags) => {
                    tracing::debug!("{label}: {tags}");
                    ModelOutput {
                        model: label,
                        tags,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!("{label} failed for {:?}: {e}", image.path);
                    ModelOutput {
                        model: label,
                        tags: String::new(),
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        Some(outputs)
    }

    /// Process one image: interrogate, compose, run img2img once, restore
    /// the base prompt.
    pub async fn process_image(
        &self,
        ctx: &mut BatchContext,
        path: &Path,
    ) -> PipelineResult<ImageOutcome> {
        let image = ImageInput::load(path).await?;

        let Some(interrogations) = self.interrogate(&ctx.selections, &image).await else {
            return Ok(ImageOutcome::Interrupted);
        };
        if self.interrupt.is_triggered() {
            return Ok(ImageOutcome::Interrupted);
        }

        let outputs: Vec<&str> = interrogations.iter().map(|o| o.tags.as_str()).collect();
        let plan = ctx.plan(&outputs);
        tracing::info!("Prompt: {}", plan.prompt);

        ctx.request.set_init_image(&image);
        let base_prompt = std::mem::replace(&mut ctx.request.prompt, plan.prompt.clone());
        let result = self.generator.process(&ctx.request).await;
        ctx.request.prompt = base_prompt;

        let (images, error) = match result {
            Ok(processed) => (processed.images, None),
            Err(e) => {
                tracing::error!("{} failed for {:?}: {e}", self.generator.name(), path);
                (Vec::new(), Some(e.to_string()))
            }
        };

        Ok(ImageOutcome::Done(BatchRecord {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string(),
            interrogations,
            tags: plan.aggregated,
            filtered_tags: plan.filtered,
            prompt: plan.prompt,
            images,
            error,
        }))
    }

    /// Process every file in order, reporting each one through `on_event`.
    pub async fn run<F>(
        &self,
        ctx: &mut BatchContext,
        files: &[DiscoveredFile],
        mut on_event: F,
    ) -> BatchSummary
    where
        F: FnMut(BatchEvent<'_>),
    {
        let mut summary = BatchSummary::default();

        for (i, file) in files.iter().enumerate() {
            if self.interrupt.is_triggered() {
                summary.interrupted = true;
                summary.skipped = (files.len() - i) as u64;
                break;
            }

            match self.process_image(ctx, &file.path).await {
                Ok(ImageOutcome::Done(record)) => {
                    if record.is_success() {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                    on_event(BatchEvent::Completed(&record));
                }
                Ok(ImageOutcome::Interrupted) => {
                    summary.interrupted = true;
                    summary.skipped = (files.len() - i) as u64;
                    break;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Failed: {:?} - {}", file.path, e);
                    on_event(BatchEvent::Failed {
                        path: &file.path,
                        error: &e,
                    });
                }
            }
        }

        if self.unload_after {
            self.unload_used(&ctx.selections).await;
        }

        tracing::debug!("Batch finished: {:?}", summary);
        summary
    }

    async fn unload_used(&self, selections: &[ModelSelection]) {
        let mut seen: Vec<&str> = Vec::new();
        for selection in selections {
            if seen.contains(&selection.backend.as_str()) {
                continue;
            }
            seen.push(&selection.backend);
            if let Some(backend) = self.registry.get(&selection.backend) {
                if let Err(e) = backend.unload().await {
                    tracing::warn!("Failed to unload {}: {e}", backend.name());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GenerationRequest, Processed};
    use crate::interrogate::Interrogator;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Interrogator returning canned tags per model; "fail" errors out.
    struct StubInterrogator {
        name: &'static str,
        tags: HashMap<&'static str, &'static str>,
        calls: Arc<AtomicU32>,
        unloads: Arc<AtomicU32>,
        interrupt_on_call: Option<Interrupt>,
    }

    impl StubInterrogator {
        fn new(name: &'static str, tags: &[(&'static str, &'static str)]) -> Self {
            Self {
                name,
                tags: tags.iter().copied().collect(),
                calls: Arc::new(AtomicU32::new(0)),
                unloads: Arc::new(AtomicU32::new(0)),
                interrupt_on_call: None,
            }
        }
    }

    #[async_trait]
    impl Interrogator for StubInterrogator {
        fn name(&self) -> &str {
            self.name
        }

        fn default_model(&self) -> &str {
            "default"
        }

        async fn available(&self) -> bool {
            true
        }

        async fn models(&self) -> PipelineResult<Vec<String>> {
            Ok(self.tags.keys().map(|k| k.to_string()).collect())
        }

        async fn run(&self, _image: &ImageInput, model: &str) -> PipelineResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(interrupt) = &self.interrupt_on_call {
                interrupt.trigger();
            }
            match self.tags.get(model) {
                Some(tags) => Ok(tags.to_string()),
                None => Err(PipelineError::interrogation(self.name, model, "model missing")),
            }
        }

        async fn unload(&self) -> PipelineResult<()> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Generator that records the prompts it was given.
    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageGenerator for RecordingGenerator {
        fn name(&self) -> &str {
            "recording"
        }

        async fn process(&self, request: &GenerationRequest) -> PipelineResult<Processed> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            if self.fail {
                return Err(PipelineError::Generation {
                    message: "HTTP 500".to_string(),
                    status_code: Some(500),
                });
            }
            Ok(Processed {
                images: vec![PathBuf::from("out-0.png")],
                info: None,
            })
        }
    }

    fn images(dir: &Path, names: &[&str]) -> Vec<DiscoveredFile> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, [0u8; 4]).unwrap();
                DiscoveredFile { path, size: 4 }
            })
            .collect()
    }

    fn selections(entries: &[&str]) -> Vec<ModelSelection> {
        entries
            .iter()
            .map(|e| ModelSelection::parse(e).unwrap())
            .collect()
    }

    fn registry() -> InterrogatorRegistry {
        let mut registry = InterrogatorRegistry::new();
        registry.register(Box::new(StubInterrogator::new(
            "host",
            &[("clip", "a cat on a sofa"), ("deepdanbooru", "cat, sofa, indoors")],
        )));
        registry.register(Box::new(StubInterrogator::new(
            "tagger",
            &[("wd14", "cat, whiskers"), ("empty", "")],
        )));
        registry
    }

    #[tokio::test]
    async fn test_outputs_joined_in_selection_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png"]);
        let registry = registry();
        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator);

        let mut ctx = BatchContext::new(
            GenerationRequest::new("", ""),
            selections(&["tagger:wd14", "tagger:empty", "host:clip"]),
        );
        let mut records = Vec::new();
        let summary = runner
            .run(&mut ctx, &files, |event| {
                if let BatchEvent::Completed(record) = event {
                    records.push(record.clone());
                }
            })
            .await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(records[0].tags, "cat, whiskers, a cat on a sofa");
        assert_eq!(records[0].prompt, "cat, whiskers, a cat on a sofa");
        assert_eq!(records[0].interrogations.len(), 3);
        assert_eq!(records[0].interrogations[2].model, "host:clip");
    }

    #[tokio::test]
    async fn test_base_prompt_restored_between_images() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png", "b.png"]);
        let registry = registry();
        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator);

        let mut ctx = BatchContext::new(
            GenerationRequest::new("forest", "lowres"),
            selections(&["host:deepdanbooru"]),
        );
        runner.run(&mut ctx, &files, |_| {}).await;

        let prompts = generator.prompts.lock().unwrap().clone();
        assert_eq!(
            prompts,
            vec![
                "forest, (cat, sofa, indoors:0.5)",
                "forest, (cat, sofa, indoors:0.5)"
            ]
        );
        assert_eq!(ctx.base_prompt(), "forest");
        assert_eq!(ctx.request.source, Some(files[1].path.clone()));
    }

    #[tokio::test]
    async fn test_failing_model_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png"]);
        let registry = registry();
        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator);

        let mut ctx = BatchContext::new(
            GenerationRequest::new("", ""),
            selections(&["host:blip", "tagger:wd14", "missing:model"]),
        );
        let mut records = Vec::new();
        runner
            .run(&mut ctx, &files, |event| {
                if let BatchEvent::Completed(record) = event {
                    records.push(record.clone());
                }
            })
            .await;

        let record = &records[0];
        assert_eq!(record.tags, "cat, whiskers");
        assert!(record.interrogations[0].error.is_some());
        assert!(record.interrogations[0].tags.is_empty());
        assert!(record.interrogations[2]
            .error
            .as_deref()
            .unwrap()
            .contains("Unknown interrogator backend"));
    }

    #[tokio::test]
    async fn test_interrupt_discards_partial_image_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png", "b.png", "c.png"]);
        let interrupt = Interrupt::new();

        let mut stub = StubInterrogator::new("tagger", &[("wd14", "cat")]);
        stub.interrupt_on_call = Some(interrupt.clone());
        let calls = stub.calls.clone();
        let mut registry = InterrogatorRegistry::new();
        registry.register(Box::new(stub));

        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator).with_interrupt(interrupt);
        let mut ctx = BatchContext::new(
            GenerationRequest::new("forest", ""),
            selections(&["tagger:wd14", "tagger:wd14"]),
        );

        let mut completed = 0;
        let summary = runner
            .run(&mut ctx, &files, |_| completed += 1)
            .await;

        assert!(summary.interrupted);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(completed, 0);
        // Second model for the first image never ran
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert_eq!(ctx.base_prompt(), "forest");
    }

    #[tokio::test]
    async fn test_generation_failure_is_recorded_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png", "b.png"]);
        let registry = registry();
        let generator = RecordingGenerator {
            fail: true,
            ..Default::default()
        };
        let runner = BatchRunner::new(&registry, &generator);
        let mut ctx = BatchContext::new(
            GenerationRequest::new("forest", ""),
            selections(&["host:clip"]),
        );

        let summary = runner.run(&mut ctx, &files, |_| {}).await;
        assert_eq!(summary.failed, 2);
        assert_eq!(generator.prompts.lock().unwrap().len(), 2);
        assert_eq!(ctx.base_prompt(), "forest");
    }

    #[tokio::test]
    async fn test_unreadable_file_reported_as_failed() {
        let registry = registry();
        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator);
        let mut ctx = BatchContext::new(GenerationRequest::new("", ""), selections(&["host"]));

        let files = vec![DiscoveredFile {
            path: PathBuf::from("/no/such/image.png"),
            size: 0,
        }];
        let mut failures = 0;
        let summary = runner
            .run(&mut ctx, &files, |event| {
                if matches!(event, BatchEvent::Failed { .. }) {
                    failures += 1;
                }
            })
            .await;
        assert_eq!(summary.failed, 1);
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_unload_after_unloads_each_backend_once() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png"]);

        let stub = StubInterrogator::new("tagger", &[("wd14", "cat"), ("other", "dog")]);
        let unloads = stub.unloads.clone();
        let mut registry = InterrogatorRegistry::new();
        registry.register(Box::new(stub));

        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator).unload_after(true);
        let mut ctx = BatchContext::new(
            GenerationRequest::new("", ""),
            selections(&["tagger:wd14", "tagger:other"]),
        );
        runner.run(&mut ctx, &files, |_| {}).await;
        assert_eq!(unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bare_backend_uses_default_model() {
        let dir = tempfile::tempdir().unwrap();
        let files = images(dir.path(), &["a.png"]);
        let mut registry = InterrogatorRegistry::new();
        registry.register(Box::new(StubInterrogator::new(
            "caption",
            &[("default", "from sidecar")],
        )));
        let generator = RecordingGenerator::default();
        let runner = BatchRunner::new(&registry, &generator);
        let mut ctx = BatchContext::new(GenerationRequest::new("", ""), selections(&["caption"]));

        runner.run(&mut ctx, &files, |_| {}).await;
        assert_eq!(generator.prompts.lock().unwrap()[0], "from sidecar");
    }
}
