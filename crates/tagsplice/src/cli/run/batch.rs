//! Batch driver: progress bar, Ctrl-C handling, and report output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use tagsplice_core::batch::{BatchContext, BatchEvent, BatchRunner, DiscoveredFile, Interrupt};
use tagsplice_core::generate::ImageGenerator;
use tagsplice_core::{BatchSummary, OutputFormat, ReportWriter, TagSplice};

use super::RunArgs;

/// Run the batch, streaming records to the output as they complete.
pub async fn run_batch(
    splice: &TagSplice,
    ctx: &mut BatchContext,
    generator: &dyn ImageGenerator,
    files: &[DiscoveredFile],
    args: &RunArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = ReportWriter::new(sink, format, splice.config().output.pretty);

    let interrupt = Interrupt::new();
    spawn_ctrl_c_handler(interrupt.clone());

    let runner = BatchRunner::new(splice.registry(), generator)
        .with_interrupt(interrupt)
        .unload_after(splice.config().interrogation.unload_after);

    let progress = create_progress_bar(files.len() as u64);
    let start_time = Instant::now();
    let mut write_error: Option<std::io::Error> = None;

    let summary = runner
        .run(ctx, files, |event| {
            match event {
                BatchEvent::Completed(record) => {
                    if write_error.is_none() {
                        write_error = writer.record(record).err();
                    }
                    if let Some(error) = &record.error {
                        progress.println(format!("  failed: {} ({error})", record.file_name));
                    }
                }
                BatchEvent::Failed { path, error } => {
                    progress.println(format!("  failed: {} ({error})", path.display()));
                }
            }
            progress.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress.set_message(format!("{:.2} img/sec", progress.position() as f64 / elapsed));
            }
        })
        .await;

    progress.finish_and_clear();

    if let Some(e) = write_error {
        return Err(e.into());
    }
    writer.finish(&summary)?;
    if let Some(path) = &args.output {
        tracing::info!("Output written to {:?}", path);
    }

    print_summary(&summary, start_time.elapsed());

    if summary.interrupted {
        tracing::warn!("Batch interrupted, {} image(s) skipped", summary.skipped);
    }
    Ok(())
}

/// What a Ctrl-C should do given the batch's interrupt state.
#[derive(Debug, PartialEq, Eq)]
enum SignalAction {
    /// Let the current step finish, then stop
    Stop,
    /// A stop was already requested; quit without waiting
    Exit,
}

fn on_ctrl_c(interrupt: &Interrupt) -> SignalAction {
    if interrupt.trigger() {
        SignalAction::Exit
    } else {
        SignalAction::Stop
    }
}

/// Trigger `interrupt` on the first Ctrl-C and exit the process on the second.
fn spawn_ctrl_c_handler(interrupt: Interrupt) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_ctrl_c(&interrupt) {
                SignalAction::Stop => tracing::warn!(
                    "Interrupt received, stopping after the current step (Ctrl-C again to quit)"
                ),
                SignalAction::Exit => {
                    tracing::warn!("Second interrupt, exiting now");
                    std::process::exit(130);
                }
            }
        }
    });
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("interrogating...");
    pb
}

/// Print a formatted summary table after the batch.
fn print_summary(summary: &BatchSummary, elapsed: Duration) {
    let total = summary.attempted() + summary.skipped;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    if summary.interrupted {
        eprintln!("    Interrupted:       yes");
    }
    eprintln!("  ====================================");
}
