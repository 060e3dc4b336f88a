//! CLI binary for docbatch.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`,
//! narrates per-file progress, and prints the exit summary.

use anyhow::{Context, Result};
use clap::Parser;
use docbatch::{
    classify, discover, is_done, page_number, resolve_line, sort_by_page, BatchConfig,
    BatchProgressCallback, BatchRunner, BatchSummary, Candidate, FileOutcome, FileReport,
    MarkdownRenderer, PathEntry, ProgressCallback, Renderer, SourceDocument,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// file. Designed to stay readable when files complete out of order
/// (pooled mode).
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_batch_start` once
    /// the resume filter has decided how many files remain.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize, remaining: usize) {
        self.activate_bar(remaining);
        if total > remaining {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!(
                    "Resuming: {} of {total} files already done, {remaining} to go",
                    total - remaining
                ))
            ));
        } else {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Converting {remaining} files…"))
            ));
        }
    }

    fn on_file_start(&self, path: &std::path::Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn on_file_done(&self, report: &FileReport) {
        let name = report
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.path.display().to_string());

        match &report.outcome {
            FileOutcome::Converted { bytes, elapsed } => {
                self.bar.println(format!(
                    "  {} {:<40}  {:<12}  {}",
                    green("✓"),
                    name,
                    dim(&format!("{bytes:>7} bytes")),
                    dim(&format!("{:.1}s", elapsed.as_secs_f64())),
                ));
            }
            FileOutcome::Skipped(reason) => {
                self.bar
                    .println(format!("  {} {:<40}  {}", dim("↷"), name, dim(&reason.to_string())));
            }
            FileOutcome::Failed { error, .. } => {
                // Truncate very long error messages to keep output tidy.
                let msg: String = if error.chars().count() > 80 {
                    let mut m: String = error.chars().take(79).collect();
                    m.push('\u{2026}');
                    m
                } else {
                    error.clone()
                };
                self.bar
                    .println(format!("  {} {:<40}  {}", red("✗"), name, red(&msg)));
            }
        }
        self.bar.inc(1);
    }

    fn on_checkpoint(&self, done: usize, remaining: usize, eta: Option<Duration>) {
        let eta = eta
            .map(|d| format!("{:.1} min", d.as_secs_f64() / 60.0))
            .unwrap_or_else(|| "unknown".to_string());
        self.bar.println(format!(
            "{} {done} done, {remaining} remaining, checkpoint saved  {}",
            cyan("◆"),
            dim(&format!("ETA {eta}")),
        ));
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        self.bar.finish_and_clear();

        if summary.interrupted {
            eprintln!(
                "{} interrupted after {} files; progress saved, run again to resume",
                cyan("⚠"),
                bold(&summary.processed().to_string())
            );
        } else if summary.failed == 0 {
            eprintln!(
                "{} {} files converted, {} skipped",
                green("✔"),
                bold(&summary.converted.to_string()),
                summary.skipped + summary.already_done,
            );
        } else {
            eprintln!(
                "{} {} converted, {} failed  {}",
                cyan("⚠"),
                bold(&summary.converted.to_string()),
                red(&summary.failed.to_string()),
                dim("(see error log)"),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every supported document under a folder (resumable)
  docbatch ./Documents

  # Resume after an interruption: already-converted files are skipped
  docbatch ./Documents --yes

  # Four workers, checkpoint every 20 files
  docbatch ./Documents -w 4 --checkpoint-every 20

  # Strictly sequential, keep per-file output in discovery order
  docbatch ./Documents --sequential

  # Only PDFs and scans, custom progress file location
  docbatch ./Documents --ext pdf,jpg,png --progress-file /tmp/progress.json

  # Interactive mode: drag files or folders into the terminal
  docbatch

  # Merge converted pages into one document, ordered by page number
  docbatch ./scans --merge contract_2024

  # Detect document types (invoice, contract, ...) after converting
  docbatch ./scans --classify

RESUMABILITY:
  Progress is checkpointed to a JSON file every N files and always on exit,
  including Ctrl-C. Rerunning the same command resumes from the last
  finished file. Delete the progress file to start over; edit its "failed"
  list to control retries. Files whose sibling output already exists are
  treated as done unless --no-skip-existing is given.

ENVIRONMENT VARIABLES:
  DOCBATCH_WORKERS            Worker count (same as --workers)
  DOCBATCH_CHECKPOINT_EVERY   Checkpoint cadence (same as --checkpoint-every)
  DOCBATCH_PROGRESS_FILE      Progress file path
  DOCBATCH_ERROR_LOG          Error log path
  DOCBATCH_EXTENSIONS         Comma-separated input extensions
  DOCBATCH_OUTPUT_EXT         Output extension (default: md)
"#;

/// Batch-convert scanned documents to Markdown with resumable progress.
#[derive(Parser, Debug)]
#[command(
    name = "docbatch",
    version,
    about = "Batch-convert scanned documents to Markdown with resumable progress",
    long_about = "Recursively convert scanned documents (PDF, Office, images) to Markdown \
through a pluggable extraction engine. Progress is checkpointed to a JSON file so an \
interrupted batch resumes from the last finished file instead of starting over.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Root directory to scan. Interactive path entry when omitted.
    root: Option<PathBuf>,

    /// Number of concurrent conversions.
    #[arg(short, long, env = "DOCBATCH_WORKERS", default_value_t = 4)]
    workers: usize,

    /// Process files strictly one at a time (same as --workers 1).
    #[arg(long, env = "DOCBATCH_SEQUENTIAL")]
    sequential: bool,

    /// Save the progress file every N finished files.
    #[arg(long, env = "DOCBATCH_CHECKPOINT_EVERY", default_value_t = 10)]
    checkpoint_every: usize,

    /// Progress checkpoint file.
    #[arg(
        long,
        env = "DOCBATCH_PROGRESS_FILE",
        default_value = "docbatch_progress.json"
    )]
    progress_file: PathBuf,

    /// Append-only error log.
    #[arg(long, env = "DOCBATCH_ERROR_LOG", default_value = "docbatch_errors.log")]
    error_log: PathBuf,

    /// Comma-separated input extensions (default: pdf,docx,doc,xlsx,xls,pptx,ppt,jpg,jpeg,png,bmp,tiff).
    #[arg(long, env = "DOCBATCH_EXTENSIONS", value_delimiter = ',')]
    ext: Vec<String>,

    /// Extension of the sibling output artifact.
    #[arg(long, env = "DOCBATCH_OUTPUT_EXT", default_value = "md")]
    output_ext: String,

    /// Convert even when the sibling output file already exists.
    #[arg(long)]
    no_skip_existing: bool,

    /// Leave previously failed files out of this run.
    #[arg(long)]
    no_retry_failed: bool,

    /// Merge converted output into NAME.md, ordered by page number.
    #[arg(long, value_name = "NAME")]
    merge: Option<String>,

    /// Print the detected document type for each converted file.
    #[arg(long)]
    classify: bool,

    /// Print the summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOCBATCH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCBATCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCBATCH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = BatchConfig::builder()
        .workers(if cli.sequential { 1 } else { cli.workers })
        .checkpoint_every(cli.checkpoint_every)
        .skip_existing(!cli.no_skip_existing)
        .retry_failed(!cli.no_retry_failed)
        .output_extension(&cli.output_ext)
        .progress_path(cli.progress_file.clone())
        .error_log_path(cli.error_log.clone());
    if !cli.ext.is_empty() {
        builder = builder.extensions(&cli.ext);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Collect candidates ───────────────────────────────────────────────
    let candidates = match &cli.root {
        Some(root) => discover(root, &config).context("Discovery failed")?,
        None => collect_interactive(&config)?,
    };

    if candidates.is_empty() {
        eprintln!("No supported documents found.");
        return Ok(());
    }

    if !cli.quiet {
        print_candidate_overview(&candidates);
    }

    // ── Confirm ──────────────────────────────────────────────────────────
    if !cli.yes && !confirm(&format!("About to process {} files. Continue?", candidates.len())) {
        eprintln!("Cancelled.");
        return Ok(());
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let runner = BatchRunner::new(config.clone(), make_converter());
    let summary = runner
        .run_candidates(candidates.clone(), docbatch::ctrl_c())
        .await
        .context("Batch run failed")?;

    // ── Optional post-processing ─────────────────────────────────────────
    if let Some(ref name) = cli.merge {
        write_merged(name, &candidates, &config);
    }
    if cli.classify {
        print_classifications(&candidates, &config);
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        print_summary(&summary, &config);
    }

    if summary.interrupted {
        eprintln!("Progress saved. Run the same command again to resume.");
        std::process::exit(130);
    }
    Ok(())
}

// ── Converter wiring ─────────────────────────────────────────────────────────

#[cfg(feature = "engine-kreuzberg")]
fn make_converter() -> Arc<dyn docbatch::DocumentConverter> {
    Arc::new(docbatch::KreuzbergConverter::new())
}

/// Without an engine feature the binary still drives the whole pipeline,
/// but only for text-like inputs; everything else fails per-file with a
/// pointer at the engine feature.
#[cfg(not(feature = "engine-kreuzberg"))]
fn make_converter() -> Arc<dyn docbatch::DocumentConverter> {
    Arc::new(docbatch::PlainTextConverter)
}

// ── Interactive path entry ───────────────────────────────────────────────────

fn collect_interactive(config: &BatchConfig) -> Result<Vec<Candidate>> {
    println!("Add files or folders:");
    println!("  1. Drag & drop paths into this terminal (quoted paths are fine)");
    println!("  2. Or type a path and press Enter");
    println!("  3. Type 'done' when finished\n");

    let stdin = io::stdin();
    let mut seen = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    loop {
        print!(">>> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_done(line) {
            break;
        }

        for entry in resolve_line(line, config) {
            match entry {
                PathEntry::Accepted(candidate) => {
                    if seen.insert(candidate.path_key()) {
                        println!(
                            "  [+] {}",
                            candidate
                                .path
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| candidate.path.display().to_string())
                        );
                        candidates.push(candidate);
                    }
                }
                PathEntry::UnsupportedFormat { path, extension } => {
                    println!("  [!] Unsupported format '{extension}': {}", path.display());
                }
                PathEntry::NotFound { path } => {
                    println!("  [x] Not found: {}", path.display());
                }
            }
        }
    }

    // Page-numbered scans merge in reading order when processed this way.
    candidates.sort_by_key(|c| {
        (
            page_number(&c.path),
            c.path.file_name().map(|n| n.to_os_string()),
        )
    });
    Ok(candidates)
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} (y/n): ");
    io::stdout().flush().ok();
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

fn print_candidate_overview(candidates: &[Candidate]) {
    let mut by_format: std::collections::BTreeMap<&str, (usize, u64)> =
        std::collections::BTreeMap::new();
    for c in candidates {
        let entry = by_format.entry(c.extension.as_str()).or_default();
        entry.0 += 1;
        entry.1 += c.size;
    }
    eprintln!("{}", bold(&format!("Found {} documents:", candidates.len())));
    for (ext, (count, bytes)) in by_format {
        eprintln!(
            "  {ext:<8} {count:>5} files  {}",
            dim(&format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)))
        );
    }
}

// ── Post-run artifacts ───────────────────────────────────────────────────────

/// Merge the sibling outputs of converted candidates into one Markdown
/// document. Renderer failures are cosmetic: warn and move on.
fn write_merged(name: &str, candidates: &[Candidate], config: &BatchConfig) {
    let mut outputs: Vec<PathBuf> = candidates
        .iter()
        .map(|c| c.output_path(&config.output_extension))
        .filter(|p| p.exists())
        .collect();
    sort_by_page(&mut outputs);

    let documents: Vec<SourceDocument> = outputs
        .iter()
        .filter_map(|p| {
            std::fs::read_to_string(p).ok().map(|markdown| SourceDocument {
                path: p.clone(),
                markdown,
            })
        })
        .collect();

    let out = PathBuf::from(format!("{name}.md"));
    match MarkdownRenderer::new(name).render(&documents, &out) {
        Ok(()) => eprintln!("{} Merged document: {}", green("✔"), bold(&out.display().to_string())),
        Err(e) => eprintln!("{} Merge skipped: {e}", cyan("⚠")),
    }
}

fn print_classifications(candidates: &[Candidate], config: &BatchConfig) {
    eprintln!();
    eprintln!("{}", bold("Document types:"));
    for candidate in candidates {
        let output = candidate.output_path(&config.output_extension);
        let text = match std::fs::read_to_string(&output) {
            Ok(text) => text,
            Err(_) => continue,
        };
        let result = classify(&text);
        eprintln!(
            "  {:<12} {:.2}  {}",
            result.doc_type,
            result.confidence,
            candidate.path.display()
        );
        if !result.keywords.is_empty() {
            let sample: Vec<&str> = result.keywords.iter().take(5).map(String::as_str).collect();
            eprintln!("  {}", dim(&format!("             keywords: {}", sample.join(", "))));
        }
    }
}

fn print_summary(summary: &BatchSummary, config: &BatchConfig) {
    eprintln!();
    eprintln!("{}", bold("Batch summary"));
    eprintln!("  Candidates:   {}", summary.total_candidates);
    eprintln!("  Already done: {}", summary.already_done);
    eprintln!("  Converted:    {}", green(&summary.converted.to_string()));
    eprintln!("  Skipped:      {}", summary.skipped);
    let failed = if summary.failed > 0 {
        red(&summary.failed.to_string())
    } else {
        summary.failed.to_string()
    };
    eprintln!("  Failed:       {failed}");
    eprintln!(
        "  Elapsed:      {:.1} min",
        summary.elapsed_ms as f64 / 60_000.0
    );

    if !summary.by_format.is_empty() {
        eprintln!("  By format:");
        for (ext, tally) in &summary.by_format {
            eprintln!(
                "    {ext:<8} {} success, {} failed",
                tally.success, tally.failed
            );
        }
    }

    if !summary.failure_messages.is_empty() {
        eprintln!("  First failures:");
        for message in &summary.failure_messages {
            eprintln!("    {}", red(message));
        }
        eprintln!("  Full list: {}", config.error_log_path.display());
    }
}
