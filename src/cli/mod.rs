//! # CLI Module
//!
//! Command-line interface for card verification.
//!
//! ## Usage
//! ```bash
//! # Check that everything on the card reached the archive
//! verify /media/SDCARD ~/Pictures
//!
//! # Skip a backup folder and match stills by EXIF
//! verify /media/SDCARD ~/Pictures --exclude '^backup/' --fingerprint metadata
//!
//! # JSON output
//! verify /media/SDCARD ~/Pictures --output json
//! ```

use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use sdcard_verify::core::fingerprint::FingerprintBackend;
use sdcard_verify::core::matcher::Termination;
use sdcard_verify::core::pipeline::{VerificationReport, Verifier};
use sdcard_verify::error::Result;
use sdcard_verify::events::{
    Event, EventChannel, IndexEvent, MatchEvent, MatchProgress, VerifyEvent,
};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

/// Verify that a memory card was copied before wiping it
#[derive(Parser, Debug)]
#[command(name = "verify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Card directory whose files must all have a copy
    source: PathBuf,

    /// Directory tree searched for the copies
    target: PathBuf,

    /// File suffixes to consider (case-insensitive)
    #[arg(short, long, num_args = 1..)]
    extensions: Option<Vec<String>>,

    /// Regex for target subdirectories to skip (matched against the relative path)
    #[arg(short = 'x', long)]
    exclude: Option<String>,

    /// How files are identified
    #[arg(short, long, default_value = "content")]
    fingerprint: Backend,

    /// Hash only the first N bytes (plus the length) of video files
    #[arg(long, value_name = "N")]
    prefix_bytes: Option<usize>,

    /// Search the whole target instead of stopping at files older than the card
    #[arg(long)]
    no_cutoff: bool,

    /// Fingerprint workers for the target search
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Leave out files and directories whose name starts with a dot
    #[arg(long)]
    skip_hidden: bool,

    /// Descend into symlinked directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// BLAKE3 of the full file content
    Content,
    /// EXIF identifier for stills, content hash for videos
    Metadata,
}

impl From<Backend> for FingerprintBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Content => FingerprintBackend::Content,
            Backend::Metadata => FingerprintBackend::Metadata,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (missing paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    sdcard_verify::init_tracing(cli.verbose);

    let term = Term::stderr();
    let pretty = matches!(cli.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("SD Card Verify").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let backend = FingerprintBackend::from(cli.fingerprint);
    let mut builder = Verifier::builder()
        .source(&cli.source)
        .target(&cli.target)
        .backend(backend)
        .prefix_bytes(cli.prefix_bytes)
        .use_cutoff(!cli.no_cutoff)
        .workers(cli.jobs)
        .skip_hidden(cli.skip_hidden)
        .follow_symlinks(cli.follow_symlinks);
    if let Some(extensions) = cli.extensions {
        builder = builder.extensions(extensions);
    }
    if let Some(pattern) = cli.exclude {
        builder = builder.exclude(pattern);
    }
    let verifier = builder.build()?;

    let (sender, receiver) = EventChannel::new();

    let progress = if pretty {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    let verbose = cli.verbose;

    let event_thread = thread::spawn(move || {
        let mut line = ProgressLine::new(progress, backend.has_capture_time());
        for event in receiver.iter() {
            line.handle(&event, verbose);
        }
        line.finish();
    });

    let result = verifier.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = result?;
    match cli.output {
        OutputFormat::Pretty => print_pretty_results(&Term::stdout(), &report, verbose),
        OutputFormat::Json => print_json_results(&report)?,
        OutputFormat::Minimal => print_minimal_results(&report),
    }

    Ok(())
}

/// Single overwritten terminal line for the search phase
///
/// The message is only rewritten when the search moves to another directory.
struct ProgressLine {
    bar: ProgressBar,
    current_dir: Option<PathBuf>,
    /// Backend reports capture times, so a missing cutoff is worth mentioning
    capture_times: bool,
}

impl ProgressLine {
    fn new(bar: ProgressBar, capture_times: bool) -> Self {
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            current_dir: None,
            capture_times,
        }
    }

    fn handle(&mut self, event: &Event, verbose: bool) {
        match event {
            Event::Index(IndexEvent::Started { root }) => {
                self.bar
                    .set_message(format!("Building fingerprint map of {}", display_path(root)));
            }
            Event::Index(IndexEvent::FilesDiscovered { total }) => {
                self.bar
                    .set_message(format!("Fingerprinting {} card files", total));
            }
            Event::Index(IndexEvent::Collision { kept, replaced }) => {
                self.bar.println(format!(
                    "{} {} has the same fingerprint as {}",
                    style("warning:").yellow().bold(),
                    display_path(replaced),
                    display_path(kept)
                ));
            }
            Event::Index(IndexEvent::Completed {
                files_seen,
                unique_fingerprints,
            }) => {
                self.bar.println(format!(
                    "Total files to match from card: {}",
                    style(unique_fingerprints).cyan()
                ));
                if unique_fingerprints < files_seen {
                    self.bar.println(format!(
                        "{} Only {} out of {} files will be compared",
                        style("warning:").yellow().bold(),
                        unique_fingerprints,
                        files_seen
                    ));
                }
            }
            Event::Verify(VerifyEvent::CutoffDetermined { cutoff }) => {
                match cutoff {
                    Some(time) => self.bar.println(format!(
                        "Earliest capture time on card: {}",
                        format_time(*time)
                    )),
                    None if self.capture_times => self
                        .bar
                        .println("Could not determine earliest capture time from card files"),
                    None => {}
                }
            }
            Event::Match(MatchEvent::PhaseChanged { phase }) => {
                self.current_dir = None;
                self.bar.set_message(format!("{} target...", phase));
            }
            Event::Match(MatchEvent::Progress(progress)) => {
                self.update(progress);
            }
            Event::Match(MatchEvent::Matched { source, target }) if verbose => {
                self.bar.println(format!(
                    "  {} {} -> {}",
                    style("✓").green(),
                    display_path(source),
                    display_path(target)
                ));
            }
            Event::Index(IndexEvent::Error { path, message })
            | Event::Match(MatchEvent::Error { path, message })
                if verbose =>
            {
                self.bar.println(format!(
                    "  {} {}: {}",
                    style("!").red(),
                    display_path(path),
                    message
                ));
            }
            Event::Match(MatchEvent::Completed { termination, .. }) => {
                self.bar.println(format!("Search ended: {}", termination));
            }
            _ => {}
        }
    }

    /// Returns true when the line was redrawn
    fn update(&mut self, progress: &MatchProgress) -> bool {
        if self.current_dir.as_deref() == Some(progress.current_dir.as_path()) {
            return false;
        }
        self.bar.set_message(format!(
            "Searching in: {} ({}, {}/{})",
            display_path(&progress.current_dir),
            format_time(progress.modified),
            progress.index + 1,
            progress.total
        ));
        self.current_dir = Some(progress.current_dir.clone());
        true
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn print_pretty_results(term: &Term, report: &VerificationReport, verbose: bool) {
    term.write_line("").ok();

    if report.nothing_to_verify() {
        term.write_line(&format!(
            "{} No files found on the card with the given extensions",
            style("i").cyan().bold()
        ))
        .ok();
        return;
    }

    term.write_line(&format!(
        "  {} of {} card files found in {:.1}s",
        style(report.found).cyan(),
        style(report.catalog_size).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    if let Some(termination) = report.termination {
        let reason = match termination {
            Termination::CutoffReached => style(termination.to_string()).yellow(),
            _ => style(termination.to_string()).dim(),
        };
        term.write_line(&format!("  search: {}", reason)).ok();
    }

    if verbose {
        term.write_line(&format!(
            "  {} of {} target files fingerprinted ({})",
            report.candidates_fingerprinted, report.candidates_total, report.fingerprinter
        ))
        .ok();
    }

    if report.unverifiable() > 0 {
        term.write_line(&format!(
            "  {} card files could not be verified on their own",
            style(report.unverifiable()).yellow()
        ))
        .ok();
    }

    term.write_line("").ok();

    if report.all_found() {
        term.write_line(&format!(
            "{} All files from the card are present in {}",
            style("✓").green().bold(),
            display_path(&report.target)
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "{}",
            style("Files on the card not found in the target:").bold().red()
        ))
        .ok();
        for path in &report.missing {
            term.write_line(&format!("  - {}", display_path(path))).ok();
        }
    }
}

fn print_json_results(report: &VerificationReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_minimal_results(report: &VerificationReport) {
    for path in &report.missing {
        println!("{}", path.display());
    }
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}
