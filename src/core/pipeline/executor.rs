//! Verification run implementation.

use crate::core::catalog::{CatalogBuilder, Collision};
use crate::core::fingerprint::{FingerprintBackend, Fingerprinter};
use crate::core::matcher::{MatchEngine, Termination};
use crate::core::scanner::{DirectoryExclusion, ScanConfig};
use crate::error::{ScanError, VerifyError};
use crate::events::{null_sender, Event, EventSender, VerifyEvent};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::info;

/// Result of a verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Name of the fingerprint backend used
    pub fingerprinter: String,
    /// Qualifying files found on the card
    pub source_files_seen: usize,
    /// Distinct fingerprints the target was searched for
    pub catalog_size: usize,
    /// Card files whose copy was found
    pub found: usize,
    /// Card files without a copy, sorted
    pub missing: Vec<PathBuf>,
    /// How the search ended; `None` when there was nothing to search for
    pub termination: Option<Termination>,
    /// Earliest capture time on the card, if known
    pub cutoff: Option<SystemTime>,
    /// Whether the cutoff was used to bound the search
    pub cutoff_applied: bool,
    /// Candidates discovered in the target tree
    pub candidates_total: usize,
    /// Candidates actually fingerprinted
    pub candidates_fingerprinted: usize,
    pub collisions: Vec<Collision>,
    /// Non-fatal problems on either side
    pub failures: Vec<String>,
    pub duration_ms: u64,
}

impl VerificationReport {
    /// True when no card file is missing a copy
    pub fn all_found(&self) -> bool {
        self.missing.is_empty()
    }

    /// True when the card had no fingerprintable files
    pub fn nothing_to_verify(&self) -> bool {
        self.catalog_size == 0
    }

    /// Card files that could not take part in matching (fingerprint failures
    /// and the replaced side of collisions)
    pub fn unverifiable(&self) -> usize {
        self.source_files_seen.saturating_sub(self.catalog_size)
    }
}

/// Configuration for a verification run
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Card directory
    pub source: PathBuf,
    /// Directory searched for copies
    pub target: PathBuf,
    /// Suffixes to consider (None = backend defaults)
    pub extensions: Option<Vec<String>>,
    /// Regex for target subdirectories to skip
    pub exclude: Option<String>,
    /// Fingerprint backend
    pub backend: FingerprintBackend,
    /// Hash only this many leading bytes of videos (metadata backend)
    pub prefix_bytes: Option<usize>,
    /// Stop at target files older than the earliest capture on the card
    pub use_cutoff: bool,
    /// Concurrent fingerprint workers while searching the target
    pub workers: usize,
    /// Skip files and directories whose name starts with `.`
    pub skip_hidden: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            target: PathBuf::new(),
            extensions: None,
            exclude: None,
            backend: FingerprintBackend::Content,
            prefix_bytes: None,
            use_cutoff: true,
            workers: 1,
            skip_hidden: false,
            follow_symlinks: false,
        }
    }
}

/// Builder for verification runs
pub struct VerifierBuilder {
    config: VerifyConfig,
    fingerprinter: Option<Arc<dyn Fingerprinter>>,
}

impl VerifierBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: VerifyConfig::default(),
            fingerprinter: None,
        }
    }

    /// Set the card directory
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    /// Set the directory searched for copies
    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.config.target = target.into();
        self
    }

    /// Set the suffixes to consider
    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.extensions = Some(extensions);
        self
    }

    /// Skip target subdirectories whose relative path matches `pattern`
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.exclude = Some(pattern.into());
        self
    }

    /// Set the fingerprint backend
    pub fn backend(mut self, backend: FingerprintBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Hash only the first `bytes` of each video
    pub fn prefix_bytes(mut self, bytes: Option<usize>) -> Self {
        self.config.prefix_bytes = bytes;
        self
    }

    /// Use a custom fingerprinter instead of a built-in backend
    pub fn fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    /// Enable or disable the capture-time cutoff
    pub fn use_cutoff(mut self, enabled: bool) -> Self {
        self.config.use_cutoff = enabled;
        self
    }

    /// Set the number of fingerprint workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    /// Leave out hidden files and directories on both sides
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.config.skip_hidden = skip;
        self
    }

    /// Follow symbolic links
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Build the verifier
    ///
    /// Fails on an invalid exclusion pattern, or on a prefix length the
    /// chosen backend cannot honour.
    pub fn build(self) -> Result<Verifier, VerifyError> {
        if let Some(bytes) = self.config.prefix_bytes {
            if bytes == 0 {
                return Err(VerifyError::Config(
                    "Prefix length must be greater than zero".to_string(),
                ));
            }
            if self.fingerprinter.is_none() && self.config.backend == FingerprintBackend::Content {
                return Err(VerifyError::Config(
                    "--prefix-bytes only applies to the metadata backend".to_string(),
                ));
            }
        }

        let exclude = self
            .config
            .exclude
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(DirectoryExclusion::new)
            .transpose()
            .map_err(|e| VerifyError::Config(format!("Invalid exclusion pattern: {}", e)))?;

        let extensions = self
            .config
            .extensions
            .clone()
            .unwrap_or_else(|| self.config.backend.default_extensions());

        let source_scan = ScanConfig {
            follow_symlinks: self.config.follow_symlinks,
            skip_hidden: self.config.skip_hidden,
            extensions: Some(extensions),
            exclude: None,
        };
        let target_scan = ScanConfig {
            exclude,
            ..source_scan.clone()
        };

        let fingerprinter = self
            .fingerprinter
            .unwrap_or_else(|| self.config.backend.build(self.config.prefix_bytes));

        Ok(Verifier {
            config: self.config,
            fingerprinter,
            source_scan,
            target_scan,
        })
    }
}

impl Default for VerifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that every card file has a copy in the target tree
pub struct Verifier {
    config: VerifyConfig,
    fingerprinter: Arc<dyn Fingerprinter>,
    source_scan: ScanConfig,
    target_scan: ScanConfig,
}

impl Verifier {
    /// Create a new builder
    pub fn builder() -> VerifierBuilder {
        VerifierBuilder::new()
    }

    /// Run without events
    pub fn run(&self) -> Result<VerificationReport, VerifyError> {
        self.run_with_events(&null_sender())
    }

    /// Run with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<VerificationReport, VerifyError> {
        let start_time = Instant::now();
        events.send(Event::Verify(VerifyEvent::Started));

        if !self.config.target.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: self.config.target.clone(),
            }
            .into());
        }

        let build = CatalogBuilder::new(Arc::clone(&self.fingerprinter), self.source_scan.clone())
            .build_with_events(&self.config.source, events)?;

        let mut report = VerificationReport {
            source: self.config.source.clone(),
            target: self.config.target.clone(),
            fingerprinter: self.fingerprinter.name().to_string(),
            source_files_seen: build.files_seen,
            catalog_size: build.catalog.len(),
            found: 0,
            missing: Vec::new(),
            termination: None,
            cutoff: build.cutoff,
            cutoff_applied: false,
            candidates_total: 0,
            candidates_fingerprinted: 0,
            collisions: build.collisions,
            failures: build.failures,
            duration_ms: 0,
        };

        if build.catalog.is_empty() {
            info!("No files found on the card with the given extensions");
            events.send(Event::Verify(VerifyEvent::NothingToVerify));
            report.duration_ms = start_time.elapsed().as_millis() as u64;
            events.send(Event::Verify(VerifyEvent::Completed {
                missing: 0,
                duration_ms: report.duration_ms,
            }));
            return Ok(report);
        }

        events.send(Event::Verify(VerifyEvent::CutoffDetermined {
            cutoff: build.cutoff,
        }));
        let cutoff = build.cutoff.filter(|_| self.config.use_cutoff);
        report.cutoff_applied = cutoff.is_some();

        let outcome = MatchEngine::new(Arc::clone(&self.fingerprinter), self.target_scan.clone())
            .with_cutoff(cutoff)
            .with_workers(self.config.workers)
            .run_with_events(&self.config.target, build.catalog, events)?;

        report.found = outcome.found;
        report.missing = outcome.residual.paths();
        report.termination = Some(outcome.termination);
        report.candidates_total = outcome.candidates_total;
        report.candidates_fingerprinted = outcome.fingerprinted;
        report.failures.extend(outcome.failures);
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Verify(VerifyEvent::Completed {
            missing: report.missing.len(),
            duration_ms: report.duration_ms,
        }));

        Ok(report)
    }
}
