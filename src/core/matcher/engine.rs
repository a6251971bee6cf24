//! Traversal engine implementation.

use super::{MatchOutcome, MatchPhase, Termination};
use crate::core::catalog::SourceCatalog;
use crate::core::fingerprint::{Fingerprinted, Fingerprinter};
use crate::core::scanner::{sort_newest_first, MediaFile, ScanConfig, WalkDirScanner};
use crate::error::{FingerprintError, ScanError};
use crate::events::{null_sender, Event, EventSender, MatchEvent, MatchProgress};
use crossbeam_channel::{bounded, unbounded};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::SystemTime;
use tracing::{debug, info, warn};

type FingerprintResult = (PathBuf, Result<Fingerprinted, FingerprintError>);

/// Searches a target tree for the entries of a catalog
pub struct MatchEngine {
    fingerprinter: Arc<dyn Fingerprinter>,
    scan_config: ScanConfig,
    cutoff: Option<SystemTime>,
    workers: usize,
}

impl MatchEngine {
    /// Create an engine; `scan_config` carries the suffix and exclusion filters
    pub fn new(fingerprinter: Arc<dyn Fingerprinter>, scan_config: ScanConfig) -> Self {
        Self {
            fingerprinter,
            scan_config,
            cutoff: None,
            workers: 1,
        }
    }

    /// Stop at the first candidate modified strictly before `cutoff`
    pub fn with_cutoff(mut self, cutoff: Option<SystemTime>) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Fingerprint up to `workers` candidates at once (1 = sequential)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Run without events
    pub fn run(&self, root: &Path, catalog: SourceCatalog) -> Result<MatchOutcome, ScanError> {
        self.run_with_events(root, catalog, &null_sender())
    }

    /// Search `root`, consuming catalog entries as their copies are found
    ///
    /// Only an unusable root is an error. The catalog is handed back as
    /// [`MatchOutcome::residual`] however the search ends.
    pub fn run_with_events(
        &self,
        root: &Path,
        catalog: SourceCatalog,
        events: &EventSender,
    ) -> Result<MatchOutcome, ScanError> {
        let mut state = ScanState::new(catalog);

        if state.catalog.is_empty() {
            return Ok(state.finish(Termination::AllMatched, 0, 0, events));
        }

        events.send(Event::Match(MatchEvent::PhaseChanged {
            phase: MatchPhase::Enumerating,
        }));
        let scan = WalkDirScanner::new(self.scan_config.clone()).scan(root)?;

        for error in scan.errors {
            warn!("{}", error);
            events.send(Event::Match(MatchEvent::Error {
                path: error.path().to_path_buf(),
                message: error.to_string(),
            }));
            state.failures.push(error.to_string());
        }

        events.send(Event::Match(MatchEvent::PhaseChanged {
            phase: MatchPhase::Sorting,
        }));
        let mut candidates = scan.files;
        sort_newest_first(&mut candidates);
        let total = candidates.len();
        events.send(Event::Match(MatchEvent::CandidatesReady { total }));

        events.send(Event::Match(MatchEvent::PhaseChanged {
            phase: MatchPhase::Scanning,
        }));
        info!(
            candidates = total,
            pending = state.catalog.len(),
            workers = self.workers,
            "Searching target"
        );

        let termination = if self.workers <= 1 {
            self.scan_sequential(&candidates, &mut state, events)
        } else {
            self.scan_pooled(candidates, &mut state, events)
        };

        Ok(state.finish(termination, total, scan.directories_excluded, events))
    }

    fn scan_sequential(
        &self,
        candidates: &[MediaFile],
        state: &mut ScanState,
        events: &EventSender,
    ) -> Termination {
        let total = candidates.len();

        for (index, candidate) in candidates.iter().enumerate() {
            if is_before_cutoff(self.cutoff, candidate.modified) {
                info!("Reached files older than earliest capture time");
                return Termination::CutoffReached;
            }

            let progress = progress_for(index, total, candidate);
            events.send(Event::Match(MatchEvent::Progress(progress)));
            let result = self.fingerprinter.fingerprint(&candidate.path);

            if state.record(&candidate.path, result, events) {
                return Termination::AllMatched;
            }
        }

        Termination::Exhausted
    }

    /// Workers fingerprint concurrently while this thread stays the only
    /// writer of the catalog. A feeder submits candidates in newest-first
    /// order and applies the cutoff on dequeue. On early termination the
    /// cancel flag turns remaining jobs into no-ops and the threads are left
    /// to wind down on their own.
    ///
    /// Only this thread touches `events`. The feeder queues progress ahead of
    /// each job and it is forwarded before that job's result.
    fn scan_pooled(
        &self,
        candidates: Vec<MediaFile>,
        state: &mut ScanState,
        events: &EventSender,
    ) -> Termination {
        let cancelled = Arc::new(AtomicBool::new(false));
        let cutoff_hit = Arc::new(AtomicBool::new(false));
        let (job_tx, job_rx) = bounded::<MediaFile>(self.workers * 2);
        let (result_tx, result_rx) = unbounded::<FingerprintResult>();
        let (progress_tx, progress_rx) = unbounded::<MatchProgress>();

        for _ in 0..self.workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let fingerprinter = Arc::clone(&self.fingerprinter);
            let cancelled = Arc::clone(&cancelled);

            thread::spawn(move || {
                for job in job_rx.iter() {
                    let result = if cancelled.load(Ordering::SeqCst) {
                        Err(FingerprintError::Cancelled)
                    } else {
                        fingerprinter.fingerprint(&job.path)
                    };
                    if result_tx.send((job.path, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        {
            let cancelled = Arc::clone(&cancelled);
            let cutoff_hit = Arc::clone(&cutoff_hit);
            let cutoff = self.cutoff;

            thread::spawn(move || {
                let total = candidates.len();
                for (index, candidate) in candidates.into_iter().enumerate() {
                    if cancelled.load(Ordering::SeqCst) {
                        return;
                    }
                    if is_before_cutoff(cutoff, candidate.modified) {
                        info!("Reached files older than earliest capture time");
                        cutoff_hit.store(true, Ordering::SeqCst);
                        return;
                    }
                    let progress = progress_for(index, total, &candidate);
                    if progress_tx.send(progress).is_err() || job_tx.send(candidate).is_err() {
                        return;
                    }
                }
            });
        }

        for (path, result) in result_rx.iter() {
            for progress in progress_rx.try_iter() {
                events.send(Event::Match(MatchEvent::Progress(progress)));
            }
            if state.record(&path, result, events) {
                cancelled.store(true, Ordering::SeqCst);
                return Termination::AllMatched;
            }
        }

        if cutoff_hit.load(Ordering::SeqCst) {
            Termination::CutoffReached
        } else {
            Termination::Exhausted
        }
    }
}

/// Mutable search state, owned by a single thread
struct ScanState {
    catalog: SourceCatalog,
    found: usize,
    fingerprinted: usize,
    failures: Vec<String>,
}

impl ScanState {
    fn new(catalog: SourceCatalog) -> Self {
        Self {
            catalog,
            found: 0,
            fingerprinted: 0,
            failures: Vec::new(),
        }
    }

    /// Apply one fingerprint result; returns true once the catalog is empty
    fn record(
        &mut self,
        path: &Path,
        result: Result<Fingerprinted, FingerprintError>,
        events: &EventSender,
    ) -> bool {
        match result {
            Ok(fingerprinted) => {
                self.fingerprinted += 1;
                if let Some(source) = self.catalog.take(&fingerprinted.fingerprint) {
                    self.found += 1;
                    debug!("{} found at {}", source.display(), path.display());
                    events.send(Event::Match(MatchEvent::Matched {
                        source,
                        target: path.to_path_buf(),
                    }));
                    return self.catalog.is_empty();
                }
            }
            Err(FingerprintError::Cancelled) => {}
            Err(e) => {
                self.fingerprinted += 1;
                warn!("Could not fingerprint {}: {}", path.display(), e);
                events.send(Event::Match(MatchEvent::Error {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }));
                self.failures.push(e.to_string());
            }
        }
        false
    }

    fn finish(
        self,
        termination: Termination,
        candidates_total: usize,
        directories_excluded: usize,
        events: &EventSender,
    ) -> MatchOutcome {
        info!(
            found = self.found,
            remaining = self.catalog.len(),
            "Search ended: {}",
            termination
        );
        events.send(Event::Match(MatchEvent::Completed {
            found: self.found,
            remaining: self.catalog.len(),
            termination,
        }));

        MatchOutcome {
            found: self.found,
            residual: self.catalog,
            termination,
            candidates_total,
            fingerprinted: self.fingerprinted,
            directories_excluded,
            failures: self.failures,
        }
    }
}

fn is_before_cutoff(cutoff: Option<SystemTime>, modified: SystemTime) -> bool {
    cutoff.is_some_and(|cutoff| modified < cutoff)
}

fn progress_for(index: usize, total: usize, candidate: &MediaFile) -> MatchProgress {
    MatchProgress {
        current_dir: candidate
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        index,
        total,
        modified: candidate.modified,
    }
}
