//! Builds the source catalog from a card directory.

use super::SourceCatalog;
use crate::core::fingerprint::{Fingerprint, Fingerprinter};
use crate::core::scanner::{ScanConfig, WalkDirScanner};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, IndexEvent};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

/// Two card files that produced the same fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub fingerprint: Fingerprint,
    /// The later file, which stays in the catalog
    pub kept: PathBuf,
    /// The earlier file, which can no longer be verified on its own
    pub replaced: PathBuf,
}

/// Result of indexing a card
#[derive(Debug)]
pub struct CatalogBuild {
    pub catalog: SourceCatalog,
    /// Earliest capture time across the card, if the backend reports any
    pub cutoff: Option<SystemTime>,
    /// Qualifying files found on the card
    pub files_seen: usize,
    pub collisions: Vec<Collision>,
    /// Enumeration and fingerprint failures (non-fatal)
    pub failures: Vec<String>,
}

/// Fingerprints every qualifying file on a card
pub struct CatalogBuilder {
    fingerprinter: Arc<dyn Fingerprinter>,
    scan_config: ScanConfig,
}

impl CatalogBuilder {
    pub fn new(fingerprinter: Arc<dyn Fingerprinter>, scan_config: ScanConfig) -> Self {
        Self {
            fingerprinter,
            scan_config,
        }
    }

    /// Build without events
    pub fn build(&self, root: &Path) -> Result<CatalogBuild, ScanError> {
        self.build_with_events(root, &null_sender())
    }

    /// Build the catalog for `root`
    ///
    /// Files are fingerprinted in parallel but folded into the catalog in walk
    /// order, so when two files collide the one visited later wins.
    pub fn build_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<CatalogBuild, ScanError> {
        events.send(Event::Index(IndexEvent::Started {
            root: root.to_path_buf(),
        }));

        let scan = WalkDirScanner::new(self.scan_config.clone()).scan(root)?;
        let mut failures = Vec::new();

        for error in scan.errors {
            warn!("{}", error);
            events.send(Event::Index(IndexEvent::Error {
                path: error.path().to_path_buf(),
                message: error.to_string(),
            }));
            failures.push(error.to_string());
        }

        let files_seen = scan.files.len();
        events.send(Event::Index(IndexEvent::FilesDiscovered { total: files_seen }));
        info!(files = files_seen, root = %root.display(), "Fingerprinting card files");

        let fingerprinter = self.fingerprinter.as_ref();
        let results: Vec<_> = scan
            .files
            .into_par_iter()
            .map(|file| {
                let result = fingerprinter.fingerprint(&file.path);
                if result.is_ok() {
                    events.send(Event::Index(IndexEvent::Fingerprinted {
                        path: file.path.clone(),
                    }));
                }
                (file.path, result)
            })
            .collect();

        let mut catalog = SourceCatalog::new();
        let mut cutoff: Option<SystemTime> = None;
        let mut collisions = Vec::new();

        for (path, result) in results {
            let fingerprinted = match result {
                Ok(fingerprinted) => fingerprinted,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    events.send(Event::Index(IndexEvent::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    failures.push(e.to_string());
                    continue;
                }
            };

            if let Some(captured) = fingerprinted.captured_at {
                cutoff = Some(cutoff.map_or(captured, |c| c.min(captured)));
            }

            let fingerprint = fingerprinted.fingerprint;
            if let Some(previous) = catalog.insert(fingerprint.clone(), path.clone()) {
                if previous != path {
                    warn!(
                        "Duplicate fingerprint for '{}' and '{}': {}",
                        path.display(),
                        previous.display(),
                        fingerprint
                    );
                    events.send(Event::Index(IndexEvent::Collision {
                        kept: path.clone(),
                        replaced: previous.clone(),
                    }));
                    collisions.push(Collision {
                        fingerprint,
                        kept: path,
                        replaced: previous,
                    });
                }
            }
        }

        if files_seen != catalog.len() {
            warn!(
                "Only {} out of {} files will be compared",
                catalog.len(),
                files_seen
            );
        }

        events.send(Event::Index(IndexEvent::Completed {
            files_seen,
            unique_fingerprints: catalog.len(),
        }));

        Ok(CatalogBuild {
            catalog,
            cutoff,
            files_seen,
            collisions,
            failures,
        })
    }
}
