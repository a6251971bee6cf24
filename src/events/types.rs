//! Event type definitions for progress reporting.

use crate::core::matcher::{MatchPhase, Termination};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// All events emitted during a verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source catalog construction
    Index(IndexEvent),
    /// Target traversal and matching
    Match(MatchEvent),
    /// Verification-level events
    Verify(VerifyEvent),
}

/// Events while fingerprinting the source card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Catalog construction has started
    Started { root: PathBuf },
    /// Enumeration finished, fingerprinting is about to start
    FilesDiscovered { total: usize },
    /// A source file was fingerprinted
    Fingerprinted { path: PathBuf },
    /// Two source files produced the same fingerprint
    Collision { kept: PathBuf, replaced: PathBuf },
    /// A file could not be enumerated or fingerprinted
    Error { path: PathBuf, message: String },
    /// Catalog construction completed
    Completed {
        files_seen: usize,
        unique_fingerprints: usize,
    },
}

/// Events while searching the target tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Moving to a new engine phase
    PhaseChanged { phase: MatchPhase },
    /// Enumeration and sorting finished
    CandidatesReady { total: usize },
    /// A candidate is about to be fingerprinted
    Progress(MatchProgress),
    /// A candidate matched a pending source file
    Matched { source: PathBuf, target: PathBuf },
    /// A candidate could not be enumerated or fingerprinted
    Error { path: PathBuf, message: String },
    /// Traversal ended
    Completed {
        found: usize,
        remaining: usize,
        termination: Termination,
    },
}

/// Progress information while scanning candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProgress {
    /// Directory of the candidate being searched
    pub current_dir: PathBuf,
    /// Zero-based position of the candidate in newest-first order
    pub index: usize,
    /// Total number of candidates
    pub total: usize,
    /// Modification time of the candidate
    pub modified: SystemTime,
}

/// Verification-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerifyEvent {
    /// Run has started
    Started,
    /// The card had no qualifying files, the target is not searched
    NothingToVerify,
    /// Earliest capture time derived from the card, if any
    CutoffDetermined { cutoff: Option<SystemTime> },
    /// Run completed
    Completed { missing: usize, duration_ms: u64 },
}
