//! # Matcher Module
//!
//! Searches a target tree for copies of the files in a [`SourceCatalog`].
//!
//! ## Phases
//! 1. **Enumerating** - walk the target, pruning excluded directories, and
//!    record every qualifying file with its modification time
//! 2. **Sorting** - newest-modified first; fresh copies are usually the newest
//!    files in a large archive
//! 3. **Scanning** - fingerprint candidates in that order and consume matching
//!    catalog entries
//!
//! Scanning stops as soon as the catalog is empty, or at the first candidate
//! older than the cutoff (the earliest capture time on the card), or when the
//! candidates run out. Every ending leaves a valid residual catalog.
//!
//! [`SourceCatalog`]: crate::core::catalog::SourceCatalog

mod engine;

pub use engine::MatchEngine;

use crate::core::catalog::SourceCatalog;
use serde::{Deserialize, Serialize};

/// Phases of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Enumerating,
    Sorting,
    Scanning,
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPhase::Enumerating => write!(f, "Enumerating"),
            MatchPhase::Sorting => write!(f, "Sorting"),
            MatchPhase::Scanning => write!(f, "Scanning"),
        }
    }
}

/// Why a traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every candidate was examined
    Exhausted,
    /// The catalog became empty
    AllMatched,
    /// A candidate older than the cutoff was reached
    CutoffReached,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "searched every candidate"),
            Termination::AllMatched => write!(f, "all files matched"),
            Termination::CutoffReached => write!(f, "reached files older than the earliest capture"),
        }
    }
}

/// Result of a traversal
#[derive(Debug)]
pub struct MatchOutcome {
    /// Catalog entries consumed by a match
    pub found: usize,
    /// Entries that were not matched
    pub residual: SourceCatalog,
    pub termination: Termination,
    /// Candidates discovered in the target tree
    pub candidates_total: usize,
    /// Candidates actually fingerprinted
    pub fingerprinted: usize,
    /// Directory subtrees pruned by the exclusion pattern
    pub directories_excluded: usize,
    /// Enumeration and fingerprint failures (non-fatal)
    pub failures: Vec<String>,
}
