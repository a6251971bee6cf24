//! # Fingerprint Module
//!
//! Turns a file into a comparable identifier.
//!
//! ## Backends
//! - **content** - BLAKE3 over the whole file (default); renames and moves are
//!   irrelevant, any byte change is a different file
//! - **metadata** - EXIF capture identifier for stills, which also yields a
//!   capture time; videos fall back to content hashing
//!
//! Both the card index and the target search take the same
//! `Arc<dyn Fingerprinter>`, so the traversal code never depends on the backend.
//!
//! ## Example
//! ```rust,ignore
//! use sdcard_verify::core::fingerprint::{FingerprintBackend, Fingerprinter};
//!
//! let fingerprinter = FingerprintBackend::Content.build(None);
//! let result = fingerprinter.fingerprint(&path)?;
//! ```

mod content;
mod metadata;
mod traits;

pub use content::{ContentFingerprinter, ContentPolicy};
pub use metadata::{MetadataFingerprinter, STILL_EXTENSIONS};
pub use traits::{Fingerprint, FingerprintKind, Fingerprinted, Fingerprinter};

use crate::core::scanner::DEFAULT_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Available fingerprint backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerprintBackend {
    /// Full content hash
    Content,
    /// EXIF identifier for stills, content hash for videos
    Metadata,
}

impl FingerprintBackend {
    /// Build the backend; `prefix_bytes` limits how much of a video is hashed
    /// by the metadata backend
    pub fn build(self, prefix_bytes: Option<usize>) -> Arc<dyn Fingerprinter> {
        match self {
            FingerprintBackend::Content => Arc::new(ContentFingerprinter::new()),
            FingerprintBackend::Metadata => {
                let policy = prefix_bytes
                    .map(ContentPolicy::Prefix)
                    .unwrap_or(ContentPolicy::Full);
                Arc::new(MetadataFingerprinter::with_fallback(
                    ContentFingerprinter::with_policy(policy),
                ))
            }
        }
    }

    /// Suffixes scanned when none are given on the command line
    pub fn default_extensions(self) -> Vec<String> {
        let mut extensions: Vec<String> =
            DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect();
        if self == FingerprintBackend::Metadata {
            extensions.push(".nef".to_string());
        }
        extensions
    }

    /// Whether this backend can report capture times
    pub fn has_capture_time(self) -> bool {
        matches!(self, FingerprintBackend::Metadata)
    }
}

impl std::fmt::Display for FingerprintBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FingerprintBackend::Content => write!(f, "content"),
            FingerprintBackend::Metadata => write!(f, "metadata"),
        }
    }
}
