//! # Scanner Module
//!
//! Discovers media files below a directory.
//!
//! Files qualify by a case-insensitive suffix of their name (`.jpg`, `.CR3`,
//! ...). Directories can be pruned with a regex tested against their path
//! relative to the scan root, which removes the whole subtree.
//!
//! ## Example
//! ```rust,ignore
//! use sdcard_verify::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/media/card"))?;
//! ```

mod filter;
mod walker;

pub use filter::{DirectoryExclusion, ExtensionFilter, DEFAULT_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A discovered media file, not yet fingerprinted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// Last modified time
    pub modified: SystemTime,
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Qualifying files in walk order
    pub files: Vec<MediaFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
    /// Number of directory subtrees pruned by the exclusion pattern
    pub directories_excluded: usize,
}

/// Order files newest-modified first, keeping walk order among equal times
pub fn sort_newest_first(files: &mut [MediaFile]) {
    files.sort_by(|a, b| b.modified.cmp(&a.modified));
}
