//! # Core Module
//!
//! The terminal-agnostic verification engine.
//!
//! ## Modules
//! - `scanner` - Discovers media files under a root, honouring exclusions
//! - `metadata` - Extracts EXIF capture metadata from stills
//! - `fingerprint` - Content and metadata fingerprint backends
//! - `catalog` - Fingerprint-keyed index of the card's files
//! - `matcher` - Newest-first search of the target tree
//! - `pipeline` - Orchestrates a full verification run

pub mod catalog;
pub mod fingerprint;
pub mod matcher;
pub mod metadata;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use catalog::{CatalogBuilder, SourceCatalog};
pub use fingerprint::{Fingerprint, FingerprintBackend, Fingerprinter};
pub use matcher::{MatchEngine, Termination};
pub use metadata::CaptureMetadata;
pub use pipeline::{VerificationReport, Verifier};
pub use scanner::MediaFile;
