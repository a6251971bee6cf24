//! EXIF-based fingerprints for stills, content hashing for everything else.

use super::content::ContentFingerprinter;
use super::traits::{Fingerprint, FingerprintKind, Fingerprinted, Fingerprinter};
use crate::core::metadata::extract_metadata;
use crate::core::scanner::ExtensionFilter;
use crate::error::FingerprintError;
use std::path::Path;

/// Suffixes treated as stills carrying EXIF data
pub const STILL_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".cr2", ".cr3", ".nef"];

/// Fingerprints stills by their capture identifier
///
/// Unlike a content hash, this also yields the capture time, which lets the
/// engine stop once it reaches target files older than anything on the card.
/// Files that are not stills go to the fallback content fingerprinter.
#[derive(Debug, Clone)]
pub struct MetadataFingerprinter {
    stills: ExtensionFilter,
    fallback: ContentFingerprinter,
}

impl MetadataFingerprinter {
    /// Metadata fingerprints with full-content hashing for videos
    pub fn new() -> Self {
        Self::with_fallback(ContentFingerprinter::new())
    }

    /// Metadata fingerprints with a custom fallback for non-stills
    pub fn with_fallback(fallback: ContentFingerprinter) -> Self {
        Self {
            stills: ExtensionFilter::with_suffixes(STILL_EXTENSIONS.iter().copied()),
            fallback,
        }
    }

    fn is_still(&self, path: &Path) -> bool {
        self.stills.should_include(path)
    }
}

impl Default for MetadataFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter for MetadataFingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprinted, FingerprintError> {
        if !self.is_still(path) {
            return self.fallback.fingerprint(path);
        }

        let metadata = extract_metadata(path)?;
        let identifier = metadata
            .identifier()
            .ok_or_else(|| FingerprintError::NoMetadata {
                path: path.to_path_buf(),
            })?;

        Ok(Fingerprinted {
            fingerprint: Fingerprint::new(FingerprintKind::Metadata, identifier),
            captured_at: metadata.capture_time(),
        })
    }

    fn name(&self) -> &'static str {
        "exif"
    }
}
