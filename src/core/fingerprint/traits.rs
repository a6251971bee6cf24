//! Trait and value types shared by all fingerprint backends.

use crate::error::FingerprintError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

/// What a fingerprint was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerprintKind {
    /// BLAKE3 digest of the full file content
    Content,
    /// Hash of the first bytes of a file plus its length
    PartialContent,
    /// EXIF capture identifier
    Metadata,
}

impl std::fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FingerprintKind::Content => write!(f, "content"),
            FingerprintKind::PartialContent => write!(f, "partial"),
            FingerprintKind::Metadata => write!(f, "metadata"),
        }
    }
}

/// An opaque identifier for a file; equal fingerprints mean "same file"
///
/// The kind takes part in equality, so a digest can never collide with a
/// metadata identifier that happens to share its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    kind: FingerprintKind,
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Create a fingerprint from raw bytes
    pub fn new(kind: FingerprintKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
        }
    }

    /// Get the backend kind that produced this fingerprint
    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the bytes as a hexadecimal string
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FingerprintKind::Metadata => write!(f, "{}", String::from_utf8_lossy(&self.bytes)),
            _ => write!(f, "{}", self.to_hex()),
        }
    }
}

/// Output of a backend for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinted {
    /// The identifier used for matching
    pub fingerprint: Fingerprint,
    /// True capture time, if the backend can derive one
    pub captured_at: Option<SystemTime>,
}

impl Fingerprinted {
    /// A fingerprint with no known capture time
    pub fn without_capture_time(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            captured_at: None,
        }
    }
}

/// Trait for fingerprint backends
///
/// The same backend instance is used for the card and for the target tree,
/// so implementations must be deterministic for unmodified files.
pub trait Fingerprinter: Send + Sync {
    /// Compute the fingerprint of a single file
    fn fingerprint(&self, path: &Path) -> Result<Fingerprinted, FingerprintError>;

    /// Short name for logs and reports
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn to_hex_produces_correct_string() {
        let fp = Fingerprint::new(FingerprintKind::Content, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(fp.to_hex(), "deadbeef");
        assert_eq!(fp.to_string(), "deadbeef");
    }

    #[test]
    fn metadata_fingerprint_displays_as_text() {
        let fp = Fingerprint::new(FingerprintKind::Metadata, "2024:01:01 10:00:00-- | X | -");
        assert_eq!(fp.to_string(), "2024:01:01 10:00:00-- | X | -");
    }

    #[test]
    fn kind_participates_in_equality() {
        let a = Fingerprint::new(FingerprintKind::Content, b"abc".to_vec());
        let b = Fingerprint::new(FingerprintKind::Metadata, b"abc".to_vec());
        assert_ne!(a, b);

        let set: HashSet<_> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn kind_display() {
        assert_eq!(FingerprintKind::Content.to_string(), "content");
        assert_eq!(FingerprintKind::PartialContent.to_string(), "partial");
        assert_eq!(FingerprintKind::Metadata.to_string(), "metadata");
    }
}
