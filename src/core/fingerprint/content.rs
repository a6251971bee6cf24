//! Content-hash fingerprints.
//!
//! The default policy hashes every byte with BLAKE3. The prefix policy only
//! reads the first bytes of a file and mixes in its length; it is much cheaper
//! on large videos but two files sharing a prefix and a length will collide.

use super::traits::{Fingerprint, FingerprintKind, Fingerprinted, Fingerprinter};
use crate::error::FingerprintError;
use memmap2::MmapOptions;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use xxhash_rust::xxh3::xxh3_128;

/// Files at least this large are memory-mapped instead of streamed
const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Read buffer for streamed hashing
const BUFFER_SIZE: usize = 1024 * 1024;

/// How much of a file is hashed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Hash the whole file
    Full,
    /// Hash the first `n` bytes and the file length
    Prefix(usize),
}

/// Fingerprints files by their bytes
#[derive(Debug, Clone)]
pub struct ContentFingerprinter {
    policy: ContentPolicy,
}

impl ContentFingerprinter {
    /// Full-content BLAKE3 fingerprints
    pub fn new() -> Self {
        Self {
            policy: ContentPolicy::Full,
        }
    }

    /// Fingerprints with an explicit policy
    pub fn with_policy(policy: ContentPolicy) -> Self {
        Self { policy }
    }

    fn hash_full(path: &Path) -> Result<Vec<u8>, FingerprintError> {
        let file = File::open(path).map_err(|e| FingerprintError::io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| FingerprintError::io(path, e))?
            .len();

        let mut hasher = blake3::Hasher::new();

        if size >= MMAP_THRESHOLD {
            // Safety: the map is only read, and only for the duration of this call
            let mmap = unsafe { MmapOptions::new().map(&file) }
                .map_err(|e| FingerprintError::io(path, e))?;
            hasher.update(&mmap[..]);
        } else {
            let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
            let mut buffer = vec![0u8; BUFFER_SIZE];
            loop {
                let bytes_read = reader
                    .read(&mut buffer)
                    .map_err(|e| FingerprintError::io(path, e))?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
        }

        Ok(hasher.finalize().as_bytes().to_vec())
    }

    fn hash_prefix(path: &Path, limit: usize) -> Result<Vec<u8>, FingerprintError> {
        let file = File::open(path).map_err(|e| FingerprintError::io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| FingerprintError::io(path, e))?
            .len();

        let mut buffer = Vec::with_capacity(limit);
        file.take(limit as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| FingerprintError::io(path, e))?;

        let mut bytes = xxh3_128(&buffer).to_le_bytes().to_vec();
        bytes.extend_from_slice(&size.to_le_bytes());
        Ok(bytes)
    }
}

impl Default for ContentFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter for ContentFingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprinted, FingerprintError> {
        let fingerprint = match self.policy {
            ContentPolicy::Full => {
                Fingerprint::new(FingerprintKind::Content, Self::hash_full(path)?)
            }
            ContentPolicy::Prefix(limit) => {
                Fingerprint::new(FingerprintKind::PartialContent, Self::hash_prefix(path, limit)?)
            }
        };

        Ok(Fingerprinted::without_capture_time(fingerprint))
    }

    fn name(&self) -> &'static str {
        match self.policy {
            ContentPolicy::Full => "blake3",
            ContentPolicy::Prefix(_) => "prefix-xxh3",
        }
    }
}
