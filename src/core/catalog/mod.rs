//! # Catalog Module
//!
//! The set of card files still waiting for a copy to be found.
//!
//! A [`SourceCatalog`] maps each distinct fingerprint seen on the card to the
//! card path that produced it. It is built once by [`CatalogBuilder`] and then
//! only ever shrinks: every match removes an entry, and nothing is re-added.

mod builder;

pub use builder::{CatalogBuild, CatalogBuilder, Collision};

use crate::core::fingerprint::Fingerprint;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mapping from fingerprint to card path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCatalog {
    entries: HashMap<Fingerprint, PathBuf>,
}

impl SourceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a card file, returning the path previously stored under the
    /// same fingerprint
    pub fn insert(&mut self, fingerprint: Fingerprint, path: PathBuf) -> Option<PathBuf> {
        self.entries.insert(fingerprint, path)
    }

    /// Consume a fingerprint
    ///
    /// Returns the card path on the first call and `None` on every later call
    /// for the same fingerprint.
    pub fn take(&mut self, fingerprint: &Fingerprint) -> Option<PathBuf> {
        self.entries.remove(fingerprint)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.entries.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Card paths still pending, sorted for stable reports
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.entries.values().cloned().collect();
        paths.sort();
        paths
    }
}

impl FromIterator<(Fingerprint, PathBuf)> for SourceCatalog {
    fn from_iter<I: IntoIterator<Item = (Fingerprint, PathBuf)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
