//! File and directory filtering for the scanner.

use regex::Regex;
use std::path::Path;

/// Suffixes accepted when the caller does not supply any
pub const DEFAULT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".mov", ".mp4", ".cr2", ".cr3"];

/// Filters files by a case-insensitive file name suffix
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    /// Lowercased suffixes to include
    suffixes: Vec<String>,
    /// Drop files whose name starts with `.`
    skip_hidden: bool,
}

impl ExtensionFilter {
    /// Create a new filter with the default media suffixes
    pub fn new() -> Self {
        Self::with_suffixes(DEFAULT_EXTENSIONS.iter().copied())
    }

    /// Create a filter accepting the given suffixes (e.g. `.jpg`)
    pub fn with_suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut suffixes: Vec<String> = suffixes
            .into_iter()
            .map(|s| s.as_ref().to_lowercase())
            .collect();
        suffixes.sort();
        suffixes.dedup();

        Self {
            suffixes,
            skip_hidden: false,
        }
    }

    /// Drop hidden files (starting with .); they are kept by default
    pub fn skipping_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();

        if self.skip_hidden && name.starts_with('.') {
            return false;
        }

        self.matches_name(&name)
    }

    /// Case-insensitive suffix test against a bare file name
    fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Skips directory subtrees whose path relative to the scan root matches a regex
///
/// The relative path uses `/` separators and is tested both bare (`backup/raw`)
/// and with a trailing separator (`backup/raw/`), so `^backup/` excludes the
/// `backup` directory itself as well as everything below it.
#[derive(Debug, Clone)]
pub struct DirectoryExclusion {
    pattern: Regex,
}

impl DirectoryExclusion {
    /// Compile an exclusion pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Check whether a directory, relative to the root, is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if relative.is_empty() {
            return false;
        }

        self.pattern.is_match(&relative) || self.pattern.is_match(&format!("{}/", relative))
    }
}
