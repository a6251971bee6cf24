//! Directory walking implementation using walkdir.

use super::filter::{DirectoryExclusion, ExtensionFilter};
use super::{MediaFile, ScanResult};
use crate::error::ScanError;
use std::cell::Cell;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Skip files and directories whose name starts with `.`
    pub skip_hidden: bool,
    /// Custom suffixes to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
    /// Directories to prune, matched on their path relative to the root
    pub exclude: Option<DirectoryExclusion>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ExtensionFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = match config.extensions {
            Some(ref extensions) => ExtensionFilter::with_suffixes(extensions),
            None => ExtensionFilter::new(),
        }
        .skipping_hidden(config.skip_hidden);

        Self { config, filter }
    }

    /// Recursively collect every qualifying file below `root`
    ///
    /// Only a missing or non-directory root is an error; unreadable entries
    /// are collected in [`ScanResult::errors`] and the walk continues.
    pub fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let directories_excluded = Cell::new(0usize);

        let entries = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.keep_entry(root, entry, &directories_excluded));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: std::io::Error::other(e.to_string()),
                        }
                    };
                    errors.push(error);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.filter.should_include(entry.path()) {
                continue;
            }

            let modified = entry
                .metadata()
                .map_err(std::io::Error::from)
                .and_then(|metadata| metadata.modified());

            match modified {
                Ok(modified) => files.push(MediaFile {
                    path: entry.into_path(),
                    modified,
                }),
                Err(source) => errors.push(ScanError::Metadata {
                    path: entry.into_path(),
                    source,
                }),
            }
        }

        Ok(ScanResult {
            files,
            errors,
            directories_excluded: directories_excluded.get(),
        })
    }

    fn keep_entry(&self, root: &Path, entry: &DirEntry, excluded: &Cell<usize>) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            return false;
        }

        if !entry.file_type().is_dir() {
            return true;
        }

        let Some(ref exclusion) = self.config.exclude else {
            return true;
        };

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if exclusion.is_excluded(relative) {
            debug!(directory = %relative.display(), "Skipping excluded directory");
            excluded.set(excluded.get() + 1);
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(name.as_bytes()).unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(temp_dir.path()).unwrap();

        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "root.jpg");
        create_file(temp_dir.path(), "DCIM/100CANON/IMG_0001.CR3");
        create_file(temp_dir.path(), "DCIM/100CANON/MVI_0002.MP4");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 3);
    }

    #[test]
    fn scan_excludes_non_media_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.jpg");
        create_file(temp_dir.path(), "MISC/autprint.mrk");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn scan_honours_custom_extensions() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "DSC_0001.NEF");
        create_file(temp_dir.path(), "DSC_0001.JPG");

        let config = ScanConfig {
            extensions: Some(vec![".nef".to_string()]),
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("DSC_0001.NEF"));
    }

    #[test]
    fn excluded_directory_contributes_no_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "2024/IMG_1.jpg");
        create_file(temp_dir.path(), "backup/IMG_1.jpg");
        create_file(temp_dir.path(), "backup/deep/nested/IMG_2.jpg");

        let config = ScanConfig {
            exclude: Some(DirectoryExclusion::new("^backup/").unwrap()),
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("2024/IMG_1.jpg"));
        assert_eq!(result.directories_excluded, 1);
    }

    #[test]
    fn scan_includes_hidden_entries_by_default() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), ".sync/2024/IMG_9.jpg");
        create_file(temp_dir.path(), "DCIM/.IMG_8.jpg");
        create_file(temp_dir.path(), "visible.jpg");

        let result = WalkDirScanner::new(ScanConfig::default())
            .scan(temp_dir.path())
            .unwrap();
        assert_eq!(result.files.len(), 3);

        let config = ScanConfig {
            skip_hidden: true,
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(temp_dir.path()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("visible.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_symlinked_directories_when_asked() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        create_file(outside.path(), "IMG_1.jpg");
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("linked")).unwrap();

        let result = WalkDirScanner::new(ScanConfig::default())
            .scan(temp_dir.path())
            .unwrap();
        assert!(result.files.is_empty());

        let config = ScanConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(temp_dir.path()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("linked/IMG_1.jpg"));
    }

    #[test]
    fn scan_nonexistent_directory_returns_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }
}
