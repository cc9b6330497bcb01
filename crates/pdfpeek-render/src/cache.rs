// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview cache directory.
//
// Every preview is written as `<prefix>-<document stem>-<page index>-<random>.png`
// directly inside the cache directory. Clearing deletes exactly the files
// whose name starts with the prefix, compared case-insensitively.

use std::fs::DirEntry;
use std::io::Write;
use std::path::{Path, PathBuf};

use pdfpeek_core::error::{PreviewError, Result};
use tracing::{debug, info, instrument, warn};

/// The directory holding generated previews and the prefix that marks them.
#[derive(Debug, Clone)]
pub struct PreviewCache {
    dir: PathBuf,
    prefix: String,
}

impl PreviewCache {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix>-<document stem>-<page index>` for a source document.
    pub fn preview_name_stem(&self, source: &Path, page_index: usize) -> Result<String> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PreviewError::InvalidArgument(format!(
                    "no document name in path {}",
                    source.display()
                ))
            })?;
        Ok(format!("{}-{}-{}", self.prefix, stem, page_index))
    }

    /// Whether `file_name` carries the preview prefix.
    pub fn is_preview_name(&self, file_name: &str) -> bool {
        file_name
            .to_lowercase()
            .starts_with(&self.prefix.to_lowercase())
    }

    /// Write `png` to a new, uniquely named preview file and return its
    /// absolute path. Existing previews are never overwritten.
    #[instrument(skip(self, png), fields(source = %source.display(), bytes = png.len()))]
    pub fn create_preview(&self, source: &Path, page_index: usize, png: &[u8]) -> Result<PathBuf> {
        let stem = self.preview_name_stem(source, page_index)?;
        std::fs::create_dir_all(&self.dir)?;

        // The temp file is removed again if any step below fails.
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(".png")
            .tempfile_in(&self.dir)?;
        file.write_all(png)?;
        file.flush()?;

        let (_, path) = file.keep().map_err(|e| PreviewError::Io(e.error))?;
        let path = std::path::absolute(&path)?;
        debug!(path = %path.display(), "preview written");
        Ok(path)
    }

    /// Delete every preview file in the directory and return how many were
    /// removed. A missing directory is already clear.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn clear(&self) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("cache directory does not exist");
                return Ok(0);
            }
            Err(err) => return Err(err.into()),
        };

        let mut removed = 0;
        for entry in entries {
            if self.remove_if_preview(&entry) {
                removed += 1;
            }
        }

        info!(removed, "preview cache cleared");
        Ok(removed)
    }

    /// Delete one listed entry if it is a preview file. Entries that cannot
    /// be read, inspected or deleted are logged and skipped.
    fn remove_if_preview(&self, entry: &std::io::Result<DirEntry>) -> bool {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "could not read cache entry");
                return false;
            }
        };
        if !self.is_preview_name(&entry.file_name().to_string_lossy()) {
            return false;
        }
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => return false,
            Ok(_) => {}
            Err(err) => {
                warn!(path = %entry.path().display(), %err, "could not inspect cache entry");
                return false;
            }
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %entry.path().display(), %err, "could not delete preview");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "FlutterEasyPdfViewerPlugin";

    fn cache_in(dir: &Path) -> PreviewCache {
        PreviewCache::new(dir, PREFIX)
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn name_stem_uses_document_stem_and_index() {
        let cache = cache_in(Path::new("/cache"));
        let stem = cache
            .preview_name_stem(Path::new("/sdcard/Download/annual.report.pdf"), 4)
            .unwrap();
        assert_eq!(stem, "FlutterEasyPdfViewerPlugin-annual.report-4");
    }

    #[test]
    fn name_stem_without_extension() {
        let cache = cache_in(Path::new("/cache"));
        let stem = cache.preview_name_stem(Path::new("/tmp/scan"), 0).unwrap();
        assert_eq!(stem, "FlutterEasyPdfViewerPlugin-scan-0");
    }

    #[test]
    fn name_stem_rejects_pathless_input() {
        let cache = cache_in(Path::new("/cache"));
        assert!(cache.preview_name_stem(Path::new("/"), 0).is_err());
    }

    #[test]
    fn prefix_match_ignores_case() {
        let cache = cache_in(Path::new("/cache"));
        assert!(cache.is_preview_name("flutterEASYpdfviewerplugin-a-0-x.png"));
        assert!(!cache.is_preview_name("other-FlutterEasyPdfViewerPlugin.png"));
    }

    #[test]
    fn repeated_previews_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let source = Path::new("/docs/book.pdf");

        let first = cache.create_preview(source, 2, b"one").unwrap();
        let second = cache.create_preview(source, 2, b"two").unwrap();

        assert_ne!(first, second);
        assert!(first.is_absolute());
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");

        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("FlutterEasyPdfViewerPlugin-book-2-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn create_preview_makes_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir.path().join("a").join("b"));
        let path = cache.create_preview(Path::new("x.pdf"), 0, b"png").unwrap();
        assert!(path.starts_with(std::path::absolute(dir.path()).unwrap()));
    }

    #[test]
    fn clear_removes_only_prefixed_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        cache.create_preview(Path::new("a.pdf"), 0, b"a").unwrap();
        cache.create_preview(Path::new("b.pdf"), 3, b"b").unwrap();
        std::fs::write(dir.path().join("flutterEasyPdfViewerPlugin-legacy.png"), b"c").unwrap();
        std::fs::write(dir.path().join("keep-me.png"), b"d").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"e").unwrap();
        std::fs::create_dir(dir.path().join("FlutterEasyPdfViewerPlugin-dir")).unwrap();

        let removed = cache.clear().unwrap();

        assert_eq!(removed, 3);
        assert_eq!(
            names_in(dir.path()),
            vec!["FlutterEasyPdfViewerPlugin-dir", "keep-me.png", "notes.txt"]
        );
    }

    #[test]
    fn clear_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir.path().join("never-created"));
        assert_eq!(cache.clear().unwrap(), 0);
    }

    #[test]
    fn clear_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("cache");
        std::fs::write(&not_a_dir, b"plain file").unwrap();

        assert!(cache_in(&not_a_dir).clear().is_err());
        assert!(not_a_dir.is_file());
    }

    #[test]
    fn unreadable_entry_is_skipped() {
        let cache = cache_in(Path::new("/cache"));
        let entry = Err(std::io::Error::other("stat failed"));
        assert!(!cache.remove_if_preview(&entry));
    }

    #[test]
    fn clear_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        cache.create_preview(Path::new("a.pdf"), 0, b"a").unwrap();
        assert_eq!(cache.clear().unwrap(), 1);
        assert_eq!(cache.clear().unwrap(), 0);
    }
}
