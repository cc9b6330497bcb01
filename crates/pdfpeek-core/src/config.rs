// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview handler configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PreviewError, Result};

/// Prefix carried by every generated preview file. Cache clearing matches on it.
pub const DEFAULT_FILE_PREFIX: &str = "FlutterEasyPdfViewerPlugin";

/// Width in pixels of every rendered preview.
pub const DEFAULT_TARGET_WIDTH: u32 = 2048;

/// Name given to the background render thread.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "flutterEasyPdfViewer";

const ENV_CACHE_DIR: &str = "PDFPEEK_CACHE_DIR";
const ENV_PDFIUM_DIR: &str = "PDFPEEK_PDFIUM_DIR";
const ENV_TARGET_WIDTH: &str = "PDFPEEK_TARGET_WIDTH";

/// Settings for the preview handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreviewConfig {
    /// Directory that receives generated PNG previews.
    pub cache_dir: PathBuf,
    /// Fixed file-name prefix of generated previews.
    pub file_prefix: String,
    /// Raster width in pixels; height follows the page aspect ratio.
    pub target_width: u32,
    /// Thread name for the single background worker.
    pub worker_thread_name: String,
    /// Directory holding the PDFium shared library, searched before the
    /// default locations.
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            target_width: DEFAULT_TARGET_WIDTH,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            pdfium_library_dir: None,
        }
    }
}

impl PreviewConfig {
    /// Default settings with the cache placed in `dir`.
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Apply `PDFPEEK_*` environment overrides on top of the current values.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `PDFPEEK_*` overrides read through `lookup`. Empty values are
    /// ignored, and so is a target width that is not a positive integer.
    pub fn apply_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_PDFIUM_DIR) {
            self.pdfium_library_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_TARGET_WIDTH) {
            match raw.parse::<u32>() {
                Ok(width) if width > 0 => self.target_width = width,
                _ => warn!(value = %raw, "ignoring invalid {ENV_TARGET_WIDTH}"),
            }
        }
        self
    }

    /// Reject settings that would break the cache naming contract or sizing.
    pub fn validate(&self) -> Result<()> {
        if self.file_prefix.trim().is_empty() {
            return Err(PreviewError::InvalidArgument(
                "file prefix must not be empty".into(),
            ));
        }
        if self.target_width == 0 {
            return Err(PreviewError::InvalidArgument(
                "target width must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Platform cache directory for previews.
///
/// On mobile the embedding application passes its own cache directory in
/// the config; this fallback serves desktop hosts and CI.
pub fn default_cache_dir() -> PathBuf {
    if let Some(xdg) = env_path("XDG_CACHE_HOME") {
        return xdg.join("pdfpeek");
    }
    if let Some(home) = env_path("HOME") {
        return home.join(".cache").join("pdfpeek");
    }
    std::env::temp_dir().join("pdfpeek")
}
