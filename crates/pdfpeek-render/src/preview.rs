// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The three preview operations: page count, page raster, cache clearing.
//
// Each operation opens its own document and page handles and drops them
// before returning, on both success and error paths.

use std::path::{Path, PathBuf};

use pdfpeek_core::PreviewConfig;
use pdfpeek_core::error::{PreviewError, Result};
use tracing::{debug, info, instrument, warn};

use crate::cache::PreviewCache;
use crate::raster::{encode_png, flatten_onto_white, target_dimensions};
use crate::renderer::PageRenderer;

/// Runs preview operations against a renderer and a cache directory.
#[derive(Debug, Clone)]
pub struct PreviewService {
    cache: PreviewCache,
    target_width: u32,
}

impl PreviewService {
    pub fn new(cache: PreviewCache, target_width: u32) -> Self {
        Self {
            cache,
            target_width,
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(
            PreviewCache::new(&config.cache_dir, &config.file_prefix),
            config.target_width,
        )
    }

    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Number of pages in the document at `path`, optionally clearing the
    /// preview cache first. A failed clear does not fail the count.
    #[instrument(skip(self, renderer), fields(path = %path.display(), backend = renderer.backend_name()))]
    pub fn page_count(
        &self,
        renderer: &dyn PageRenderer,
        path: &Path,
        clear_cache: bool,
    ) -> Result<usize> {
        if clear_cache {
            if let Err(err) = self.cache.clear() {
                warn!(%err, "cache clear before page count failed");
            }
        }

        let document = open_existing(renderer, path)?;
        let count = document.page_count();
        info!(count, "page count read");
        Ok(count)
    }

    /// Render one page (1-based `page_number`, clamped into range) to a new
    /// PNG in the cache and return its absolute path.
    #[instrument(skip(self, renderer), fields(path = %path.display(), backend = renderer.backend_name()))]
    pub fn render_page(
        &self,
        renderer: &dyn PageRenderer,
        path: &Path,
        page_number: i64,
    ) -> Result<PathBuf> {
        let document = open_existing(renderer, path)?;
        let page_index = clamp_page_index(page_number, document.page_count())?;

        let page = document.open_page(page_index)?;
        let size = page.size();
        let (width, height) = target_dimensions(size, self.target_width)?;
        debug!(
            page_index,
            page_width = size.width,
            page_height = size.height,
            width,
            height,
            "rasterizing page"
        );

        let raster = page.render(width, height)?;
        let png = encode_png(&flatten_onto_white(&raster))?;
        let preview = self.cache.create_preview(path, page_index, &png)?;

        info!(page_index, preview = %preview.display(), "page rendered");
        Ok(preview)
    }

    /// Delete all previews; returns how many files were removed.
    pub fn clear_cache(&self) -> Result<usize> {
        self.cache.clear()
    }
}

/// Convert a caller's 1-based page number into a 0-based index, clamping
/// into `[1, page_count]` first.
pub fn clamp_page_index(page_number: i64, page_count: usize) -> Result<usize> {
    if page_count == 0 {
        return Err(PreviewError::EmptyDocument);
    }
    let last = i64::try_from(page_count).unwrap_or(i64::MAX);
    let clamped = page_number.clamp(1, last);
    Ok((clamped - 1) as usize)
}

fn open_existing<'a>(
    renderer: &'a dyn PageRenderer,
    path: &Path,
) -> Result<Box<dyn crate::renderer::RenderDocument + 'a>> {
    if !path.is_file() {
        return Err(PreviewError::DocumentOpen(format!(
            "no such file: {}",
            path.display()
        )));
    }
    renderer.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureRenderer, write_fixture_pdf};

    struct Fixture {
        _dir: tempfile::TempDir,
        pdf: PathBuf,
        cache_dir: PathBuf,
        service: PreviewService,
    }

    fn fixture(page_sizes: &[(f32, f32)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("report.pdf");
        write_fixture_pdf(&pdf, page_sizes).unwrap();
        let cache_dir = dir.path().join("cache");
        let service = PreviewService::new(
            PreviewCache::new(&cache_dir, "FlutterEasyPdfViewerPlugin"),
            2048,
        );
        Fixture {
            _dir: dir,
            pdf,
            cache_dir,
            service,
        }
    }

    #[test]
    fn clamp_rules() {
        assert_eq!(clamp_page_index(1, 5).unwrap(), 0);
        assert_eq!(clamp_page_index(5, 5).unwrap(), 4);
        assert_eq!(clamp_page_index(99, 5).unwrap(), 4);
        assert_eq!(clamp_page_index(0, 5).unwrap(), 0);
        assert_eq!(clamp_page_index(-3, 5).unwrap(), 0);
        assert!(matches!(
            clamp_page_index(1, 0),
            Err(PreviewError::EmptyDocument)
        ));
    }

    #[test]
    fn counts_pages() {
        let f = fixture(&[(612.0, 792.0); 7]);
        let count = f
            .service
            .page_count(&FixtureRenderer::default(), &f.pdf, false)
            .unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn count_with_clear_purges_previews_first() {
        let f = fixture(&[(612.0, 792.0), (612.0, 792.0)]);
        let renderer = FixtureRenderer::default();
        let preview = f.service.render_page(&renderer, &f.pdf, 1).unwrap();
        std::fs::write(f.cache_dir.join("unrelated.png"), b"x").unwrap();

        let count = f.service.page_count(&renderer, &f.pdf, true).unwrap();

        assert_eq!(count, 2);
        assert!(!preview.exists());
        assert!(f.cache_dir.join("unrelated.png").exists());
    }

    #[test]
    fn failed_clear_does_not_fail_count() {
        let f = fixture(&[(612.0, 792.0); 3]);
        std::fs::write(&f.cache_dir, b"not a directory").unwrap();

        assert!(f.service.clear_cache().is_err());
        let count = f
            .service
            .page_count(&FixtureRenderer::default(), &f.pdf, true)
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn renders_2048_wide_with_page_aspect() {
        let f = fixture(&[(612.0, 792.0)]);
        let preview = f
            .service
            .render_page(&FixtureRenderer::default(), &f.pdf, 1)
            .unwrap();

        let image = image::open(&preview).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (2048, 2650));
        // Transparent raster areas end up white, drawn content survives.
        assert_eq!(image.get_pixel(100, 1000).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(100, 0).0, [0, 0, 0]);
    }

    #[test]
    fn out_of_range_page_renders_last_page() {
        let f = fixture(&[(612.0, 792.0), (612.0, 792.0), (842.0, 595.0)]);
        let preview = f
            .service
            .render_page(&FixtureRenderer::default(), &f.pdf, 40)
            .unwrap();

        let name = preview.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("FlutterEasyPdfViewerPlugin-report-2-"), "{name}");
        let image = image::open(&preview).unwrap();
        assert_eq!((image.width(), image.height()), (2048, 1447));
    }

    #[test]
    fn preview_lands_in_cache_dir() {
        let f = fixture(&[(100.0, 100.0)]);
        let preview = f
            .service
            .render_page(&FixtureRenderer::default(), &f.pdf, 1)
            .unwrap();
        assert!(preview.is_absolute());
        assert_eq!(
            preview.parent().unwrap(),
            std::path::absolute(&f.cache_dir).unwrap()
        );
    }

    #[test]
    fn missing_file_fails_every_operation() {
        let f = fixture(&[(612.0, 792.0)]);
        let renderer = FixtureRenderer::default();
        let missing = f.pdf.with_file_name("missing.pdf");

        assert!(matches!(
            f.service.page_count(&renderer, &missing, false),
            Err(PreviewError::DocumentOpen(_))
        ));
        assert!(f.service.render_page(&renderer, &missing, 1).is_err());
        assert!(!f.cache_dir.exists());
    }

    #[test]
    fn corrupt_file_fails() {
        let f = fixture(&[(612.0, 792.0)]);
        std::fs::write(&f.pdf, b"not a pdf at all").unwrap();
        let renderer = FixtureRenderer::default();
        assert!(f.service.page_count(&renderer, &f.pdf, false).is_err());
        assert!(f.service.render_page(&renderer, &f.pdf, 1).is_err());
    }

    #[test]
    fn empty_document_cannot_render() {
        let f = fixture(&[]);
        let renderer = FixtureRenderer::default();
        assert_eq!(f.service.page_count(&renderer, &f.pdf, false).unwrap(), 0);
        assert!(matches!(
            f.service.render_page(&renderer, &f.pdf, 1),
            Err(PreviewError::EmptyDocument)
        ));
    }

    #[test]
    fn service_follows_config() {
        let mut config = PreviewConfig::with_cache_dir("/tmp/previews");
        config.target_width = 512;
        let service = PreviewService::from_config(&config);
        assert_eq!(service.target_width(), 512);
        assert_eq!(service.cache().dir(), Path::new("/tmp/previews"));
        assert_eq!(service.cache().prefix(), "FlutterEasyPdfViewerPlugin");
    }
}
