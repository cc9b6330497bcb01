// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium page renderer.
//
// PDFium is bound at runtime from a shared library, so the crate builds on
// every target and fails per request when the library is missing.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use pdfium_render::prelude::*;
use pdfpeek_core::PageSize;
use pdfpeek_core::error::{PreviewError, Result};
use tracing::{debug, info, instrument};

use crate::renderer::{PageRenderer, RenderDocument, RenderPage};

/// Renderer backed by a bound PDFium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind PDFium, trying `library_dir` first, then the default search
    /// paths, then the system library.
    #[instrument(skip_all)]
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        for dir in library_search_paths(library_dir) {
            let lib_path = Pdfium::pdfium_platform_library_name_at_path(&dir);
            debug!(path = %Path::new(&lib_path).display(), "trying pdfium");

            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                info!(dir = %dir.display(), "pdfium bound");
                return Ok(Self {
                    pdfium: Pdfium::new(bindings),
                });
            }
        }

        debug!("trying system pdfium");
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| PreviewError::RendererUnavailable(format!("pdfium not found: {e}")))?;
        info!("system pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn backend_name(&self) -> &str {
        "pdfium"
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RenderDocument + 'a>> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| PreviewError::DocumentOpen(format!("{}: {e}", path.display())))?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl RenderDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        usize::from(self.document.pages().len())
    }

    fn open_page<'p>(&'p self, index: usize) -> Result<Box<dyn RenderPage + 'p>> {
        let page_index = PdfPageIndex::try_from(index).map_err(|_| PreviewError::PageOpen {
            index,
            reason: "index exceeds pdfium page range".into(),
        })?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| PreviewError::PageOpen {
                index,
                reason: e.to_string(),
            })?;
        Ok(Box::new(PdfiumPage { page }))
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
}

impl RenderPage for PdfiumPage<'_> {
    fn size(&self) -> PageSize {
        PageSize::new(self.page.width().value, self.page.height().value)
    }

    fn render(&self, width: u32, height: u32) -> Result<RgbaImage> {
        let target_width = i32::try_from(width)
            .map_err(|_| PreviewError::Render(format!("width {width} too large")))?;
        let target_height = i32::try_from(height)
            .map_err(|_| PreviewError::Render(format!("height {height} too large")))?;

        let config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height)
            .set_clear_color(PdfColor::WHITE)
            .render_form_data(true)
            .use_print_quality(false);

        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(|e| PreviewError::Render(e.to_string()))?;

        let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
        RgbaImage::from_raw(w, h, bitmap.as_rgba_bytes())
            .ok_or_else(|| PreviewError::Render(format!("bitmap buffer does not match {w}x{h}")))
    }
}

/// Directories searched for the PDFium shared library, in order.
fn library_search_paths(library_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = library_dir {
        paths.push(dir.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_dir_is_searched_first() {
        let paths = library_search_paths(Some(Path::new("/opt/pdfium/lib")));
        assert_eq!(paths[0], PathBuf::from("/opt/pdfium/lib"));
        assert_eq!(paths.last(), Some(&PathBuf::from("./")));
    }

    #[test]
    fn default_search_ends_with_working_dir() {
        let paths = library_search_paths(None);
        assert!(paths.contains(&PathBuf::from("libs")));
        assert_eq!(paths.last(), Some(&PathBuf::from("./")));
    }

    /// Needs a PDFium shared library on the search path.
    #[test]
    #[ignore]
    fn renders_fixture_with_real_pdfium() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("letter.pdf");
        crate::testing::write_fixture_pdf(&pdf, &[(612.0, 792.0), (792.0, 612.0)]).unwrap();

        let renderer = PdfiumRenderer::bind(None).expect("pdfium library");
        let document = renderer.open(&pdf).unwrap();
        assert_eq!(document.page_count(), 2);

        let page = document.open_page(1).unwrap();
        let size = page.size();
        assert!((size.width - 792.0).abs() < 0.5);

        let image = page.render(400, 309).unwrap();
        assert_eq!(image.dimensions(), (400, 309));
    }
}
