// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test support: a renderer that needs no native library, and a builder for
// small fixture PDFs.
//
// `FixtureRenderer` reads page geometry with `lopdf` and paints a
// deterministic raster: an opaque black top row over a fully transparent
// page, so compositing onto white is observable.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdfpeek_core::PageSize;
use pdfpeek_core::error::{PreviewError, Result};

use crate::renderer::{PageRenderer, RenderDocument, RenderPage, RendererFactory};

/// Counters shared between a test and the renderer it hands to a worker.
#[derive(Debug, Default)]
pub struct FixtureStats {
    pub renderers_built: AtomicUsize,
    pub documents_opened: AtomicUsize,
    pub pages_rendered: AtomicUsize,
    /// Name of the thread that performed each render, in order.
    pub render_threads: Mutex<Vec<String>>,
}

impl FixtureStats {
    pub fn renderers_built(&self) -> usize {
        self.renderers_built.load(Ordering::SeqCst)
    }

    pub fn documents_opened(&self) -> usize {
        self.documents_opened.load(Ordering::SeqCst)
    }

    pub fn pages_rendered(&self) -> usize {
        self.pages_rendered.load(Ordering::SeqCst)
    }

    pub fn render_threads(&self) -> Vec<String> {
        self.render_threads
            .lock()
            .map(|threads| threads.clone())
            .unwrap_or_default()
    }
}

/// Geometry-only renderer for tests.
#[derive(Debug, Default, Clone)]
pub struct FixtureRenderer {
    stats: Arc<FixtureStats>,
}

impl FixtureRenderer {
    pub fn new(stats: Arc<FixtureStats>) -> Self {
        Self { stats }
    }

    /// A factory that builds a fresh `FixtureRenderer` sharing `stats`.
    pub fn factory(stats: Arc<FixtureStats>) -> RendererFactory {
        Arc::new(move || {
            stats.renderers_built.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixtureRenderer::new(Arc::clone(&stats))) as Box<dyn PageRenderer>)
        })
    }
}

impl PageRenderer for FixtureRenderer {
    fn backend_name(&self) -> &str {
        "fixture"
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RenderDocument + 'a>> {
        let document = Document::load(path)
            .map_err(|e| PreviewError::DocumentOpen(format!("{}: {e}", path.display())))?;

        let pages = document
            .get_pages()
            .values()
            .map(|&page_id| media_box_size(&document, page_id))
            .collect::<Result<Vec<_>>>()?;

        self.stats.documents_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureDocument {
            pages,
            stats: &self.stats,
        }))
    }
}

struct FixtureDocument<'a> {
    pages: Vec<PageSize>,
    stats: &'a FixtureStats,
}

impl RenderDocument for FixtureDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn open_page<'p>(&'p self, index: usize) -> Result<Box<dyn RenderPage + 'p>> {
        let size = *self.pages.get(index).ok_or_else(|| PreviewError::PageOpen {
            index,
            reason: format!("document has {} pages", self.pages.len()),
        })?;
        Ok(Box::new(FixturePage {
            size,
            stats: self.stats,
        }))
    }
}

struct FixturePage<'a> {
    size: PageSize,
    stats: &'a FixtureStats,
}

impl RenderPage for FixturePage<'_> {
    fn size(&self) -> PageSize {
        self.size
    }

    fn render(&self, width: u32, height: u32) -> Result<RgbaImage> {
        let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        for x in 0..width {
            image.put_pixel(x, 0, Rgba([0, 0, 0, 255]));
        }

        self.stats.pages_rendered.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut threads) = self.stats.render_threads.lock() {
            let name = std::thread::current().name().unwrap_or("<unnamed>").to_string();
            threads.push(name);
        }
        Ok(image)
    }
}

/// Page size from /MediaBox, following /Parent for inherited boxes.
fn media_box_size(document: &Document, page_id: ObjectId) -> Result<PageSize> {
    let mut node = page_id;
    loop {
        let dict = document
            .get_object(node)
            .and_then(Object::as_dict)
            .map_err(|e| PreviewError::DocumentOpen(format!("bad page node: {e}")))?;

        if let Ok(media_box) = dict.get(b"MediaBox").and_then(Object::as_array) {
            let values: Vec<f32> = media_box.iter().filter_map(|v| v.as_float().ok()).collect();
            if let [llx, lly, urx, ury] = values[..] {
                return Ok(PageSize::new(urx - llx, ury - lly));
            }
        }

        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .map_err(|_| PreviewError::DocumentOpen("page has no /MediaBox".into()))?;
    }
}

/// Write a PDF with one empty page per `(width, height)` entry, in points.
pub fn write_fixture_pdf(path: &Path, page_sizes: &[(f32, f32)]) -> Result<()> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut kids = Vec::with_capacity(page_sizes.len());
    for &(width, height) in page_sizes {
        let content_id = document.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut file = std::fs::File::create(path)?;
    document
        .save_to(&mut file)
        .map_err(|e| PreviewError::Io(std::io::Error::other(e.to_string())))?;
    Ok(())
}
