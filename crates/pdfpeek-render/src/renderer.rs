// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the page renderer.
//
// The preview operations only talk to these traits. The production backend
// is PDFium (see `pdfium.rs`); tests plug in the fixture renderer.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use pdfpeek_core::PageSize;
use pdfpeek_core::error::Result;

/// Opens documents for rendering.
///
/// Renderers are built and used on the preview worker thread only, so no
/// `Send`/`Sync` bound is required here.
pub trait PageRenderer {
    /// Short backend name for logs (e.g. "pdfium").
    fn backend_name(&self) -> &str;

    /// Open a document read-only. The handle is released when dropped.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RenderDocument + 'a>>;
}

/// An open document.
pub trait RenderDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Open one page by 0-based index. The page closes when dropped.
    fn open_page<'p>(&'p self, index: usize) -> Result<Box<dyn RenderPage + 'p>>;
}

/// An open page.
pub trait RenderPage {
    /// Page dimensions in points.
    fn size(&self) -> PageSize;

    /// Rasterize the whole page into a `width` x `height` RGBA buffer at
    /// display quality.
    fn render(&self, width: u32, height: u32) -> Result<RgbaImage>;
}

/// Builds a renderer on the thread that will use it. Shared so a new
/// worker can be started with the same factory.
pub type RendererFactory = Arc<dyn Fn() -> Result<Box<dyn PageRenderer>> + Send + Sync>;
