// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpeek-render: page rendering for the pdfpeek preview handler.
//
// Provides the page-renderer abstraction and its PDFium backend, the raster
// helpers (sizing, white compositing, PNG encoding), the preview cache
// directory, and the three preview operations built on top of them.

pub mod cache;
pub mod pdfium;
pub mod preview;
pub mod raster;
pub mod renderer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export the primary structs so callers can use `pdfpeek_render::PreviewService` etc.
pub use cache::PreviewCache;
pub use pdfium::PdfiumRenderer;
pub use preview::PreviewService;
pub use renderer::{PageRenderer, RenderDocument, RenderPage, RendererFactory};
