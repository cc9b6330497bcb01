// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfpeek.
//
// Callers of the plugin only ever see a null/false result. These variants
// exist so the failure is logged with a cause before it is collapsed.

use thiserror::Error;

/// Top-level error type for all pdfpeek operations.
#[derive(Debug, Error)]
pub enum PreviewError {
    // -- Call errors --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Document errors --
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    #[error("document has no pages")]
    EmptyDocument,

    #[error("failed to open page {index}: {reason}")]
    PageOpen { index: usize, reason: String },

    #[error("page has unusable dimensions {width}x{height}")]
    DegeneratePage { width: f32, height: f32 },

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("image encoding failed: {0}")]
    Image(String),

    // -- Platform --
    #[error("page renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("preview worker is not running")]
    WorkerUnavailable,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PreviewError>;
