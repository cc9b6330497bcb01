// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpeek-core: types and errors shared by every pdfpeek crate, plus configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::PreviewConfig;
pub use error::PreviewError;
pub use types::*;
