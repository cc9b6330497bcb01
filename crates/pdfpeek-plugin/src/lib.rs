// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpeek-plugin: receives method calls from a host, runs them on one
// background worker, and posts each result back to the caller's loop.

pub mod looper;
pub mod plugin;
pub mod traits;
pub mod worker;

pub use looper::{LoopClosed, LoopHandle, MainLoop};
pub use plugin::PdfPreviewPlugin;
pub use traits::{CallOutcome, MethodCallHandler, MethodResult};
