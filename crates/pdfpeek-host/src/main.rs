// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpeek-host: drives the preview plugin from the command line.
//
// Reads one JSON method call per stdin line and writes one JSON reply per
// stdout line. Logs go to stderr.
//
//   pdfpeek-host [CONFIG.json]
//
//   > {"method": "getNumberOfPages", "arguments": {"filePath": "/tmp/a.pdf"}}
//   < {"result":"12"}

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use pdfpeek_core::error::Result;
use pdfpeek_core::{MethodCall, PreviewConfig};
use pdfpeek_plugin::{CallOutcome, PdfPreviewPlugin};
use serde_json::{Value, json};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match load_config(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(cache_dir = %config.cache_dir.display(), "pdfpeek host starting");

    let plugin = PdfPreviewPlugin::new(&config);
    let mut stdout = io::stdout().lock();

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(%err, "could not read stdin");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = handle_line(&plugin, &line);
        if let Err(err) = writeln!(stdout, "{reply}").and_then(|()| stdout.flush()) {
            error!(%err, "could not write reply");
            return ExitCode::FAILURE;
        }
    }

    info!("stdin closed, shutting down");
    ExitCode::SUCCESS
}

/// Defaults or the given file, then `PDFPEEK_*` overrides.
fn load_config(path: Option<String>) -> Result<PreviewConfig> {
    let config = match path {
        Some(path) => PreviewConfig::load(path)?,
        None => PreviewConfig::default(),
    }
    .apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn handle_line(plugin: &PdfPreviewPlugin, line: &str) -> Value {
    match serde_json::from_str::<MethodCall>(line) {
        Ok(call) => reply_for(plugin.call_blocking(call)),
        Err(err) => {
            warn!(%err, "unparseable request, answering null");
            json!({ "result": null })
        }
    }
}

fn reply_for(outcome: CallOutcome) -> Value {
    match outcome {
        CallOutcome::Success(value) => json!({ "result": value }),
        CallOutcome::NotImplemented => json!({ "notImplemented": true }),
    }
}
