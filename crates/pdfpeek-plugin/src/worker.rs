// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The preview worker: one named background thread running jobs in FIFO
// order. The page renderer lives on this thread only and is built on first
// use from the factory.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use pdfpeek_core::error::{PreviewError, Result};
use pdfpeek_render::{PageRenderer, RendererFactory};
use tracing::{debug, error, info, warn};

/// A job run on the worker thread with access to its renderer.
pub type Job = Box<dyn FnOnce(&mut WorkerContext) + Send>;

/// State owned by the worker thread.
pub struct WorkerContext {
    factory: RendererFactory,
    renderer: Option<Box<dyn PageRenderer>>,
}

impl WorkerContext {
    fn new(factory: RendererFactory) -> Self {
        Self {
            factory,
            renderer: None,
        }
    }

    /// The worker's renderer, building it if this is the first request or
    /// an earlier build failed.
    pub fn renderer(&mut self) -> Result<&dyn PageRenderer> {
        if self.renderer.is_none() {
            let renderer = (self.factory)()?;
            info!(backend = renderer.backend_name(), "renderer ready");
            self.renderer = Some(renderer);
        }
        self.renderer
            .as_deref()
            .ok_or_else(|| PreviewError::RendererUnavailable("renderer not built".into()))
    }
}

/// Handle to the running worker thread.
///
/// Dropping it closes the job queue and waits for queued jobs to finish.
pub struct PreviewWorker {
    name: String,
    sender: Option<Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl PreviewWorker {
    /// Start the worker thread.
    pub fn spawn(name: &str, factory: RendererFactory) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();

        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut context = WorkerContext::new(factory);
                for job in receiver {
                    if panic::catch_unwind(AssertUnwindSafe(|| job(&mut context))).is_err() {
                        error!("preview job panicked");
                    }
                }
                debug!("job queue closed, worker exiting");
            })?;

        info!(thread = name, "preview worker started");
        Ok(Self {
            name: name.to_string(),
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// A worker whose thread has already gone, so every submit fails.
    #[cfg(test)]
    pub(crate) fn stopped(name: &str) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        drop(receiver);
        Self {
            name: name.to_string(),
            sender: Some(sender),
            thread: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job behind every job already submitted.
    pub fn submit(&self, job: Job) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or(PreviewError::WorkerUnavailable)?
            .send(job)
            .map_err(|_| PreviewError::WorkerUnavailable)
    }
}

impl Drop for PreviewWorker {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            if std::thread::current().id() == thread.thread().id() {
                warn!(thread = %self.name, "worker dropped from its own thread, not joining");
                return;
            }
            if thread.join().is_err() {
                error!(thread = %self.name, "preview worker exited abnormally");
            }
        }
    }
}
