// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The preview plugin: dispatches `getNumberOfPages`, `getPage` and
// `clearCacheDir` onto the preview worker and posts every outcome back to
// the caller's loop.
//
// Callers only ever see a value or null. Every error is logged here and
// collapsed to null before it leaves the worker.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use pdfpeek_core::error::{PreviewError, Result};
use pdfpeek_core::{CallId, Method, MethodCall, PreviewConfig};
use pdfpeek_render::{PageRenderer, PdfiumRenderer, PreviewService, RendererFactory};
use serde_json::{Number, Value};
use tracing::{Span, debug, error, info, info_span, warn};

use crate::looper::{LoopHandle, MainLoop};
use crate::traits::{CallOutcome, MethodCallHandler, MethodResult};
use crate::worker::{Job, PreviewWorker, WorkerContext};

/// Method-call handler backed by one lazily started worker thread.
pub struct PdfPreviewPlugin {
    service: Arc<PreviewService>,
    factory: RendererFactory,
    worker_name: String,
    worker: Mutex<Option<PreviewWorker>>,
}

impl PdfPreviewPlugin {
    /// A plugin rendering with PDFium, bound on the worker at first use.
    pub fn new(config: &PreviewConfig) -> Self {
        let library_dir = config.pdfium_library_dir.clone();
        let factory: RendererFactory = Arc::new(move || {
            PdfiumRenderer::bind(library_dir.as_deref())
                .map(|renderer| Box::new(renderer) as Box<dyn PageRenderer>)
        });
        Self::with_renderer(config, factory)
    }

    /// A plugin rendering with whatever `factory` builds.
    pub fn with_renderer(config: &PreviewConfig, factory: RendererFactory) -> Self {
        Self {
            service: Arc::new(PreviewService::from_config(config)),
            factory,
            worker_name: config.worker_thread_name.clone(),
            worker: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &PreviewService {
        &self.service
    }

    /// Whether the worker thread has been started yet.
    pub fn worker_started(&self) -> bool {
        self.worker
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Run one call to completion on a private loop and return its outcome.
    pub fn call_blocking(&self, call: MethodCall) -> CallOutcome {
        let main_loop = MainLoop::new();
        let slot: Arc<Mutex<Option<CallOutcome>>> = Arc::default();

        let sink = Arc::clone(&slot);
        let result: Box<dyn MethodResult> = Box::new(move |outcome: CallOutcome| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(outcome);
            }
        });
        self.on_method_call(call, result, main_loop.handle());

        main_loop.run_until(|| slot.lock().map(|s| s.is_some()).unwrap_or(true));
        slot.lock()
            .ok()
            .and_then(|mut s| s.take())
            .unwrap_or(CallOutcome::Success(None))
    }

    /// The worker, started under the lock on first use.
    fn running_worker(&self) -> Result<MutexGuard<'_, Option<PreviewWorker>>> {
        let mut slot = self
            .worker
            .lock()
            .map_err(|_| PreviewError::WorkerUnavailable)?;
        if slot.is_none() {
            *slot = Some(PreviewWorker::spawn(
                &self.worker_name,
                Arc::clone(&self.factory),
            )?);
        }
        Ok(slot)
    }
}

impl MethodCallHandler for PdfPreviewPlugin {
    fn on_method_call(&self, call: MethodCall, result: Box<dyn MethodResult>, caller: LoopHandle) {
        let call_id = CallId::new();
        let span = info_span!("method_call", %call_id, method = %call.method);
        // Shared with the job so a call the worker never receives can still
        // be answered here.
        let responder = Arc::new(Mutex::new(Some(Responder { result, caller })));

        let slot = match self.running_worker() {
            Ok(slot) => slot,
            Err(err) => {
                let _entered = span.enter();
                warn!(%err, "preview worker unavailable, answering null");
                respond_once(&responder, CallOutcome::Success(None));
                return;
            }
        };

        let service = Arc::clone(&self.service);
        let job_span = span.clone();
        let job_responder = Arc::clone(&responder);
        let job: Job = Box::new(move |context: &mut WorkerContext| {
            let _entered = job_span.enter();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                dispatch(&service, context, &call)
            }))
            .unwrap_or_else(|_| {
                error!("operation panicked, answering null");
                CallOutcome::Success(None)
            });
            respond_once(&job_responder, outcome);
        });

        let submitted = match slot.as_ref() {
            Some(worker) => worker.submit(job),
            None => Err(PreviewError::WorkerUnavailable),
        };
        drop(slot);
        if let Err(err) = submitted {
            let _entered = span.enter();
            error!(%err, "could not queue call, answering null");
            respond_once(&responder, CallOutcome::Success(None));
        }
    }
}

/// Answer through the shared responder unless it was already used.
fn respond_once(responder: &Mutex<Option<Responder>>, outcome: CallOutcome) {
    let taken = responder.lock().ok().and_then(|mut slot| slot.take());
    if let Some(responder) = taken {
        responder.respond(outcome);
    }
}

/// Completes one call's result on the caller's loop.
struct Responder {
    result: Box<dyn MethodResult>,
    caller: LoopHandle,
}

impl Responder {
    fn respond(self, outcome: CallOutcome) {
        let Responder { result, caller } = self;
        let span = Span::current();
        let task = Box::new(move || {
            let _entered = span.enter();
            outcome.deliver(result);
        });
        if let Err(err) = caller.post(task) {
            warn!(%err, "dropping result");
        }
    }
}

fn dispatch(service: &PreviewService, context: &mut WorkerContext, call: &MethodCall) -> CallOutcome {
    match call.parsed_method() {
        Method::GetNumberOfPages => {
            let count = or_null(get_number_of_pages(service, context, call));
            CallOutcome::Success(count.map(|count| Value::String(count.to_string())))
        }
        Method::GetPage => {
            let preview = or_null(get_page(service, context, call));
            CallOutcome::Success(
                preview.map(|path| Value::String(path.to_string_lossy().into_owned())),
            )
        }
        Method::ClearCacheDir => {
            let cleared = match service.clear_cache() {
                Ok(_) => true,
                Err(err) => {
                    warn!(%err, "cache clear failed");
                    false
                }
            };
            info!(cleared, "clearCacheDir finished");
            CallOutcome::Success(None)
        }
        Method::Unknown(name) => {
            debug!(method = %name, "method not implemented");
            CallOutcome::NotImplemented
        }
    }
}

fn get_number_of_pages(
    service: &PreviewService,
    context: &mut WorkerContext,
    call: &MethodCall,
) -> Result<usize> {
    let path: String = call.required_argument("filePath")?;
    let clear_cache = call.argument("clearCacheDir").unwrap_or(false);
    service.page_count(context.renderer()?, Path::new(&path), clear_cache)
}

fn get_page(
    service: &PreviewService,
    context: &mut WorkerContext,
    call: &MethodCall,
) -> Result<PathBuf> {
    let path: String = call.required_argument("filePath")?;
    let page_number = page_number_argument(call)?;
    service.render_page(context.renderer()?, Path::new(&path), page_number)
}

/// `pageNumber` as an `i64`. Integers past `i64::MAX` saturate so they
/// still clamp to the last page; fractional numbers are rejected.
fn page_number_argument(call: &MethodCall) -> Result<i64> {
    let number: Number = call.required_argument("pageNumber")?;
    if let Some(page_number) = number.as_i64() {
        return Ok(page_number);
    }
    if number.as_u64().is_some() {
        return Ok(i64::MAX);
    }
    Err(PreviewError::InvalidArgument(format!(
        "`pageNumber` must be an integer, got {number}"
    )))
}

fn or_null<T>(result: Result<T>) -> Option<T> {
    result
        .map_err(|err| warn!(%err, "operation failed, answering null"))
        .ok()
}
