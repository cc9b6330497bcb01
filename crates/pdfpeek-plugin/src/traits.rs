// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-facing trait definitions for the method channel.
//
// A host hands the plugin a `MethodCall`, a one-shot `MethodResult` and a
// handle to the loop the result must be delivered on.

use pdfpeek_core::MethodCall;
use serde_json::Value;

use crate::looper::LoopHandle;

/// What a call finally resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The operation ran. `None` is the null result every failure maps to.
    Success(Option<Value>),
    /// The method name is not one this plugin handles.
    NotImplemented,
}

impl CallOutcome {
    /// The success payload, if this is a non-null success.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => value.as_ref(),
            Self::NotImplemented => None,
        }
    }

    /// Complete `result` with this outcome.
    pub(crate) fn deliver(self, result: Box<dyn MethodResult>) {
        match self {
            Self::Success(value) => result.success(value),
            Self::NotImplemented => result.not_implemented(),
        }
    }
}

/// Receiver for exactly one call's outcome.
///
/// Methods take `self: Box<Self>` so a result can be completed only once.
pub trait MethodResult: Send {
    fn success(self: Box<Self>, value: Option<Value>);

    fn not_implemented(self: Box<Self>);
}

impl<F> MethodResult for F
where
    F: FnOnce(CallOutcome) + Send,
{
    fn success(self: Box<Self>, value: Option<Value>) {
        (*self)(CallOutcome::Success(value))
    }

    fn not_implemented(self: Box<Self>) {
        (*self)(CallOutcome::NotImplemented)
    }
}

/// Anything that can answer method calls.
pub trait MethodCallHandler {
    /// Start handling `call`. Returns immediately; `result` is completed
    /// later by a task posted to `caller`.
    fn on_method_call(&self, call: MethodCall, result: Box<dyn MethodResult>, caller: LoopHandle);
}
