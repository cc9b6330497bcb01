// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-side task loop.
//
// The thread that owns a `MainLoop` is the only one that runs its tasks.
// Other threads reach it through a cloneable `LoopHandle`.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

/// A unit of work posted to a loop.
pub type Task = Box<dyn FnOnce() + Send>;

/// Returned when posting to a loop that has been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("caller loop has shut down")]
pub struct LoopClosed;

/// Task queue drained by the thread that owns it.
pub struct MainLoop {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl MainLoop {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// A handle other threads can post tasks through.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            sender: self.sender.clone(),
        }
    }

    /// Run every task already queued without waiting for more. Returns the
    /// number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "loop drained");
        }
        ran
    }

    /// Block running tasks until `done` reports true. `done` is checked
    /// before waiting and after every task.
    pub fn run_until(&self, mut done: impl FnMut() -> bool) {
        while !done() {
            // The loop holds a sender itself, so `recv` only returns once a
            // task arrives.
            match self.receiver.recv() {
                Ok(task) => task(),
                Err(_) => return,
            }
        }
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending side of a [`MainLoop`].
#[derive(Clone)]
pub struct LoopHandle {
    sender: Sender<Task>,
}

impl LoopHandle {
    /// Queue `task` to run on the loop's thread.
    pub fn post(&self, task: Task) -> Result<(), LoopClosed> {
        self.sender.send(task).map_err(|_| LoopClosed)
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle").finish_non_exhaustive()
    }
}
