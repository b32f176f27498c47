// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cross-thread work queue into the UI-thread tick.
//!
//! The engine and the document state are single-threaded; everything else
//! (network completions, media callbacks, host extensions) is not. Work from
//! those threads enters as a closure posted through a [`WorkHandle`] and
//! runs at the top of the next tick, on the UI thread, with exclusive access
//! to the engine. The queue is the *only* cross-thread structure in the
//! crate.
//!
//! Tasks run in post order. A drain takes a snapshot of the queue length
//! first, so a task that posts follow-up work schedules it for the next
//! tick rather than extending the current one.

use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// A unit of work executed on the UI thread with the engine borrowed
/// mutably.
pub type Task<E> = Box<dyn FnOnce(&mut E) + Send>;

/// Receiving side of the work queue. Owned by the synchronizer; drained
/// only on the thread that created it.
#[derive(Debug)]
pub struct WorkQueue<E> {
    tx: Sender<Task<E>>,
    rx: Receiver<Task<E>>,
    owner: ThreadId,
}

impl<E> Default for WorkQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> WorkQueue<E> {
    /// Creates a queue owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            owner: thread::current().id(),
        }
    }

    /// Returns a cloneable posting handle for other threads.
    #[must_use]
    pub fn handle(&self) -> WorkHandle<E> {
        WorkHandle {
            tx: self.tx.clone(),
        }
    }

    /// Runs every task posted before this call, in post order, and returns
    /// how many ran. Tasks posted while draining wait for the next drain.
    ///
    /// Must be called on the owning thread.
    pub fn drain(&self, engine: &mut E) -> usize {
        if thread::current().id() != self.owner {
            debug_assert!(false, "work queue drained off its owning thread");
            tracing::error!("work queue drained off its owning thread; tasks deferred");
            return 0;
        }
        let batch = self.rx.len();
        let mut ran = 0;
        for _ in 0..batch {
            match self.rx.try_recv() {
                Ok(task) => {
                    task(engine);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Discards all queued tasks without running them. Returns how many
    /// were dropped. Used at document teardown.
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }

    /// Number of tasks currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no tasks are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Cloneable, `Send` posting side of a [`WorkQueue`].
#[derive(Debug)]
pub struct WorkHandle<E> {
    tx: Sender<Task<E>>,
}

impl<E> Clone for WorkHandle<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> WorkHandle<E> {
    /// Posts a task for the next tick. Returns `false` when the document
    /// has been torn down and the task will never run.
    pub fn post(&self, task: impl FnOnce(&mut E) + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }
}
