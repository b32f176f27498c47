// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking of in-flight asynchronous operations.
//!
//! Every event the engine emits names an [`OperationId`]; the host performs
//! the work and the engine later reports the id resolved through its
//! flush-pending list. [`PendingOperationSet`] holds the ids in between, so
//! teardown can cancel everything still outstanding and resolution of an
//! id that was never registered (or already resolved) is detectable.

use std::collections::HashMap;

use crate::engine::{EventKind, OperationId};

/// One operation awaiting resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingOperation {
    /// Engine-assigned id.
    pub id: OperationId,
    /// What kind of work the operation requested.
    pub kind: EventKind,
}

/// The set of operations dispatched but not yet resolved.
#[derive(Debug, Default)]
pub struct PendingOperationSet {
    pending: HashMap<OperationId, PendingOperation>,
    resolved: u64,
    cancelled: u64,
}

impl PendingOperationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation at dispatch time.
    ///
    /// Ids are engine-unique; a duplicate registration indicates a
    /// double-dispatch upstream.
    pub fn register(&mut self, id: OperationId, kind: EventKind) {
        let previous = self.pending.insert(id, PendingOperation { id, kind });
        debug_assert!(previous.is_none(), "operation {id} dispatched twice");
    }

    /// Marks an operation resolved. Returns whether it was outstanding;
    /// `false` means a stale or duplicate resolution, which is logged and
    /// otherwise ignored.
    pub fn resolve(&mut self, id: OperationId) -> bool {
        if self.pending.remove(&id).is_some() {
            self.resolved += 1;
            true
        } else {
            tracing::debug!(%id, "resolution for operation not in flight");
            false
        }
    }

    /// Cancels everything still outstanding. Returns how many operations
    /// were dropped. Used at document teardown; cancelled operations never
    /// resolve.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.cancelled += dropped as u64;
        self.pending.clear();
        dropped
    }

    /// Number of operations in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total operations resolved over the set's lifetime.
    #[must_use]
    pub fn resolved_count(&self) -> u64 {
        self.resolved
    }

    /// Total operations cancelled over the set's lifetime.
    #[must_use]
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_removes_exactly_once() {
        let mut set = PendingOperationSet::new();
        set.register(OperationId(1), EventKind::OpenUrl);
        set.register(OperationId(2), EventKind::DataSourceFetch);
        assert_eq!(set.len(), 2);

        assert!(set.resolve(OperationId(1)));
        assert!(!set.resolve(OperationId(1)), "second resolution is stale");
        assert_eq!(set.len(), 1);
        assert_eq!(set.resolved_count(), 1);
    }

    #[test]
    fn unknown_resolution_is_ignored() {
        let mut set = PendingOperationSet::new();
        assert!(!set.resolve(OperationId(99)));
        assert_eq!(set.resolved_count(), 0);
    }

    #[test]
    fn cancel_all_drops_everything() {
        let mut set = PendingOperationSet::new();
        set.register(OperationId(1), EventKind::Media);
        set.register(OperationId(2), EventKind::Extension);
        assert_eq!(set.cancel_all(), 2);
        assert!(set.is_empty());
        assert_eq!(set.cancelled_count(), 2);
        assert!(!set.resolve(OperationId(1)), "cancelled operations never resolve");
    }
}
