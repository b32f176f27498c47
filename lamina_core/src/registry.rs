// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side mirror of which engine components have widgets.
//!
//! [`ComponentRegistry`] tracks every component the host has materialized,
//! keyed by [`ComponentId`]. It is the dedup point: the engine may report a
//! component in several deltas per tick, and the same subtree can surface
//! through both an insert delta and a later property delta, but a widget is
//! built exactly once per live component.
//!
//! Removal leaves a tombstone. Deltas can reference a component in the same
//! batch that removes it, and a stale id must neither rebuild a widget nor
//! fail the tick, so tombstoned ids are dropped silently by
//! [`apply_delta`](ComponentRegistry::apply_delta). Tombstones live until
//! the document is torn down or the id is explicitly re-inserted.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::component::{Component, ComponentId, DirtyProps};
use crate::engine::{ChildAction, DocumentEngine, WidgetLayer};
use crate::error::EngineError;

/// Registry of materialized components for one document.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: HashMap<ComponentId, Component>,
    tombstones: HashSet<ComponentId>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `id` is materialized, asking the engine for its type and
    /// parent if the host has not seen it before. Returns whether a new
    /// component was built.
    ///
    /// # Errors
    ///
    /// Fails for tombstoned ids and when the engine cannot materialize the
    /// component.
    pub fn get_or_build<E: DocumentEngine + ?Sized>(
        &mut self,
        id: &ComponentId,
        engine: &mut E,
    ) -> Result<bool, EngineError> {
        if self.tombstones.contains(id) {
            return Err(EngineError::UnknownComponent(id.clone()));
        }
        if self.components.contains_key(id) {
            return Ok(false);
        }
        let materialized = engine.materialize(id)?;
        self.components.insert(
            id.clone(),
            Component::new(id.clone(), materialized.component_type, materialized.parent),
        );
        Ok(true)
    }

    /// Applies one dirty delta: structural child changes first, then the
    /// property notification for whatever else changed.
    ///
    /// Deltas for tombstoned components are dropped without error; removal
    /// and a trailing property delta for the same id can share a batch.
    ///
    /// # Errors
    ///
    /// Propagates engine materialization failures. A failed delta is
    /// tick-fatal for the caller.
    pub fn apply_delta<E, W>(
        &mut self,
        id: &ComponentId,
        dirty: DirtyProps,
        engine: &mut E,
        widgets: &mut W,
    ) -> Result<(), EngineError>
    where
        E: DocumentEngine + ?Sized,
        W: WidgetLayer + ?Sized,
    {
        if self.tombstones.contains(id) {
            tracing::trace!(component = %id, "delta for removed component dropped");
            return Ok(());
        }
        self.get_or_build(id, engine)?;

        if dirty.contains(DirtyProps::CHILDREN) {
            for change in engine.children_changed(id) {
                match change.action {
                    ChildAction::Insert => {
                        // An explicit insert resurrects a recycled id.
                        self.tombstones.remove(&change.child);
                        let built = self.build_subtree(&change.child, engine)?;
                        tracing::debug!(
                            root = %change.child,
                            built,
                            "subtree inserted"
                        );
                        widgets.on_component_subtree_inserted(&change.child);
                    }
                    ChildAction::Remove => {
                        if self.evict_subtree(&change.child, engine) {
                            widgets.on_component_subtree_removed(&change.child);
                        }
                    }
                }
            }
        }

        let props = dirty.difference(DirtyProps::CHILDREN);
        if !props.is_empty() {
            widgets.on_component_properties_changed(id, props);
        }
        Ok(())
    }

    /// Materializes `root` and every live descendant, breadth-first.
    /// Components already known are revisited (their children may be new)
    /// but not rebuilt. Returns how many components were newly built.
    fn build_subtree<E: DocumentEngine + ?Sized>(
        &mut self,
        root: &ComponentId,
        engine: &mut E,
    ) -> Result<usize, EngineError> {
        let mut built = 0;
        let mut queue = VecDeque::new();
        queue.push_back(root.clone());
        while let Some(id) = queue.pop_front() {
            if self.get_or_build(&id, engine)? {
                built += 1;
            }
            queue.extend(engine.live_children(&id));
        }
        Ok(built)
    }

    /// Evicts `root` and every descendant, breadth-first over the engine's
    /// live child listing, so children that were never locally materialized
    /// are evicted (tombstoned) too. Engines that drop the subtree from
    /// their listing before reporting the delta are covered by a second
    /// sweep over the local mirror's parent links. Returns whether `root`
    /// itself was materialized, which decides whether the widget layer is
    /// told.
    fn evict_subtree<E: DocumentEngine + ?Sized>(
        &mut self,
        root: &ComponentId,
        engine: &E,
    ) -> bool {
        let mut doomed = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(root.clone());
        while let Some(id) = queue.pop_front() {
            queue.extend(engine.live_children(&id));
            doomed.push(id);
        }
        doomed.extend(
            self.components
                .keys()
                .filter(|candidate| self.in_subtree(candidate, root))
                .cloned(),
        );

        let root_was_known = self.components.contains_key(root);
        for id in &doomed {
            self.components.remove(id);
            self.tombstones.insert(id.clone());
        }
        root_was_known
    }

    /// Whether `id`'s parent chain (in the host mirror) reaches `root`.
    fn in_subtree(&self, id: &ComponentId, root: &ComponentId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == root {
                return true;
            }
            current = self.components.get(c).and_then(|comp| comp.parent.as_ref());
        }
        false
    }

    /// Looks up a materialized component.
    #[must_use]
    pub fn get(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Whether `id` is currently materialized.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.components.contains_key(id)
    }

    /// Number of materialized components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether nothing is materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Tears down all state, tombstones included. A fresh document
    /// generation starts with a clean id space.
    pub fn clear(&mut self) {
        self.components.clear();
        self.tombstones.clear();
    }
}
