// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component identifiers, type tags, and dirty-property masks.
//!
//! Components here are *cache entries*, not the authoritative model — the
//! document engine owns truth. A [`Component`] exists locally only so the
//! widget layer has something stable to look up between ticks.
//!
//! # Dirty properties
//!
//! [`DirtyProps`] is the per-component change mask the engine reports each
//! tick. Unlike a layer tree that propagates dirtiness itself, this layer
//! only *consumes* already-flagged deltas, so a flat bitflags set is enough.
//! [`DirtyProps::CHILDREN`] is special: it marks a tree-shape delta that the
//! registry expands via the engine's children-changed list before any
//! property forwarding happens.

use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

/// Stable, engine-assigned component identifier.
///
/// Ids are engine-global and never reused within a document's lifetime.
/// Cloning is cheap (shared string).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    /// Creates an id from the engine's string form.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the engine's string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Local type tag for a component wrapper.
///
/// Determines which widget the host toolkit pairs with the component; this
/// layer only needs it to route text components through the measurement
/// cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Generic layout container.
    Container,
    /// Text run(s) measured through the text cache.
    Text,
    /// Bordered/background box.
    Frame,
    /// Bitmap or vector image content.
    Image,
    /// Scrollable viewport.
    Scrollable,
    /// Paged viewport.
    Pager,
    /// Audio/video content; participates in screen-lock computation.
    Media,
    /// Editable text field.
    EditField,
    /// Extension-rendered content.
    Extension,
    /// Type tag the engine reported but this build does not know.
    Unknown,
}

bitflags! {
    /// Set of properties the engine flagged as changed since the last sync.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyProps: u32 {
        /// Position or size changed.
        const BOUNDS = 1 << 0;
        /// Transform changed.
        const TRANSFORM = 1 << 1;
        /// Opacity changed.
        const OPACITY = 1 << 2;
        /// Display/visibility changed.
        const DISPLAY = 1 << 3;
        /// Text content or spans changed.
        const TEXT = 1 << 4;
        /// Non-text styling changed.
        const STYLE = 1 << 5;
        /// Media playback state changed.
        const MEDIA_STATE = 1 << 6;
        /// Accessibility attributes changed.
        const ACCESSIBILITY = 1 << 7;
        /// Vector graphic content changed.
        const GRAPHIC = 1 << 8;
        /// Tree-shape delta: the children-changed list must be consulted.
        const CHILDREN = 1 << 9;
    }
}

/// Locally cached component wrapper.
///
/// Owned exclusively by the registry; the widget layer holds only the id.
#[derive(Clone, Debug)]
pub struct Component {
    /// Engine-assigned identifier.
    pub id: ComponentId,
    /// Local type tag.
    pub component_type: ComponentType,
    /// Parent id, if the engine reported one.
    pub parent: Option<ComponentId>,
    /// Dirty flags accumulated since the widget layer last consumed them.
    pub dirty: DirtyProps,
}

impl Component {
    /// Creates a clean wrapper for a freshly materialized component.
    #[must_use]
    pub fn new(id: ComponentId, component_type: ComponentType, parent: Option<ComponentId>) -> Self {
        Self {
            id,
            component_type,
            parent,
            dirty: DirtyProps::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_content() {
        let a = ComponentId::new("1001");
        let b = ComponentId::new(String::from("1001"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "1001");
    }

    #[test]
    fn children_flag_is_disjoint_from_property_flags() {
        let dirty = DirtyProps::BOUNDS | DirtyProps::TEXT;
        assert!(!dirty.contains(DirtyProps::CHILDREN));
        assert!((dirty | DirtyProps::CHILDREN).contains(DirtyProps::CHILDREN));
    }
}
