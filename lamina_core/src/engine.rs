// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two seams of the synchronization layer.
//!
//! [`DocumentEngine`] is the opaque retained-mode engine: it owns document
//! state, runs its own layout passes, and reports changes as deltas when its
//! clock is advanced. [`WidgetLayer`] is the host toolkit's widget tree,
//! which the synchronizer drives from those deltas. Both are traits so the
//! harness can script them; production backends implement them over the real
//! engine binding and the real toolkit.
//!
//! The synchronizer is the only caller of either trait, and it calls both
//! exclusively from the UI thread.

use crate::component::{ComponentId, ComponentType, DirtyProps};
use crate::error::{EngineError, MeasureError};
use crate::text::{MeasureEnvelope, MeasuredSize, TextMeasuringInput};

/// Engine-assigned identifier for one outstanding asynchronous operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl core::fmt::Display for OperationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// What kind of host-side work an engine event requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Deliver a user-interaction event back into the document.
    SendEvent,
    /// Open an external URL.
    OpenUrl,
    /// Start, stop, or seek media playback.
    Media,
    /// Invoke a host extension.
    Extension,
    /// Fetch from a remote data source.
    DataSourceFetch,
}

/// One event drained from the engine after a clock advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineEvent {
    /// The operation this event belongs to.
    pub operation: OperationId,
    /// Requested host-side work.
    pub kind: EventKind,
}

/// Direction of one child-list change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildAction {
    /// The child subtree was inserted under the parent.
    Insert,
    /// The child subtree was removed from the parent.
    Remove,
}

/// A single entry in a component's child-list delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildChange {
    /// The child at the root of the changed subtree.
    pub child: ComponentId,
    /// Insert or remove.
    pub action: ChildAction,
}

/// What the engine reports when a component is materialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterializedComponent {
    /// Structural kind of the component.
    pub component_type: ComponentType,
    /// Parent in the document tree, `None` for the root.
    pub parent: Option<ComponentId>,
}

/// Synchronous text measurement, answered during engine layout passes.
///
/// The engine calls this re-entrantly from inside
/// [`DocumentEngine::advance_clock`]; implementations must not call back
/// into the engine.
pub trait MeasureText {
    /// Measures `input` within `envelope`.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError`] when the text cannot be shaped. The failure
    /// surfaces as a tick failure in the caller.
    fn measure(
        &mut self,
        input: &TextMeasuringInput,
        envelope: MeasureEnvelope,
    ) -> Result<MeasuredSize, MeasureError>;
}

/// The opaque retained-mode document engine.
///
/// The synchronizer never inspects document state directly; everything it
/// learns arrives through the delta queries below, and only after
/// [`advance_clock`](Self::advance_clock) has run for the current tick.
pub trait DocumentEngine {
    /// The root component of the current document, if one is loaded.
    fn root(&self) -> Option<ComponentId>;

    /// Document time the engine believes has elapsed, in milliseconds.
    ///
    /// Used once, on the first tick, to fix the loop start so that a
    /// re-attached document resumes rather than rewinds.
    fn reported_elapsed_ms(&self) -> f64;

    /// Advances the document clock and runs the engine's internal layout.
    ///
    /// `measurer` answers the engine's synchronous text-measure callbacks
    /// for the duration of the call.
    ///
    /// # Errors
    ///
    /// Engine-side failures are tick-fatal for the caller.
    fn advance_clock(
        &mut self,
        elapsed_ms: f64,
        wall_clock_ms: f64,
        measurer: &mut dyn MeasureText,
    ) -> Result<(), EngineError>;

    /// Drains the operations the engine has resolved since the last call.
    fn flush_pending(&mut self) -> Vec<OperationId>;

    /// Drains the per-component dirty deltas accumulated by the last clock
    /// advance.
    fn dirty_components(&mut self) -> Vec<(ComponentId, DirtyProps)>;

    /// Drains events requesting host-side work.
    fn take_events(&mut self) -> Vec<EngineEvent>;

    /// Child-list changes for a component whose delta includes
    /// [`DirtyProps::CHILDREN`].
    fn children_changed(&mut self, id: &ComponentId) -> Vec<ChildChange>;

    /// The current live children of a component, in document order.
    fn live_children(&self, id: &ComponentId) -> Vec<ComponentId>;

    /// Resolves a component's type and parent so the host can build a
    /// widget for it.
    ///
    /// # Errors
    ///
    /// Fails when the id is unknown to the engine or the component cannot
    /// be realized.
    fn materialize(&mut self, id: &ComponentId) -> Result<MaterializedComponent, EngineError>;

    /// Dispatches one drained event back into the engine for execution.
    ///
    /// # Errors
    ///
    /// Dispatch failures are tick-fatal; a half-dispatched event batch must
    /// not be silently dropped.
    fn dispatch_event(&mut self, event: &EngineEvent) -> Result<(), EngineError>;

    /// Whether the document currently asks the host to inhibit screen lock.
    fn screen_lock_required(&self) -> bool;

    /// Whether any media component is currently playing.
    fn media_playing(&self) -> bool;

    /// Drains the most recent data-source failure message, if one occurred.
    fn take_data_source_error(&mut self) -> Option<String>;

    /// Whether the visual context changed since it was last serialized.
    fn visual_context_dirty(&self) -> bool;

    /// Serializes the current visual context for host-side consumers.
    fn serialize_visual_context(&mut self) -> String;

    /// Whether the data-source context changed since last serialized.
    fn data_source_context_dirty(&self) -> bool;

    /// Serializes the current data-source context.
    fn serialize_data_source_context(&mut self) -> String;

    /// Forces a full relayout on the next clock advance (scale changes).
    fn request_relayout(&mut self);
}

/// The host toolkit's widget tree, driven by synchronizer callbacks.
///
/// All callbacks arrive on the UI thread, in delta order, after the
/// originating tick's clock advance has completed.
pub trait WidgetLayer {
    /// Non-structural properties of a materialized component changed.
    fn on_component_properties_changed(&mut self, id: &ComponentId, dirty: DirtyProps);

    /// A subtree rooted at `id` was inserted and fully materialized.
    fn on_component_subtree_inserted(&mut self, id: &ComponentId);

    /// A previously materialized component was removed with its subtree.
    fn on_component_subtree_removed(&mut self, id: &ComponentId);

    /// The document's keep-awake requirement toggled.
    fn on_screen_lock_changed(&mut self, required: bool);

    /// A fresh visual-context serialization is available.
    fn on_visual_context_updated(&mut self, context: &str);

    /// A fresh data-source-context serialization is available.
    fn on_data_source_context_updated(&mut self, context: &str);

    /// A data-source fetch failed; the host may surface or log it.
    fn on_data_source_error(&mut self, message: &str);
}
