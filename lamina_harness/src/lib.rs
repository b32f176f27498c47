// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable collaborators for exercising the frame loop end to end.
//!
//! [`ScriptedEngine`] is a [`DocumentEngine`] whose deltas, events, and
//! measure requests are staged by the test between ticks. It records every
//! call the synchronizer makes, so tests can assert on ordering and
//! idempotence rather than just final state. [`RecordingWidgetLayer`] logs
//! widget callbacks the same way.
//!
//! Both push into a shared [`EventLog`], giving tests a single interleaved
//! sequence across the engine and the widget layer.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use lamina_core::component::{ComponentId, ComponentType, DirtyProps};
use lamina_core::engine::{
    ChildAction, ChildChange, DocumentEngine, EngineEvent, EventKind, MaterializedComponent,
    MeasureText, OperationId, WidgetLayer,
};
use lamina_core::error::EngineError;
use lamina_core::text::{MeasureEnvelope, MeasuredSize, TextMeasuringInput};
use lamina_core::time::{DurationNs, TimeSource, Timestamp};

/// Shared, cloneable call log ordered across all collaborators.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// Snapshot of all entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Index of the first entry equal to `entry`, if present.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }
}

/// Hand-driven [`TimeSource`] whose reading is shared with the test.
///
/// The synchronizer takes the clock by value; tests keep a clone and move
/// time between ticks.
#[derive(Clone, Debug, Default)]
pub struct SharedClock(Rc<Cell<u64>>);

impl SharedClock {
    /// Creates a clock reading `start` nanoseconds.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    /// Sets the current reading.
    pub fn set(&self, nanos: u64) {
        self.0.set(nanos);
    }

    /// Advances the current reading.
    pub fn advance(&self, by: DurationNs) {
        self.0.set(self.0.get() + by.nanos());
    }
}

impl TimeSource for SharedClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.get())
    }
}

/// A typed widget callback, as recorded by [`RecordingWidgetLayer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetCall {
    /// Properties changed on a materialized component.
    Props(ComponentId, DirtyProps),
    /// A subtree was inserted.
    Inserted(ComponentId),
    /// A subtree was removed.
    Removed(ComponentId),
    /// Keep-awake toggled.
    ScreenLock(bool),
    /// Visual context pushed.
    VisualContext(String),
    /// Data-source context pushed.
    DataSourceContext(String),
    /// Data-source error forwarded.
    DataSourceError(String),
}

/// [`WidgetLayer`] that records every callback.
#[derive(Debug, Default)]
pub struct RecordingWidgetLayer {
    calls: Vec<WidgetCall>,
    log: EventLog,
}

impl RecordingWidgetLayer {
    /// Creates a recorder sharing `log`.
    #[must_use]
    pub fn new(log: EventLog) -> Self {
        Self {
            calls: Vec::new(),
            log,
        }
    }

    /// All recorded calls, in order.
    #[must_use]
    pub fn calls(&self) -> &[WidgetCall] {
        &self.calls
    }

    /// Calls matching `filter`, in order.
    pub fn calls_where(&self, filter: impl Fn(&WidgetCall) -> bool) -> Vec<WidgetCall> {
        self.calls.iter().filter(|c| filter(c)).cloned().collect()
    }
}

impl WidgetLayer for RecordingWidgetLayer {
    fn on_component_properties_changed(&mut self, id: &ComponentId, dirty: DirtyProps) {
        self.log.push(format!("widget: props {id}"));
        self.calls.push(WidgetCall::Props(id.clone(), dirty));
    }

    fn on_component_subtree_inserted(&mut self, id: &ComponentId) {
        self.log.push(format!("widget: inserted {id}"));
        self.calls.push(WidgetCall::Inserted(id.clone()));
    }

    fn on_component_subtree_removed(&mut self, id: &ComponentId) {
        self.log.push(format!("widget: removed {id}"));
        self.calls.push(WidgetCall::Removed(id.clone()));
    }

    fn on_screen_lock_changed(&mut self, required: bool) {
        self.log.push(format!("widget: screen-lock {required}"));
        self.calls.push(WidgetCall::ScreenLock(required));
    }

    fn on_visual_context_updated(&mut self, context: &str) {
        self.log.push("widget: visual-context");
        self.calls.push(WidgetCall::VisualContext(context.to_owned()));
    }

    fn on_data_source_context_updated(&mut self, context: &str) {
        self.log.push("widget: data-source-context");
        self.calls
            .push(WidgetCall::DataSourceContext(context.to_owned()));
    }

    fn on_data_source_error(&mut self, message: &str) {
        self.log.push("widget: data-source-error");
        self.calls.push(WidgetCall::DataSourceError(message.to_owned()));
    }
}

/// Scriptable [`DocumentEngine`] whose behavior is staged between ticks.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    log: EventLog,
    root: Option<ComponentId>,
    reported_elapsed_ms: f64,
    children: HashMap<ComponentId, Vec<ComponentId>>,
    parents: HashMap<ComponentId, ComponentId>,
    types: HashMap<ComponentId, ComponentType>,
    child_changes: HashMap<ComponentId, Vec<ChildChange>>,
    dirty: Vec<(ComponentId, DirtyProps)>,
    events: Vec<EngineEvent>,
    resolutions: Vec<OperationId>,
    repeat_measures: Vec<(TextMeasuringInput, MeasureEnvelope)>,
    measured: Vec<MeasuredSize>,
    advances: Vec<f64>,
    dispatched: Vec<EngineEvent>,
    materialized: Vec<ComponentId>,
    fail_next_advance: Option<String>,
    screen_lock: bool,
    media: bool,
    data_source_error: Option<String>,
    visual_context: Option<String>,
    data_source_context: Option<String>,
    relayouts: u32,
}

impl ScriptedEngine {
    /// Creates an engine with a root component named `root`, sharing `log`.
    #[must_use]
    pub fn new(log: EventLog) -> Self {
        let mut engine = Self {
            log,
            root: Some(ComponentId::new("root")),
            ..Self::default()
        };
        engine
            .types
            .insert(ComponentId::new("root"), ComponentType::Container);
        engine
    }

    /// Shared call log.
    #[must_use]
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// Removes the document root (inflation will fail).
    pub fn clear_root(&mut self) {
        self.root = None;
    }

    /// Sets the document time the engine claims has already elapsed.
    pub fn set_reported_elapsed_ms(&mut self, ms: f64) {
        self.reported_elapsed_ms = ms;
    }

    /// Adds `child` under `parent` in the live tree.
    pub fn link(&mut self, parent: &str, child: &str) {
        self.link_typed(parent, child, ComponentType::Container);
    }

    /// Adds `child` of the given type under `parent`.
    pub fn link_typed(&mut self, parent: &str, child: &str, component_type: ComponentType) {
        let p = ComponentId::new(parent);
        let c = ComponentId::new(child);
        self.children.entry(p.clone()).or_default().push(c.clone());
        self.parents.insert(c.clone(), p);
        self.types.insert(c, component_type);
    }

    /// Detaches the subtree rooted at `root` from the live tree.
    pub fn unlink_subtree(&mut self, root: &str) {
        let root = ComponentId::new(root);
        if let Some(parent) = self.parents.remove(&root) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| *c != root);
            }
        }
        for child in self.children.remove(&root).unwrap_or_default() {
            self.unlink_subtree(child.as_str());
        }
    }

    /// Stages a dirty delta for the next tick.
    pub fn push_dirty(&mut self, id: &str, dirty: DirtyProps) {
        self.dirty.push((ComponentId::new(id), dirty));
    }

    /// Stages a child-insert delta on `parent` for the next tick. The child
    /// must already be linked.
    pub fn push_child_insert(&mut self, parent: &str, child: &str) {
        self.push_dirty(parent, DirtyProps::CHILDREN);
        self.child_changes
            .entry(ComponentId::new(parent))
            .or_default()
            .push(ChildChange {
                child: ComponentId::new(child),
                action: ChildAction::Insert,
            });
    }

    /// Stages a child-remove delta on `parent` for the next tick and
    /// detaches the subtree.
    pub fn push_child_remove(&mut self, parent: &str, child: &str) {
        self.unlink_subtree(child);
        self.push_dirty(parent, DirtyProps::CHILDREN);
        self.child_changes
            .entry(ComponentId::new(parent))
            .or_default()
            .push(ChildChange {
                child: ComponentId::new(child),
                action: ChildAction::Remove,
            });
    }

    /// Stages an event the engine will emit on the next tick.
    pub fn push_event(&mut self, operation: u64, kind: EventKind) {
        self.events.push(EngineEvent {
            operation: OperationId(operation),
            kind,
        });
    }

    /// Stages a resolution the engine will report on the next tick.
    pub fn push_resolution(&mut self, operation: u64) {
        self.resolutions.push(OperationId(operation));
    }

    /// Registers a measure request issued during *every* clock advance,
    /// mimicking an engine that re-measures its text each layout pass.
    pub fn measure_every_tick(&mut self, input: TextMeasuringInput, envelope: MeasureEnvelope) {
        self.repeat_measures.push((input, envelope));
    }

    /// Sizes returned by the measurer, in request order across all ticks.
    #[must_use]
    pub fn measured(&self) -> &[MeasuredSize] {
        &self.measured
    }

    /// Elapsed-ms values passed to each clock advance.
    #[must_use]
    pub fn advances(&self) -> &[f64] {
        &self.advances
    }

    /// Events dispatched back into the engine, in order.
    #[must_use]
    pub fn dispatched(&self) -> &[EngineEvent] {
        &self.dispatched
    }

    /// Ids materialized, in order (duplicates would indicate rebuilds).
    #[must_use]
    pub fn materialized(&self) -> &[ComponentId] {
        &self.materialized
    }

    /// Number of relayout requests received.
    #[must_use]
    pub fn relayout_requests(&self) -> u32 {
        self.relayouts
    }

    /// Makes the next clock advance fail with a backend error.
    pub fn fail_next_advance(&mut self, message: &str) {
        self.fail_next_advance = Some(message.to_owned());
    }

    /// Sets the keep-awake inputs.
    pub fn set_screen_lock_required(&mut self, required: bool) {
        self.screen_lock = required;
    }

    /// Sets whether media is playing.
    pub fn set_media_playing(&mut self, playing: bool) {
        self.media = playing;
    }

    /// Stages a data-source error for the next tick.
    pub fn set_data_source_error(&mut self, message: &str) {
        self.data_source_error = Some(message.to_owned());
    }

    /// Marks the visual context dirty with the given serialization.
    pub fn set_visual_context(&mut self, context: &str) {
        self.visual_context = Some(context.to_owned());
    }

    /// Marks the data-source context dirty with the given serialization.
    pub fn set_data_source_context(&mut self, context: &str) {
        self.data_source_context = Some(context.to_owned());
    }

    /// Appends a marker to the shared log; useful inside work-queue tasks.
    pub fn note(&mut self, entry: &str) {
        self.log.push(format!("engine: {entry}"));
    }
}

impl DocumentEngine for ScriptedEngine {
    fn root(&self) -> Option<ComponentId> {
        self.root.clone()
    }

    fn reported_elapsed_ms(&self) -> f64 {
        self.reported_elapsed_ms
    }

    fn advance_clock(
        &mut self,
        elapsed_ms: f64,
        _wall_clock_ms: f64,
        measurer: &mut dyn MeasureText,
    ) -> Result<(), EngineError> {
        self.log.push("engine: advance");
        self.advances.push(elapsed_ms);
        if let Some(message) = self.fail_next_advance.take() {
            return Err(EngineError::Backend(message));
        }
        for (input, envelope) in &self.repeat_measures {
            let size = measurer
                .measure(input, *envelope)
                .map_err(|e| EngineError::Backend(e.to_string()))?;
            self.measured.push(size);
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> Vec<OperationId> {
        core::mem::take(&mut self.resolutions)
    }

    fn dirty_components(&mut self) -> Vec<(ComponentId, DirtyProps)> {
        core::mem::take(&mut self.dirty)
    }

    fn take_events(&mut self) -> Vec<EngineEvent> {
        core::mem::take(&mut self.events)
    }

    fn children_changed(&mut self, id: &ComponentId) -> Vec<ChildChange> {
        self.child_changes.remove(id).unwrap_or_default()
    }

    fn live_children(&self, id: &ComponentId) -> Vec<ComponentId> {
        self.children.get(id).cloned().unwrap_or_default()
    }

    fn materialize(&mut self, id: &ComponentId) -> Result<MaterializedComponent, EngineError> {
        self.log.push(format!("engine: materialize {id}"));
        self.materialized.push(id.clone());
        let component_type = self
            .types
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::UnknownComponent(id.clone()))?;
        Ok(MaterializedComponent {
            component_type,
            parent: self.parents.get(id).cloned(),
        })
    }

    fn dispatch_event(&mut self, event: &EngineEvent) -> Result<(), EngineError> {
        self.log.push(format!("engine: dispatch {}", event.operation));
        self.dispatched.push(*event);
        Ok(())
    }

    fn screen_lock_required(&self) -> bool {
        self.screen_lock
    }

    fn media_playing(&self) -> bool {
        self.media
    }

    fn take_data_source_error(&mut self) -> Option<String> {
        self.data_source_error.take()
    }

    fn visual_context_dirty(&self) -> bool {
        self.visual_context.is_some()
    }

    fn serialize_visual_context(&mut self) -> String {
        self.visual_context.take().unwrap_or_default()
    }

    fn data_source_context_dirty(&self) -> bool {
        self.data_source_context.is_some()
    }

    fn serialize_data_source_context(&mut self) -> String {
        self.data_source_context.take().unwrap_or_default()
    }

    fn request_relayout(&mut self) {
        self.log.push("engine: relayout");
        self.relayouts += 1;
    }
}
