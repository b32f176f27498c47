// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-document frame loop.
//!
//! [`DocumentSynchronizer`] owns everything one live document needs: the
//! engine, the widget layer, the component registry, the text cache, the
//! pending-operation set, and the work queue. Each host frame callback
//! becomes one [`on_tick`](DocumentSynchronizer::on_tick), which runs the
//! fixed tick sequence:
//!
//! ```text
//!   frame callback (UI thread)
//!        │
//!        ▼
//!   drain work queue ──► advance engine clock ──► resolve operations
//!        │                  (measure callbacks          │
//!        │                   answered by cache)         ▼
//!        │                                      apply dirty deltas
//!        │                                              │
//!        ▼                                              ▼
//!   budget accounting ◄── context forwarding ◄── dispatch events
//! ```
//!
//! Dirty deltas are applied before events dispatch, so by the time an event
//! reaches the engine every component it may reference has a widget. All of
//! it runs on the UI thread; the work queue is the only way in from outside.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::component::ComponentId;
use crate::engine::{DocumentEngine, WidgetLayer};
use crate::error::{DocumentError, TickError};
use crate::metrics::Metrics;
use crate::pending::PendingOperationSet;
use crate::queue::{WorkHandle, WorkQueue};
use crate::registry::ComponentRegistry;
use crate::text::{CacheStats, TextMeasurementCache};
use crate::time::{DurationNs, MonotonicClock, TimeSource, Timestamp};

/// Tunables for the frame loop.
#[derive(Clone, Copy, Debug)]
pub struct SynchronizerConfig {
    /// Budget for one tick; ticks costing more count as dropped frames.
    pub frame_budget: DurationNs,
    /// Minimum interval between context serializations pushed to the host.
    pub context_throttle: DurationNs,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            // One 60 Hz frame, rounded up.
            frame_budget: DurationNs(16_700_000),
            context_throttle: DurationNs::from_millis(500),
        }
    }
}

/// Lifetime counters across all ticks of a synchronizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickCounters {
    /// Ticks that ran to completion.
    pub ticks: u64,
    /// Completed ticks that exceeded the frame budget.
    pub dropped_frames: u64,
    /// Ticks abandoned by a tick-fatal error.
    pub failed_ticks: u64,
}

/// What one completed tick did, for logging and the debug recorder.
#[derive(Clone, Copy, Debug)]
pub struct TickReport {
    /// Zero-based index of this tick.
    pub frame_index: u64,
    /// Document time handed to the engine, in milliseconds.
    pub elapsed_ms: f64,
    /// Wall cost of the whole tick.
    pub tick_cost: DurationNs,
    /// Whether `tick_cost` exceeded the frame budget.
    pub over_budget: bool,
    /// Work-queue tasks executed at the top of the tick.
    pub queue_tasks_run: usize,
    /// Dirty component deltas applied.
    pub dirty_applied: usize,
    /// Engine events dispatched.
    pub events_dispatched: usize,
    /// Pending operations resolved.
    pub operations_resolved: usize,
    /// Cumulative measurement-cache counters after this tick.
    pub measure: CacheStats,
}

/// Outcome of one frame callback.
#[derive(Clone, Copy, Debug)]
pub enum TickOutcome {
    /// The tick ran; here is what it did.
    Ran(TickReport),
    /// The document is finished; nothing was touched.
    Skipped,
}

/// Drives one document: engine on one side, widget layer on the other.
///
/// Single-threaded by construction. Created, ticked, and finished on the UI
/// thread; [`work_handle`](Self::work_handle) is the only cross-thread
/// entry.
pub struct DocumentSynchronizer<E, W, C = MonotonicClock> {
    engine: E,
    widgets: W,
    clock: C,
    config: SynchronizerConfig,
    registry: ComponentRegistry,
    text_cache: TextMeasurementCache,
    pending: PendingOperationSet,
    queue: WorkQueue<E>,
    counters: TickCounters,
    /// Host timestamp corresponding to document time zero. Fixed on the
    /// first tick from the engine's reported elapsed time, so re-attaching
    /// resumes the document clock instead of rewinding it.
    loop_start: Option<Timestamp>,
    finished: bool,
    frame_index: u64,
    keep_awake: bool,
    last_context_push: Option<Timestamp>,
    relayout_requested: bool,
}

impl<E, W, C> DocumentSynchronizer<E, W, C>
where
    E: DocumentEngine,
    W: WidgetLayer,
    C: TimeSource,
{
    /// Builds the synchronizer for a freshly inflated document and
    /// materializes its root eagerly.
    ///
    /// # Errors
    ///
    /// Fails when the engine has no root or the root cannot be
    /// materialized. A document is never partially live: on error nothing
    /// was attached.
    pub fn inflate(
        engine: E,
        widgets: W,
        clock: C,
        metrics: Metrics,
        config: SynchronizerConfig,
    ) -> Result<Self, DocumentError> {
        let mut sync = Self {
            engine,
            widgets,
            clock,
            config,
            registry: ComponentRegistry::new(),
            text_cache: TextMeasurementCache::new(metrics),
            pending: PendingOperationSet::new(),
            queue: WorkQueue::new(),
            counters: TickCounters::default(),
            loop_start: None,
            finished: false,
            frame_index: 0,
            keep_awake: false,
            last_context_push: None,
            relayout_requested: false,
        };
        sync.attach_root()?;
        Ok(sync)
    }

    fn attach_root(&mut self) -> Result<ComponentId, DocumentError> {
        let root = self.engine.root().ok_or(DocumentError::NoRoot)?;
        self.registry.get_or_build(&root, &mut self.engine)?;
        tracing::info!(root = %root, "document attached");
        Ok(root)
    }

    /// Runs one tick for the host frame callback at `frame_timestamp`.
    ///
    /// Returns [`TickOutcome::Skipped`] without touching the engine once the
    /// document is finished.
    ///
    /// # Errors
    ///
    /// A [`TickError`] abandons the current tick; the document stays live
    /// and the next tick proceeds normally, because every engine read is an
    /// idempotent pull.
    pub fn on_tick(&mut self, frame_timestamp: Timestamp) -> Result<TickOutcome, TickError> {
        if self.finished {
            return Ok(TickOutcome::Skipped);
        }
        match self.tick_inner(frame_timestamp) {
            Ok(report) => {
                self.counters.ticks += 1;
                if report.over_budget {
                    self.counters.dropped_frames += 1;
                    tracing::debug!(
                        frame = report.frame_index,
                        cost_ms = report.tick_cost.as_millis_f64(),
                        "tick over budget"
                    );
                }
                Ok(TickOutcome::Ran(report))
            }
            Err(e) => {
                self.counters.failed_ticks += 1;
                tracing::warn!(frame = self.frame_index, error = %e, "tick abandoned");
                Err(e)
            }
        }
    }

    fn tick_inner(&mut self, frame_timestamp: Timestamp) -> Result<TickReport, TickError> {
        // Fix document time zero on the first tick. A document re-attached
        // mid-playback reports nonzero elapsed time and must resume there.
        let loop_start = *self.loop_start.get_or_insert_with(|| {
            let already_elapsed = millis_to_duration(self.engine.reported_elapsed_ms());
            frame_timestamp
                .checked_sub(already_elapsed)
                .unwrap_or(Timestamp(0))
        });

        let queue_tasks_run = self.queue.drain(&mut self.engine);

        if self.relayout_requested {
            self.relayout_requested = false;
            self.engine.request_relayout();
        }

        let elapsed_ms = frame_timestamp
            .saturating_duration_since(loop_start)
            .as_millis_f64();
        let wall_clock_ms = unix_wall_clock_ms();
        self.engine
            .advance_clock(elapsed_ms, wall_clock_ms, &mut self.text_cache)?;

        let mut operations_resolved = 0;
        for id in self.engine.flush_pending() {
            if self.pending.resolve(id) {
                operations_resolved += 1;
            }
        }

        // Structure and properties settle before any event executes, so an
        // event never reaches the engine while the widget tree is stale.
        let deltas = self.engine.dirty_components();
        let dirty_applied = deltas.len();
        for (id, dirty) in deltas {
            self.registry
                .apply_delta(&id, dirty, &mut self.engine, &mut self.widgets)?;
        }

        let events = self.engine.take_events();
        let events_dispatched = events.len();
        for event in events {
            self.pending.register(event.operation, event.kind);
            self.engine.dispatch_event(&event)?;
        }

        self.forward_keep_awake();
        if let Some(message) = self.engine.take_data_source_error() {
            self.widgets.on_data_source_error(&message);
        }
        self.forward_contexts();

        let tick_cost = self.clock.now().saturating_duration_since(frame_timestamp);
        let report = TickReport {
            frame_index: self.frame_index,
            elapsed_ms,
            tick_cost,
            over_budget: tick_cost > self.config.frame_budget,
            queue_tasks_run,
            dirty_applied,
            events_dispatched,
            operations_resolved,
            measure: self.text_cache.stats(),
        };
        self.frame_index += 1;
        Ok(report)
    }

    /// Edge-detects the keep-awake requirement; the widget layer hears
    /// about toggles only.
    fn forward_keep_awake(&mut self) {
        let wanted = self.engine.screen_lock_required() || self.engine.media_playing();
        if wanted != self.keep_awake {
            self.keep_awake = wanted;
            self.widgets.on_screen_lock_changed(wanted);
        }
    }

    /// Pushes visual/data-source context serializations when dirty, at most
    /// once per throttle interval. The interval restarts only when
    /// something was actually pushed.
    fn forward_contexts(&mut self) {
        let now = self.clock.now();
        let due = self
            .last_context_push
            .is_none_or(|last| now.saturating_duration_since(last) >= self.config.context_throttle);
        if !due {
            return;
        }
        let mut pushed = false;
        if self.engine.visual_context_dirty() {
            let context = self.engine.serialize_visual_context();
            self.widgets.on_visual_context_updated(&context);
            pushed = true;
        }
        if self.engine.data_source_context_dirty() {
            let context = self.engine.serialize_data_source_context();
            self.widgets.on_data_source_context_updated(&context);
            pushed = true;
        }
        if pushed {
            self.last_context_push = Some(now);
        }
    }

    /// Tears the document down. Terminal: queued work is discarded,
    /// in-flight operations are cancelled, the registry is cleared, and
    /// every later tick is a no-op skip.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        let dropped_tasks = self.queue.clear();
        let cancelled = self.pending.cancel_all();
        self.registry.clear();
        self.finished = true;
        tracing::info!(dropped_tasks, cancelled, "document finished");
    }

    /// Restarts a finished synchronizer against the engine's current
    /// document, as a fresh generation: new registry contents, cold caches,
    /// document clock re-fixed on the next tick.
    ///
    /// # Errors
    ///
    /// Fails when the engine no longer has an inflatable root; the
    /// synchronizer stays finished in that case.
    pub fn reinflate(&mut self) -> Result<(), DocumentError> {
        self.queue.clear();
        self.pending.cancel_all();
        self.registry.clear();
        self.text_cache.clear();
        self.loop_start = None;
        self.keep_awake = false;
        self.last_context_push = None;
        self.attach_root()?;
        self.finished = false;
        Ok(())
    }

    /// Adopts a new unit transform after a host configuration change. A
    /// scale or font-scale change empties the text caches and schedules a
    /// full engine relayout for the next tick.
    pub fn on_configuration_changed(&mut self, metrics: Metrics) {
        let previous = self.text_cache.metrics();
        self.text_cache.rescale(metrics);
        if previous != metrics {
            self.relayout_requested = true;
        }
    }

    /// Returns a cloneable cross-thread posting handle. Tasks run at the
    /// top of the next tick with exclusive access to the engine.
    #[must_use]
    pub fn work_handle(&self) -> WorkHandle<E> {
        self.queue.handle()
    }

    /// Lifetime tick counters.
    #[must_use]
    pub fn counters(&self) -> TickCounters {
        self.counters
    }

    /// Whether [`finish`](Self::finish) has run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of operations currently in flight.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.pending.len()
    }

    /// Number of materialized components.
    #[must_use]
    pub fn materialized_components(&self) -> usize {
        self.registry.len()
    }

    /// Cumulative measurement-cache counters.
    #[must_use]
    pub fn measure_stats(&self) -> CacheStats {
        self.text_cache.stats()
    }

    /// Borrows the engine (tests and backend glue).
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutably borrows the engine (tests and backend glue).
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Borrows the widget layer.
    pub fn widgets(&self) -> &W {
        &self.widgets
    }
}

/// Fractional milliseconds to [`DurationNs`], clamped at zero.
fn millis_to_duration(ms: f64) -> DurationNs {
    if ms.is_finite() && ms > 0.0 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "checked finite and positive; u64 nanoseconds covers the document lifetime"
        )]
        DurationNs((ms * 1e6) as u64)
    } else {
        DurationNs(0)
    }
}

/// Wall-clock milliseconds since the Unix epoch, for engine-side absolute
/// timestamps. Zero if the system clock reads before the epoch.
fn unix_wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1e3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentType, DirtyProps};
    use crate::engine::{
        ChildChange, EngineEvent, EventKind, MaterializedComponent, MeasureText, OperationId,
    };
    use crate::error::EngineError;
    use crate::time::ManualClock;

    /// Engine stub that records calls and replays scripted deltas.
    #[derive(Default)]
    struct StubEngine {
        reported_elapsed_ms: f64,
        advances: Vec<f64>,
        dirty: Vec<(ComponentId, DirtyProps)>,
        events: Vec<EngineEvent>,
        resolutions: Vec<OperationId>,
        dispatched: Vec<OperationId>,
        lock_required: bool,
        counter: u32,
    }

    impl DocumentEngine for StubEngine {
        fn root(&self) -> Option<ComponentId> {
            Some(ComponentId::new("root"))
        }
        fn reported_elapsed_ms(&self) -> f64 {
            self.reported_elapsed_ms
        }
        fn advance_clock(
            &mut self,
            elapsed_ms: f64,
            _wall_clock_ms: f64,
            _measurer: &mut dyn MeasureText,
        ) -> Result<(), EngineError> {
            self.advances.push(elapsed_ms);
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
        fn children_changed(&mut self, _id: &ComponentId) -> Vec<ChildChange> {
            Vec::new()
        }
        fn live_children(&self, _id: &ComponentId) -> Vec<ComponentId> {
            Vec::new()
        }
        fn materialize(&mut self, _id: &ComponentId) -> Result<MaterializedComponent, EngineError> {
            Ok(MaterializedComponent {
                component_type: ComponentType::Container,
                parent: None,
            })
        }
        fn dispatch_event(&mut self, event: &EngineEvent) -> Result<(), EngineError> {
            self.dispatched.push(event.operation);
            Ok(())
        }
        fn screen_lock_required(&self) -> bool {
            self.lock_required
        }
        fn media_playing(&self) -> bool {
            false
        }
        fn take_data_source_error(&mut self) -> Option<String> {
            None
        }
        fn visual_context_dirty(&self) -> bool {
            false
        }
        fn serialize_visual_context(&mut self) -> String {
            String::new()
        }
        fn data_source_context_dirty(&self) -> bool {
            false
        }
        fn serialize_data_source_context(&mut self) -> String {
            String::new()
        }
        fn request_relayout(&mut self) {
            self.counter += 1;
        }
    }

    #[derive(Default)]
    struct NullWidgets {
        lock_changes: Vec<bool>,
    }

    impl WidgetLayer for NullWidgets {
        fn on_component_properties_changed(&mut self, _id: &ComponentId, _dirty: DirtyProps) {}
        fn on_component_subtree_inserted(&mut self, _id: &ComponentId) {}
        fn on_component_subtree_removed(&mut self, _id: &ComponentId) {}
        fn on_screen_lock_changed(&mut self, required: bool) {
            self.lock_changes.push(required);
        }
        fn on_visual_context_updated(&mut self, _context: &str) {}
        fn on_data_source_context_updated(&mut self, _context: &str) {}
        fn on_data_source_error(&mut self, _message: &str) {}
    }

    fn sync_at(
        engine: StubEngine,
        clock_start: u64,
    ) -> DocumentSynchronizer<StubEngine, NullWidgets, ManualClock> {
        DocumentSynchronizer::inflate(
            engine,
            NullWidgets::default(),
            ManualClock::new(clock_start),
            Metrics::IDENTITY,
            SynchronizerConfig::default(),
        )
        .unwrap()
    }

    fn ran(outcome: TickOutcome) -> TickReport {
        match outcome {
            TickOutcome::Ran(report) => report,
            TickOutcome::Skipped => panic!("expected the tick to run"),
        }
    }

    #[test]
    fn elapsed_time_counts_from_first_tick() {
        let mut sync = sync_at(StubEngine::default(), 0);
        let r1 = ran(sync.on_tick(Timestamp(1_000_000_000)).unwrap());
        let r2 = ran(sync.on_tick(Timestamp(1_016_700_000)).unwrap());
        assert!((r1.elapsed_ms - 0.0).abs() < 1e-9);
        assert!((r2.elapsed_ms - 16.7).abs() < 1e-9);
        assert_eq!(sync.engine().advances.len(), 2);
    }

    #[test]
    fn reattached_document_resumes_rather_than_rewinds() {
        let engine = StubEngine {
            reported_elapsed_ms: 5_000.0,
            ..StubEngine::default()
        };
        let mut sync = sync_at(engine, 0);
        let r = ran(sync.on_tick(Timestamp(7_000_000_000)).unwrap());
        assert!((r.elapsed_ms - 5_000.0).abs() < 1e-6, "clock must resume at 5 s");
    }

    #[test]
    fn events_dispatch_after_dirty_and_register_as_pending() {
        let engine = StubEngine {
            dirty: vec![(ComponentId::new("root"), DirtyProps::BOUNDS)],
            events: vec![EngineEvent {
                operation: OperationId(7),
                kind: EventKind::OpenUrl,
            }],
            ..StubEngine::default()
        };
        let mut sync = sync_at(engine, 0);
        let r = ran(sync.on_tick(Timestamp(0)).unwrap());
        assert_eq!(r.dirty_applied, 1);
        assert_eq!(r.events_dispatched, 1);
        assert_eq!(sync.pending_operations(), 1);
        assert_eq!(sync.engine().dispatched, vec![OperationId(7)]);
    }

    #[test]
    fn resolutions_drain_the_pending_set() {
        let engine = StubEngine {
            events: vec![EngineEvent {
                operation: OperationId(3),
                kind: EventKind::DataSourceFetch,
            }],
            ..StubEngine::default()
        };
        let mut sync = sync_at(engine, 0);
        ran(sync.on_tick(Timestamp(0)).unwrap());
        assert_eq!(sync.pending_operations(), 1);

        sync.engine_mut().resolutions.push(OperationId(3));
        let r = ran(sync.on_tick(Timestamp(16_700_000)).unwrap());
        assert_eq!(r.operations_resolved, 1);
        assert_eq!(sync.pending_operations(), 0);
    }

    #[test]
    fn over_budget_tick_counts_a_dropped_frame() {
        let mut sync = sync_at(StubEngine::default(), 0);

        // Fast tick: clock does not move past the frame timestamp.
        ran(sync.on_tick(Timestamp(0)).unwrap());
        assert_eq!(sync.counters().dropped_frames, 0);

        // Slow tick: by the end of the tick the clock reads 20 ms past the
        // frame timestamp, beyond the 16.7 ms budget.
        let frame = Timestamp(16_700_000);
        sync.clock.set(frame.nanos() + DurationNs::from_millis(20).nanos());
        let r = ran(sync.on_tick(frame).unwrap());
        assert!(r.over_budget);
        assert_eq!(sync.counters().dropped_frames, 1);
        assert_eq!(sync.counters().ticks, 2);
    }

    #[test]
    fn finish_is_terminal() {
        let mut sync = sync_at(StubEngine::default(), 0);
        ran(sync.on_tick(Timestamp(0)).unwrap());
        sync.finish();
        assert!(sync.is_finished());
        assert_eq!(sync.materialized_components(), 0);

        let advances_before = sync.engine().advances.len();
        assert!(matches!(
            sync.on_tick(Timestamp(16_700_000)).unwrap(),
            TickOutcome::Skipped
        ));
        assert_eq!(sync.engine().advances.len(), advances_before, "no engine query after finish");
    }

    #[test]
    fn work_posted_before_tick_runs_in_that_tick() {
        let mut sync = sync_at(StubEngine::default(), 0);
        let handle = sync.work_handle();
        handle.post(|engine: &mut StubEngine| engine.counter += 10);

        let r = ran(sync.on_tick(Timestamp(0)).unwrap());
        assert_eq!(r.queue_tasks_run, 1);
        assert_eq!(sync.engine().counter, 10);
    }

    #[test]
    fn keep_awake_forwards_on_toggle_only() {
        let mut sync = sync_at(StubEngine::default(), 0);
        ran(sync.on_tick(Timestamp(0)).unwrap());
        assert!(sync.widgets().lock_changes.is_empty(), "no toggle, no callback");

        sync.engine_mut().lock_required = true;
        ran(sync.on_tick(Timestamp(16_700_000)).unwrap());
        ran(sync.on_tick(Timestamp(33_400_000)).unwrap());
        assert_eq!(sync.widgets().lock_changes, vec![true], "steady state stays silent");

        sync.engine_mut().lock_required = false;
        ran(sync.on_tick(Timestamp(50_100_000)).unwrap());
        assert_eq!(sync.widgets().lock_changes, vec![true, false]);
    }

    #[test]
    fn scale_change_schedules_relayout() {
        let mut sync = sync_at(StubEngine::default(), 0);
        ran(sync.on_tick(Timestamp(0)).unwrap());
        assert_eq!(sync.engine().counter, 0);

        sync.on_configuration_changed(Metrics {
            scale: 2.0,
            font_scale: 1.0,
        });
        ran(sync.on_tick(Timestamp(16_700_000)).unwrap());
        assert_eq!(sync.engine().counter, 1, "one relayout request after rescale");

        ran(sync.on_tick(Timestamp(33_400_000)).unwrap());
        assert_eq!(sync.engine().counter, 1, "relayout request is one-shot");
    }

    #[test]
    fn reinflate_restarts_a_finished_document() {
        let mut sync = sync_at(StubEngine::default(), 0);
        ran(sync.on_tick(Timestamp(0)).unwrap());
        sync.finish();

        sync.reinflate().unwrap();
        assert!(!sync.is_finished());
        assert_eq!(sync.materialized_components(), 1);
        ran(sync.on_tick(Timestamp(100_000_000)).unwrap());
    }
}
