// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame synchronization and text-measure caching between an opaque
//! retained-mode document engine and a host UI toolkit.
//!
//! `lamina_core` owns the per-document frame loop: each host frame callback
//! becomes one tick that advances the engine clock, answers the engine's
//! synchronous text-measure callbacks from a cache, pulls the engine's dirty
//! deltas into a component registry, and dispatches engine events, all on
//! the UI thread.
//!
//! # Architecture
//!
//! ```text
//!   other threads ──► WorkQueue ─┐
//!                                ▼
//!   frame callback ──► DocumentSynchronizer::on_tick
//!                                │
//!          ┌─────────────────────┼──────────────────────┐
//!          ▼                     ▼                       ▼
//!   DocumentEngine      TextMeasurementCache      ComponentRegistry
//!   (advance_clock,     (answers measure           (dedup, subtree
//!    deltas, events)     callbacks re-entrantly)    build/evict)
//!          │                                             │
//!          └──────────────► WidgetLayer ◄────────────────┘
//! ```
//!
//! **[`sync`]** — [`DocumentSynchronizer`](sync::DocumentSynchronizer), the
//! per-document tick loop and owner of all per-document state.
//!
//! **[`engine`]** — The [`DocumentEngine`](engine::DocumentEngine) and
//! [`WidgetLayer`](engine::WidgetLayer) seams, plus the event and
//! materialization types that cross them.
//!
//! **[`text`]** — Measurement inputs, the deterministic layout primitive,
//! and [`TextMeasurementCache`](text::TextMeasurementCache) with its
//! full-hit / partial-hit / rebuild reuse heuristic.
//!
//! **[`registry`]** — [`ComponentRegistry`](registry::ComponentRegistry),
//! the host-side mirror of materialized components with tombstoned removal.
//!
//! **[`pending`]** — In-flight asynchronous operation tracking.
//!
//! **[`queue`]** — The cross-thread [`WorkQueue`](queue::WorkQueue) into the
//! UI-thread tick; the only cross-thread structure in the crate.
//!
//! **[`metrics`]** — The dp↔px transform and the auto-scaling viewport fit.
//!
//! **[`config`]** — Diffing of host configuration snapshots.
//!
//! **[`time`]** — Monotonic timestamps and the injectable
//! [`TimeSource`](time::TimeSource).
//!
//! **[`component`]** — Ids, type tags, and dirty-property masks.
//!
//! **[`error`]** — The transient / tick-fatal / document-fatal error
//! taxonomy.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod pending;
pub mod queue;
pub mod registry;
pub mod sync;
pub mod text;
pub mod time;
