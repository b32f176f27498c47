// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for the synchronization core.
//!
//! Three severities, matching how failures propagate:
//!
//! - **Transient** — an individual operation's failure, reported through the
//!   operation's own resolution. Not represented here; it never aborts a
//!   tick.
//! - **Tick-fatal** — [`TickError`]. Propagates out of
//!   [`DocumentSynchronizer::on_tick`](crate::sync::DocumentSynchronizer::on_tick),
//!   abandoning the current tick. The next tick is unaffected because every
//!   engine read is an idempotent pull.
//! - **Document-fatal** — [`DocumentError`]. The engine failed to produce a
//!   valid document; surfaced once to the caller that requested inflation.
//!   A document is never partially live.
//!
//! Nothing in this crate retries internally.

use thiserror::Error;

use crate::component::ComponentId;

/// A failure reported by the document engine collaborator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine referenced a component it never announced.
    #[error("engine referenced unknown component {0:?}")]
    UnknownComponent(ComponentId),
    /// The engine declined to materialize a component it reported.
    #[error("engine failed to materialize component {0:?}")]
    BuildFailed(ComponentId),
    /// Any other engine-side failure, in the engine's own words.
    #[error("engine failure: {0}")]
    Backend(String),
}

/// A failure while shaping or measuring text.
///
/// Shaping failures are not expected to be transient; callers treat them as
/// fatal to the current tick and never retry.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// The paint inputs cannot produce a layout (non-finite size or scale).
    #[error("cannot shape text: {0}")]
    ShapingFailed(&'static str),
}

/// A tick-fatal failure: the current tick is abandoned and the error is
/// surfaced to the host scheduler.
#[derive(Debug, Error)]
pub enum TickError {
    /// The engine failed during clock advance, dirty pull, or event dispatch.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A synchronous measure callback failed.
    #[error(transparent)]
    Measure(#[from] MeasureError),
}

/// A document-fatal failure during inflation.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The engine produced no root component.
    #[error("engine produced no document root")]
    NoRoot,
    /// The engine failed while preparing the document.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
