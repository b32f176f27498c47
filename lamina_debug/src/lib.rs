// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for lamina
//! diagnostics.
//!
//! Development and post-mortem tooling around
//! [`TickReport`](lamina_core::sync::TickReport):
//!
//! - [`recorder::TickRecorder`] — bounded in-memory recording of recent
//!   ticks, oldest dropped first.
//! - [`pretty`] — human-readable one-line-per-tick output.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from a
//!   recording.

pub mod chrome;
pub mod pretty;
pub mod recorder;
