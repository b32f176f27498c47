// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement: inputs, the layout primitive, and the reuse cache.
//!
//! The document engine issues synchronous "measure text" callbacks during
//! its own layout passes — often several per pass, including speculative
//! passes it discards. Re-shaping on every call would blow the per-tick
//! budget, so measurement runs through [`TextMeasurementCache`], which
//! answers with previously computed layouts whenever the inputs are provably
//! equivalent.
//!
//! - [`input`] — [`TextMeasuringInput`], the full fingerprint over every
//!   parameter that can change shaped output, plus the coarser
//!   [`PaintFingerprint`] sub-key.
//! - [`shape`] — [`TextPaint`] and [`TextLayout`], the deterministic layout
//!   primitive (greedy wrap over word bounds, grapheme-accurate advances,
//!   ellipsis truncation).
//! - [`cache`] — [`TextMeasurementCache`] and the four-level reuse
//!   heuristic: full hit → paint reuse → desired-width reuse → rebuild.

pub mod cache;
pub mod input;
pub mod shape;

pub use cache::{CacheStats, MeasureEnvelope, MeasuredSize, TextMeasurementCache};
pub use input::{
    Direction, FontSpec, FontStyle, MeasureMode, PaintFingerprint, Shadow, SpanKind, StyleSpan,
    TextAlign, TextMeasuringInput,
};
pub use shape::{TextLayout, TextPaint};
