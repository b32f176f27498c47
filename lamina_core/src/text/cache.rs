// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The measurement cache and its reuse heuristic.
//!
//! [`TextMeasurementCache`] answers the engine's synchronous measure
//! callbacks. Reuse runs in increasing cost order:
//!
//! 1. **Full hit** — an entry exists under the input key and the envelope is
//!    unchanged. Zero recomputation; the cached layout is returned as-is.
//! 2. **Partial hit** — left-flush inputs only: the cached paint is reused,
//!    the intrinsic-width sub-cache is consulted/refreshed, and if the text
//!    still fits both the new envelope and the cached layout's width the
//!    cached layout is returned unchanged. Left-flush text reflows
//!    identically as available width grows past its intrinsic width;
//!    centered/right-flush text moves on every width change, so reuse there
//!    would be incorrect, not just suboptimal.
//! 3. **Miss** — a paint is rebuilt only if no fingerprint-equivalent paint
//!    is cached; intrinsic width is refreshed; a new layout is built
//!    honoring the width mode, with a single height-driven rebuild when the
//!    unconstrained layout overflows the envelope.
//!
//! A key never has two live entries: insert replaces. Entries are immutable
//! apart from the recorded envelope, which tracks the most recent request so
//! an identical follow-up call takes the full-hit path.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::MeasureError;
use crate::metrics::Metrics;
use crate::text::input::{MeasureMode, PaintFingerprint, TextMeasuringInput};
use crate::text::shape::{TextLayout, TextPaint};

/// The width/height envelope of one measure request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureEnvelope {
    /// Available width in px (may be infinite under
    /// [`MeasureMode::Undefined`]).
    pub width_px: f64,
    /// Available height in px (may be infinite).
    pub height_px: f64,
    /// Width constraint mode.
    pub width_mode: MeasureMode,
}

/// A measured size in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasuredSize {
    /// Width in px.
    pub width_px: f64,
    /// Height in px.
    pub height_px: f64,
}

impl MeasuredSize {
    /// Zero size, returned for invisible components.
    pub const ZERO: Self = Self {
        width_px: 0.0,
        height_px: 0.0,
    };
}

/// Plain counters for cache observability. Never alter control flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Envelope-identical hits (zero recomputation).
    pub full_hits: u64,
    /// Left-flush desired-width reuses.
    pub partial_hits: u64,
    /// Full layout rebuilds.
    pub misses: u64,
    /// Scale-change invalidations.
    pub invalidations: u64,
}

/// Intrinsic width sub-cache value.
///
/// Keyed by `(text, paint fingerprint)`; the letter-spacing bits detect a
/// spacing change under the same key, which forces a refresh instead of
/// serving a stale width.
#[derive(Clone, Copy, Debug)]
struct DesiredWidth {
    width_px: f64,
    letter_spacing_bits: u64,
}

#[derive(Debug)]
struct CacheEntry {
    layout: Arc<TextLayout>,
    paint: Arc<TextPaint>,
    envelope: MeasureEnvelope,
    size: MeasuredSize,
}

/// Keyed cache from measurement-input fingerprints to computed layouts.
///
/// Owned exclusively by one document's synchronizer; never shared across
/// concurrently-live documents.
#[derive(Debug)]
pub struct TextMeasurementCache {
    metrics: Metrics,
    layouts: HashMap<TextMeasuringInput, CacheEntry>,
    paints: HashMap<PaintFingerprint, Arc<TextPaint>>,
    desired: HashMap<(Arc<str>, PaintFingerprint), DesiredWidth>,
    stats: CacheStats,
}

impl TextMeasurementCache {
    /// Creates an empty cache measuring at the given scale.
    #[must_use]
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            layouts: HashMap::new(),
            paints: HashMap::new(),
            desired: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Measures `input` within `envelope`, reusing previous work when safe.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError`] when text cannot be shaped (degenerate font
    /// size, unbounded exact-width request). Callers treat this as fatal to
    /// the current tick; shaping failures are not transient.
    pub fn measure(
        &mut self,
        input: &TextMeasuringInput,
        envelope: MeasureEnvelope,
    ) -> Result<MeasuredSize, MeasureError> {
        if envelope.width_px.is_nan() || envelope.height_px.is_nan() {
            return Err(MeasureError::ShapingFailed("NaN measure envelope"));
        }
        if !input.visible {
            return Ok(MeasuredSize::ZERO);
        }

        // Full hit: geometry unchanged at all.
        if let Some(entry) = self.layouts.get(input) {
            if entry.envelope == envelope {
                self.stats.full_hits += 1;
                return Ok(entry.size);
            }
        }

        let letter_spacing_px = self.metrics.dp_to_px(input.letter_spacing_dp);

        // Partial hit: left-flush only.
        if input.resolves_to_left() {
            if let Some(paint) = self.layouts.get(input).map(|e| Arc::clone(&e.paint)) {
                let desired = self.desired_width(input, &paint, letter_spacing_px);
                if let Some(entry) = self.layouts.get_mut(input) {
                    if desired <= envelope.width_px && desired <= entry.size.width_px {
                        entry.envelope = envelope;
                        self.stats.partial_hits += 1;
                        return Ok(entry.size);
                    }
                }
            }
        }

        // Miss: rebuild, reusing a fingerprint-equivalent paint if cached.
        let paint = self.paint_for(input)?;
        let desired = self.desired_width(input, &paint, letter_spacing_px);

        let build_width = match envelope.width_mode {
            MeasureMode::Exactly => envelope.width_px,
            MeasureMode::AtMost | MeasureMode::Undefined => envelope.width_px.min(desired),
        };
        if !build_width.is_finite() {
            return Err(MeasureError::ShapingFailed("unbounded exact-width request"));
        }

        let mut layout = TextLayout::build(input, &paint, build_width, letter_spacing_px, None);
        if !layout.is_line_limited()
            && envelope.height_px.is_finite()
            && layout.height_px() > envelope.height_px
        {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "ratio of finite positive px values, floored into a small line count"
            )]
            let max_lines = ((envelope.height_px / layout.line_height_px()).floor() as usize).max(1);
            layout = TextLayout::build(
                input,
                &paint,
                build_width,
                letter_spacing_px,
                Some(max_lines),
            );
        }

        let size = MeasuredSize {
            width_px: build_width,
            height_px: layout.height_px(),
        };

        // Replace any previous entry under this key; never two live entries.
        self.layouts.insert(
            input.clone(),
            CacheEntry {
                layout: Arc::new(layout),
                paint,
                envelope,
                size,
            },
        );
        self.stats.misses += 1;
        Ok(size)
    }

    /// Adopts a new transform. A scale or font-scale change invalidates all
    /// px-denominated state: layouts, paints, and the intrinsic-width
    /// sub-cache (widths here are stored in device pixels, so they do not
    /// survive a rescale).
    pub fn rescale(&mut self, metrics: Metrics) {
        let scale_changed = metrics.scale != self.metrics.scale
            || metrics.font_scale != self.metrics.font_scale;
        self.metrics = metrics;
        if scale_changed {
            tracing::debug!(
                layouts = self.layouts.len(),
                "scale change: invalidating measurement caches"
            );
            self.layouts.clear();
            self.paints.clear();
            self.desired.clear();
            self.stats.invalidations += 1;
        }
    }

    /// Drops all cached state without changing the transform.
    pub fn clear(&mut self) {
        self.layouts.clear();
        self.paints.clear();
        self.desired.clear();
    }

    /// Current transform.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of live layout entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Whether the layout cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Returns the cached layout for `input`, if any.
    ///
    /// The same `Arc` is returned for as long as the entry lives, which is
    /// what makes reuse observable to callers and tests.
    #[must_use]
    pub fn layout_for(&self, input: &TextMeasuringInput) -> Option<Arc<TextLayout>> {
        self.layouts.get(input).map(|e| Arc::clone(&e.layout))
    }

    /// Returns a cached paint for the input's fingerprint, building and
    /// caching one if absent.
    fn paint_for(&mut self, input: &TextMeasuringInput) -> Result<Arc<TextPaint>, MeasureError> {
        let fingerprint = input.paint_fingerprint();
        if let Some(paint) = self.paints.get(&fingerprint) {
            return Ok(Arc::clone(paint));
        }
        let paint = Arc::new(TextPaint::new(fingerprint.clone(), &self.metrics)?);
        self.paints.insert(fingerprint, Arc::clone(&paint));
        Ok(paint)
    }

    /// Consults or refreshes the intrinsic-width sub-cache.
    fn desired_width(
        &mut self,
        input: &TextMeasuringInput,
        paint: &TextPaint,
        letter_spacing_px: f64,
    ) -> f64 {
        let key = (Arc::clone(&input.text), input.paint_fingerprint());
        let bits = letter_spacing_px.to_bits();
        if let Some(cached) = self.desired.get(&key) {
            if cached.letter_spacing_bits == bits {
                return cached.width_px;
            }
        }
        let width_px = paint.intrinsic_width_px(&input.text, letter_spacing_px);
        self.desired.insert(
            key,
            DesiredWidth {
                width_px,
                letter_spacing_bits: bits,
            },
        );
        width_px
    }
}

impl crate::engine::MeasureText for TextMeasurementCache {
    fn measure(
        &mut self,
        input: &TextMeasuringInput,
        envelope: MeasureEnvelope,
    ) -> Result<MeasuredSize, MeasureError> {
        Self::measure(self, input, envelope)
    }
}
