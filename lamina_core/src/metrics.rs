// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping between the document engine's logical units and device pixels.
//!
//! The engine computes everything in density-independent units (dp); the
//! host toolkit speaks device pixels. [`Metrics`] is the pure transform
//! between the two, derived from [`RawMetrics`] — and, when the document
//! declares candidate [`ViewportSpec`]s, from an auto-scaling search that
//! picks the scale bringing the physical viewport closest to a declared
//! specification.
//!
//! This type covers exactly the conversions the core needs (dp↔px, font
//! sizing) without pulling in a geometry crate.

/// Baseline display density: 1 dp equals 1 px at 160 dpi.
pub const BASELINE_DPI: f64 = 160.0;

/// Raw device/viewport parameters as reported by the host toolkit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawMetrics {
    /// Viewport width in device pixels.
    pub width_px: f64,
    /// Viewport height in device pixels.
    pub height_px: f64,
    /// Display density in dots per inch.
    pub dpi: f64,
    /// User font scale multiplier (accessibility setting).
    pub font_scale: f64,
    /// Whether the host is in a dark theme.
    pub dark_theme: bool,
    /// Whether a screen reader is active.
    pub screen_reader_active: bool,
}

impl RawMetrics {
    /// Returns whether the pixel dimensions and density are usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width_px.is_finite()
            && self.height_px.is_finite()
            && self.width_px > 0.0
            && self.height_px > 0.0
            && self.dpi.is_finite()
            && self.dpi > 0.0
            && self.font_scale.is_finite()
            && self.font_scale > 0.0
    }
}

/// A candidate viewport specification declared by the document.
///
/// Each spec names the dp range the document was authored for. The
/// auto-scaling search ([`Metrics::best_fit`]) picks the spec (and scale)
/// with the smallest deviation from the physical viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSpec {
    /// Minimum authored width in dp.
    pub min_width_dp: f64,
    /// Maximum authored width in dp.
    pub max_width_dp: f64,
    /// Minimum authored height in dp.
    pub min_height_dp: f64,
    /// Maximum authored height in dp.
    pub max_height_dp: f64,
}

impl ViewportSpec {
    /// Creates a spec for an exact authored size.
    #[must_use]
    pub const fn exact(width_dp: f64, height_dp: f64) -> Self {
        Self {
            min_width_dp: width_dp,
            max_width_dp: width_dp,
            min_height_dp: height_dp,
            max_height_dp: height_dp,
        }
    }

    /// Deviation of a dp size from this spec's range, squared per axis.
    fn cost(&self, width_dp: f64, height_dp: f64) -> f64 {
        let dw = range_deviation(width_dp, self.min_width_dp, self.max_width_dp);
        let dh = range_deviation(height_dp, self.min_height_dp, self.max_height_dp);
        dw * dw + dh * dh
    }
}

/// Distance from `value` to the closed range `[min, max]` (zero inside).
fn range_deviation(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min - value
    } else if value > max {
        value - max
    } else {
        0.0
    }
}

/// The dp↔px transform. Stateless given the current scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    /// Device pixels per dp.
    pub scale: f64,
    /// User font scale multiplier, applied on top of `scale` for text sizes.
    pub font_scale: f64,
}

impl Metrics {
    /// Identity transform (1 dp = 1 px, no font scaling).
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        font_scale: 1.0,
    };

    /// Derives the transform directly from raw metrics (no auto-scaling).
    #[must_use]
    pub fn from_raw(raw: &RawMetrics) -> Self {
        Self {
            scale: raw.dpi / BASELINE_DPI,
            font_scale: raw.font_scale,
        }
    }

    /// Auto-scaling search over candidate viewport specifications.
    ///
    /// Evaluates, for each spec, the density-derived scale plus the scales
    /// that pin the viewport to the spec's dp bounds, and keeps the
    /// candidate with the lowest deviation. Ties go to the earlier spec and
    /// to the scale closest to the density-derived one. With no specs this
    /// reduces to [`from_raw`](Self::from_raw).
    #[must_use]
    pub fn best_fit(raw: &RawMetrics, specs: &[ViewportSpec]) -> Self {
        let base = raw.dpi / BASELINE_DPI;
        let mut best_scale = base;
        let mut best_cost = f64::INFINITY;

        for spec in specs {
            let candidates = [
                base,
                raw.width_px / spec.max_width_dp,
                raw.width_px / spec.min_width_dp,
                raw.height_px / spec.max_height_dp,
                raw.height_px / spec.min_height_dp,
            ];
            for &scale in &candidates {
                if !scale.is_finite() || scale <= 0.0 {
                    continue;
                }
                let cost = spec.cost(raw.width_px / scale, raw.height_px / scale);
                let better = cost < best_cost
                    || (cost == best_cost
                        && (scale - base).abs() < (best_scale - base).abs());
                if better {
                    best_cost = cost;
                    best_scale = scale;
                }
            }
        }

        Self {
            scale: best_scale,
            font_scale: raw.font_scale,
        }
    }

    /// Converts dp to device pixels.
    #[inline]
    #[must_use]
    pub fn dp_to_px(&self, dp: f64) -> f64 {
        dp * self.scale
    }

    /// Converts device pixels to dp.
    #[inline]
    #[must_use]
    pub fn px_to_dp(&self, px: f64) -> f64 {
        px / self.scale
    }

    /// Converts an authored font size (dp) to device pixels, honoring the
    /// user font scale.
    #[inline]
    #[must_use]
    pub fn font_dp_to_px(&self, dp: f64) -> f64 {
        dp * self.scale * self.font_scale
    }

    /// Is this transform usable?
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.font_scale.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(width_px: f64, height_px: f64, dpi: f64) -> RawMetrics {
        RawMetrics {
            width_px,
            height_px,
            dpi,
            font_scale: 1.0,
            dark_theme: false,
            screen_reader_active: false,
        }
    }

    #[test]
    fn density_scale_round_trips() {
        let m = Metrics::from_raw(&raw(1920.0, 1080.0, 320.0));
        assert!((m.scale - 2.0).abs() < 1e-12);
        assert!((m.px_to_dp(m.dp_to_px(123.0)) - 123.0).abs() < 1e-9);
    }

    #[test]
    fn font_scale_applies_to_text_only() {
        let mut r = raw(800.0, 600.0, 160.0);
        r.font_scale = 1.5;
        let m = Metrics::from_raw(&r);
        assert!((m.dp_to_px(10.0) - 10.0).abs() < 1e-12);
        assert!((m.font_dp_to_px(10.0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn best_fit_with_no_specs_uses_density() {
        let r = raw(1000.0, 500.0, 240.0);
        let m = Metrics::best_fit(&r, &[]);
        assert_eq!(m, Metrics::from_raw(&r));
    }

    #[test]
    fn best_fit_keeps_density_scale_when_viewport_fits() {
        // 1600x800 px at 2x density = 800x400 dp, inside the spec range.
        let r = raw(1600.0, 800.0, 320.0);
        let spec = ViewportSpec {
            min_width_dp: 600.0,
            max_width_dp: 1000.0,
            min_height_dp: 300.0,
            max_height_dp: 500.0,
        };
        let m = Metrics::best_fit(&r, &[spec]);
        assert!((m.scale - 2.0).abs() < 1e-12);
    }

    #[test]
    fn best_fit_rescales_to_reach_exact_spec() {
        // 1280x720 px at 1x density, document authored for exactly 640x360 dp.
        let r = raw(1280.0, 720.0, 160.0);
        let m = Metrics::best_fit(&r, &[ViewportSpec::exact(640.0, 360.0)]);
        assert!((m.scale - 2.0).abs() < 1e-12, "expected 2.0, got {}", m.scale);
    }

    #[test]
    fn best_fit_prefers_closer_spec() {
        let r = raw(1000.0, 1000.0, 160.0);
        let far = ViewportSpec::exact(100.0, 100.0);
        let near = ViewportSpec::exact(1000.0, 1000.0);
        let m = Metrics::best_fit(&r, &[far, near]);
        assert!((m.scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_raw_metrics_detected() {
        assert!(!raw(0.0, 100.0, 160.0).is_valid());
        assert!(!raw(100.0, 100.0, 0.0).is_valid());
        assert!(raw(100.0, 100.0, 160.0).is_valid());
    }
}
