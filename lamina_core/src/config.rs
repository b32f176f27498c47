// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host configuration changes: density, font scale, theme, accessibility.
//!
//! The host toolkit reports configuration as a [`RawMetrics`] snapshot
//! whenever anything might have changed, including spurious repeats.
//! [`ConfigurationChangeHandler`] diffs consecutive snapshots, classifies
//! what actually changed, and forwards scale changes to the synchronizer
//! (which invalidates its px-denominated caches and schedules a relayout).
//! Theme and screen-reader flips are returned to the caller; how to repaint
//! for them is a host concern.

use crate::engine::{DocumentEngine, WidgetLayer};
use crate::metrics::{Metrics, RawMetrics, ViewportSpec};
use crate::sync::DocumentSynchronizer;
use crate::time::TimeSource;

/// What a configuration snapshot actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigOutcome {
    /// The dp↔px transform changed (density, viewport fit, or font scale).
    pub scale_changed: bool,
    /// Dark/light theme flipped.
    pub theme_changed: bool,
    /// Screen-reader activity flipped.
    pub screen_reader_changed: bool,
}

impl ConfigOutcome {
    /// Whether anything changed at all.
    #[must_use]
    pub fn any(&self) -> bool {
        self.scale_changed || self.theme_changed || self.screen_reader_changed
    }
}

/// Diffs host configuration snapshots for one document.
#[derive(Clone, Debug)]
pub struct ConfigurationChangeHandler {
    current: RawMetrics,
    specs: Vec<ViewportSpec>,
}

impl ConfigurationChangeHandler {
    /// Creates a handler from the initial configuration and the document's
    /// declared viewport specifications.
    #[must_use]
    pub fn new(initial: RawMetrics, specs: Vec<ViewportSpec>) -> Self {
        Self {
            current: initial,
            specs,
        }
    }

    /// The transform for the current configuration.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        Metrics::best_fit(&self.current, &self.specs)
    }

    /// The current raw snapshot.
    #[must_use]
    pub fn raw(&self) -> RawMetrics {
        self.current
    }

    /// Applies a new snapshot, forwarding a scale change to `sync`.
    ///
    /// Identical snapshots are a no-op; invalid ones (zero sizes,
    /// non-finite density) are logged and ignored, keeping the last good
    /// configuration.
    pub fn apply<E, W, C>(
        &mut self,
        raw: RawMetrics,
        sync: &mut DocumentSynchronizer<E, W, C>,
    ) -> ConfigOutcome
    where
        E: DocumentEngine,
        W: WidgetLayer,
        C: TimeSource,
    {
        if raw == self.current || !raw.is_valid() {
            return self.diff(&raw);
        }
        let outcome = self.diff(&raw);
        self.current = raw;

        if outcome.scale_changed {
            let metrics = self.metrics();
            tracing::info!(
                scale = metrics.scale,
                font_scale = metrics.font_scale,
                "configuration rescaled"
            );
            sync.on_configuration_changed(metrics);
        }
        outcome
    }

    /// Classifies what `raw` would change relative to the current snapshot.
    fn diff(&self, raw: &RawMetrics) -> ConfigOutcome {
        if *raw == self.current {
            return ConfigOutcome::default();
        }
        if !raw.is_valid() {
            tracing::warn!(?raw, "ignoring invalid configuration snapshot");
            return ConfigOutcome::default();
        }
        ConfigOutcome {
            scale_changed: Metrics::best_fit(raw, &self.specs) != self.metrics(),
            theme_changed: raw.dark_theme != self.current.dark_theme,
            screen_reader_changed: raw.screen_reader_active != self.current.screen_reader_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(dpi: f64, font_scale: f64, dark: bool) -> RawMetrics {
        RawMetrics {
            width_px: 1080.0,
            height_px: 1920.0,
            dpi,
            font_scale,
            dark_theme: dark,
            screen_reader_active: false,
        }
    }

    #[test]
    fn identical_snapshot_changes_nothing() {
        let handler = ConfigurationChangeHandler::new(raw(160.0, 1.0, false), Vec::new());
        assert_eq!(handler.diff(&raw(160.0, 1.0, false)), ConfigOutcome::default());
    }

    #[test]
    fn density_change_is_a_scale_change() {
        let handler = ConfigurationChangeHandler::new(raw(160.0, 1.0, false), Vec::new());
        let outcome = handler.diff(&raw(320.0, 1.0, false));
        assert!(outcome.scale_changed);
        assert!(!outcome.theme_changed);
    }

    #[test]
    fn font_scale_change_counts_as_scale_change() {
        let handler = ConfigurationChangeHandler::new(raw(160.0, 1.0, false), Vec::new());
        let outcome = handler.diff(&raw(160.0, 1.3, false));
        assert!(outcome.scale_changed, "font scale feeds text sizing and must invalidate");
    }

    #[test]
    fn theme_flip_without_density_change_is_theme_only() {
        let handler = ConfigurationChangeHandler::new(raw(160.0, 1.0, false), Vec::new());
        let outcome = handler.diff(&raw(160.0, 1.0, true));
        assert!(outcome.theme_changed);
        assert!(!outcome.scale_changed);
    }

    #[test]
    fn screen_reader_flip_is_classified() {
        let handler = ConfigurationChangeHandler::new(raw(160.0, 1.0, false), Vec::new());
        let mut snapshot = raw(160.0, 1.0, false);
        snapshot.screen_reader_active = true;
        let outcome = handler.diff(&snapshot);
        assert!(outcome.screen_reader_changed);
        assert!(!outcome.scale_changed);
    }

    #[test]
    fn invalid_snapshot_is_ignored() {
        let handler = ConfigurationChangeHandler::new(raw(160.0, 1.0, false), Vec::new());
        let bad = RawMetrics {
            dpi: 0.0,
            ..raw(160.0, 1.0, false)
        };
        assert_eq!(handler.diff(&bad), ConfigOutcome::default());
        assert_eq!(handler.raw(), raw(160.0, 1.0, false));
    }

    #[test]
    fn viewport_specs_steer_the_fit() {
        let handler = ConfigurationChangeHandler::new(
            raw(160.0, 1.0, false),
            vec![ViewportSpec::exact(540.0, 960.0)],
        );
        // 1080x1920 px against an authored 540x960 dp spec fits at 2x.
        assert!((handler.metrics().scale - 2.0).abs() < 1e-12);
    }
}
