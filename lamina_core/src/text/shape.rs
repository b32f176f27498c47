// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The text layout primitive: paints and line-broken layouts.
//!
//! Lamina does not rasterize text; it only needs pixel-accurate *extents*
//! and stable per-line placement. [`TextPaint`] is the metric-uniform
//! shaping object (advance per display cell, natural line height) derived
//! from a [`PaintFingerprint`] at the current scale. [`TextLayout`] breaks a
//! run into lines with a greedy wrap over word bounds, grapheme-accurate
//! widths, alignment offsets, and optional line limiting with ellipsis.
//!
//! Widths come from `unicode-width` display cells so CJK and combining
//! sequences measure correctly; breaks never split a grapheme cluster.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::error::MeasureError;
use crate::metrics::Metrics;
use crate::text::input::{Direction, PaintFingerprint, TextAlign, TextMeasuringInput};

/// Ellipsis appended when line limiting truncates overflowing text.
const ELLIPSIS: &str = "\u{2026}";

/// Advance per display cell, as a fraction of the font size.
const CELL_ADVANCE_EM: f64 = 0.5;

/// Natural line height as a fraction of the font size.
const LINE_HEIGHT_EM: f64 = 1.2;

/// The expensive shaping object: per-cell advance and line height in px.
///
/// Building a paint is the costly step the fingerprint sub-key exists to
/// amortize; layouts that agree on the fingerprint share one paint.
#[derive(Clone, Debug)]
pub struct TextPaint {
    fingerprint: PaintFingerprint,
    size_px: f64,
    cell_advance_px: f64,
    line_height_px: f64,
}

impl TextPaint {
    /// Builds a paint for the given fingerprint at the current scale.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::ShapingFailed`] if the resolved pixel size is
    /// not a positive finite number.
    pub fn new(fingerprint: PaintFingerprint, metrics: &Metrics) -> Result<Self, MeasureError> {
        let size_px = metrics.font_dp_to_px(fingerprint.font.size_dp);
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(MeasureError::ShapingFailed("non-positive resolved font size"));
        }
        Ok(Self {
            fingerprint,
            size_px,
            cell_advance_px: size_px * CELL_ADVANCE_EM,
            line_height_px: size_px * LINE_HEIGHT_EM,
        })
    }

    /// Returns the fingerprint this paint was built from.
    #[must_use]
    pub fn fingerprint(&self) -> &PaintFingerprint {
        &self.fingerprint
    }

    /// Resolved font size in px.
    #[must_use]
    pub fn size_px(&self) -> f64 {
        self.size_px
    }

    /// Natural (unmultiplied) line height in px.
    #[must_use]
    pub fn line_height_px(&self) -> f64 {
        self.line_height_px
    }

    /// Advance of one grapheme cluster in px.
    ///
    /// Zero-width clusters (combining sequences fold into the base cluster's
    /// cells) advance by zero and draw no letter spacing.
    #[must_use]
    pub fn grapheme_advance_px(&self, grapheme: &str, letter_spacing_px: f64) -> f64 {
        let cells = grapheme.width();
        if cells == 0 {
            0.0
        } else {
            cells as f64 * self.cell_advance_px + letter_spacing_px
        }
    }

    /// Advance of a whole string in px.
    #[must_use]
    pub fn str_advance_px(&self, s: &str, letter_spacing_px: f64) -> f64 {
        s.graphemes(true)
            .map(|g| self.grapheme_advance_px(g, letter_spacing_px))
            .sum()
    }

    /// Intrinsic (desired) width of a run: the widest paragraph, unwrapped.
    #[must_use]
    pub fn intrinsic_width_px(&self, text: &str, letter_spacing_px: f64) -> f64 {
        text.split('\n')
            .map(|para| self.str_advance_px(para.trim_end(), letter_spacing_px))
            .fold(0.0, f64::max)
    }
}

/// One placed line of a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LineBox {
    /// Line content, trailing whitespace trimmed.
    pub content: String,
    /// Line advance width in px.
    pub width_px: f64,
    /// Horizontal offset of the line's left edge within the layout width.
    pub offset_px: f64,
}

/// Physical alignment after resolving [`TextAlign`] against [`Direction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PhysicalAlign {
    Left,
    Center,
    Right,
}

fn resolve_align(align: TextAlign, direction: Direction) -> PhysicalAlign {
    match (align, direction) {
        (TextAlign::Start, Direction::Ltr) | (TextAlign::End, Direction::Rtl) => {
            PhysicalAlign::Left
        }
        (TextAlign::Center, _) => PhysicalAlign::Center,
        (TextAlign::Start, Direction::Rtl) | (TextAlign::End, Direction::Ltr) => {
            PhysicalAlign::Right
        }
    }
}

/// An immutable measured layout.
///
/// Never mutated after construction; a changed input always produces a new
/// layout.
#[derive(Clone, Debug)]
pub struct TextLayout {
    lines: Vec<LineBox>,
    layout_width_px: f64,
    line_height_px: f64,
    line_limited: bool,
}

impl TextLayout {
    /// Breaks `input.text` into lines within `width_px`.
    ///
    /// `max_lines`, when set, truncates overflow with an ellipsis on the
    /// last kept line and marks the layout line-limited. Empty text still
    /// produces one (empty) line, so height never collapses to zero.
    #[must_use]
    pub fn build(
        input: &TextMeasuringInput,
        paint: &TextPaint,
        width_px: f64,
        letter_spacing_px: f64,
        max_lines: Option<usize>,
    ) -> Self {
        let mut raw_lines = Vec::new();
        for para in input.text.split('\n') {
            wrap_paragraph(para, paint, width_px, letter_spacing_px, &mut raw_lines);
        }
        if raw_lines.is_empty() {
            raw_lines.push(String::new());
        }

        let mut line_limited = false;
        if let Some(limit) = max_lines {
            let limit = limit.max(1);
            if raw_lines.len() > limit {
                raw_lines.truncate(limit);
                let last = raw_lines.pop().unwrap_or_default();
                raw_lines.push(ellipsize(&last, paint, width_px, letter_spacing_px));
                line_limited = true;
            }
        }

        let physical = resolve_align(input.align, input.direction);
        let lines = raw_lines
            .into_iter()
            .map(|content| {
                let content = content.trim_end().to_string();
                let line_width = paint.str_advance_px(&content, letter_spacing_px);
                let slack = (width_px - line_width).max(0.0);
                let offset_px = match physical {
                    PhysicalAlign::Left => 0.0,
                    PhysicalAlign::Center => slack / 2.0,
                    PhysicalAlign::Right => slack,
                };
                LineBox {
                    content,
                    width_px: line_width,
                    offset_px,
                }
            })
            .collect();

        Self {
            lines,
            layout_width_px: width_px,
            line_height_px: paint.line_height_px() * input.line_height,
            line_limited,
        }
    }

    /// The placed lines.
    #[must_use]
    pub fn lines(&self) -> &[LineBox] {
        &self.lines
    }

    /// Width the layout was built at, in px.
    #[must_use]
    pub fn width_px(&self) -> f64 {
        self.layout_width_px
    }

    /// Total height in px.
    #[must_use]
    pub fn height_px(&self) -> f64 {
        self.lines.len() as f64 * self.line_height_px
    }

    /// Effective per-line height in px.
    #[must_use]
    pub fn line_height_px(&self) -> f64 {
        self.line_height_px
    }

    /// Whether line limiting truncated this layout.
    #[must_use]
    pub fn is_line_limited(&self) -> bool {
        self.line_limited
    }
}

/// Greedy wrap of one paragraph into `out`.
fn wrap_paragraph(
    para: &str,
    paint: &TextPaint,
    width_px: f64,
    letter_spacing_px: f64,
    out: &mut Vec<String>,
) {
    let mut line = String::new();
    let mut line_width = 0.0;

    for word in para.split_word_bounds() {
        let word_width = paint.str_advance_px(word, letter_spacing_px);

        if line_width + word_width > width_px && !line.is_empty() {
            if word.trim().is_empty() {
                // Whitespace hangs at the break; never starts a line.
                out.push(core::mem::take(&mut line));
                line_width = 0.0;
                continue;
            }
            out.push(core::mem::take(&mut line));
            line_width = 0.0;
        }

        if word_width > width_px && line.is_empty() {
            // Word wider than the envelope: break at grapheme boundaries,
            // always placing at least one cluster per line.
            for grapheme in word.graphemes(true) {
                let advance = paint.grapheme_advance_px(grapheme, letter_spacing_px);
                if line_width + advance > width_px && !line.is_empty() {
                    out.push(core::mem::take(&mut line));
                    line_width = 0.0;
                }
                line.push_str(grapheme);
                line_width += advance;
            }
            continue;
        }

        line.push_str(word);
        line_width += word_width;
    }

    out.push(line);
}

/// Truncates `line` so that it plus the ellipsis fits `width_px`.
fn ellipsize(line: &str, paint: &TextPaint, width_px: f64, letter_spacing_px: f64) -> String {
    let ellipsis_width = paint.str_advance_px(ELLIPSIS, letter_spacing_px);
    let target = width_px - ellipsis_width;
    if target <= 0.0 {
        return ELLIPSIS.to_string();
    }

    let mut kept = String::with_capacity(line.len() + ELLIPSIS.len());
    let mut kept_width = 0.0;
    for grapheme in line.graphemes(true) {
        let advance = paint.grapheme_advance_px(grapheme, letter_spacing_px);
        if kept_width + advance > target {
            break;
        }
        kept.push_str(grapheme);
        kept_width += advance;
    }
    kept.push_str(ELLIPSIS);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::input::{FontSpec, FontStyle};

    fn input(text: &str) -> TextMeasuringInput {
        TextMeasuringInput {
            text: text.into(),
            spans: Vec::new(),
            font: FontSpec {
                family: "sans-serif".into(),
                size_dp: 16.0,
                weight: 400,
                style: FontStyle::Normal,
                language: "en-US".into(),
            },
            letter_spacing_dp: 0.0,
            line_height: 1.0,
            align: TextAlign::Start,
            direction: Direction::Ltr,
            highlight: None,
            shadow: None,
            visible: true,
        }
    }

    fn paint_for(i: &TextMeasuringInput) -> TextPaint {
        TextPaint::new(i.paint_fingerprint(), &Metrics::IDENTITY).unwrap()
    }

    // 16 dp font at identity scale: 8 px per cell, 19.2 px line height.

    #[test]
    fn paint_rejects_degenerate_size() {
        let mut i = input("x");
        i.font.size_dp = 0.0;
        assert!(TextPaint::new(i.paint_fingerprint(), &Metrics::IDENTITY).is_err());

        i.font.size_dp = f64::NAN;
        assert!(TextPaint::new(i.paint_fingerprint(), &Metrics::IDENTITY).is_err());
    }

    #[test]
    fn advances_use_display_cells() {
        let i = input("x");
        let p = paint_for(&i);
        assert!((p.str_advance_px("ab", 0.0) - 16.0).abs() < 1e-9);
        // CJK is double-width.
        assert!((p.str_advance_px("\u{4f60}", 0.0) - 16.0).abs() < 1e-9);
        // Combining accents add no advance.
        assert!((p.str_advance_px("e\u{0301}", 0.0) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn letter_spacing_applies_per_cluster() {
        let i = input("x");
        let p = paint_for(&i);
        assert!((p.str_advance_px("abc", 2.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn intrinsic_width_is_widest_paragraph() {
        let i = input("x");
        let p = paint_for(&i);
        let w = p.intrinsic_width_px("ab\nabcd\nabc", 0.0);
        assert!((w - 32.0).abs() < 1e-9);
    }

    #[test]
    fn single_line_when_it_fits() {
        let i = input("hello");
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        assert_eq!(layout.lines().len(), 1);
        assert_eq!(layout.lines()[0].content, "hello");
        assert!((layout.lines()[0].width_px - 40.0).abs() < 1e-9);
    }

    #[test]
    fn wraps_at_word_bounds() {
        // "hello world" at width 48 px (6 cells): "hello" (40) fits, space
        // hangs, "world" starts the next line.
        let i = input("hello world");
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 48.0, 0.0, None);
        assert_eq!(layout.lines().len(), 2);
        assert_eq!(layout.lines()[0].content, "hello");
        assert_eq!(layout.lines()[1].content, "world");
    }

    #[test]
    fn oversized_word_breaks_at_graphemes() {
        let i = input("abcdefgh");
        let p = paint_for(&i);
        // 24 px = 3 cells per line.
        let layout = TextLayout::build(&i, &p, 24.0, 0.0, None);
        let contents: Vec<_> = layout.lines().iter().map(|l| l.content.as_str()).collect();
        assert_eq!(contents, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn explicit_newlines_always_break() {
        let i = input("a\n\nb");
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        assert_eq!(layout.lines().len(), 3);
        assert_eq!(layout.lines()[1].content, "");
    }

    #[test]
    fn empty_text_keeps_one_line_of_height() {
        let i = input("");
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        assert_eq!(layout.lines().len(), 1);
        assert!((layout.height_px() - 19.2).abs() < 1e-9);
    }

    #[test]
    fn line_height_multiplier_scales_height() {
        let mut i = input("hello");
        i.line_height = 1.5;
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        assert!((layout.height_px() - 28.8).abs() < 1e-9);
    }

    #[test]
    fn max_lines_truncates_with_ellipsis() {
        let i = input("aaa bbb ccc ddd");
        let p = paint_for(&i);
        // 24 px fits one 3-cell word per line.
        let layout = TextLayout::build(&i, &p, 24.0, 0.0, Some(2));
        assert_eq!(layout.lines().len(), 2);
        assert!(layout.is_line_limited());
        assert!(layout.lines()[1].content.ends_with('\u{2026}'));
        assert!(layout.lines()[1].width_px <= 24.0 + 1e-9);
    }

    #[test]
    fn left_aligned_offsets_are_zero() {
        let i = input("hi");
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        assert!((layout.lines()[0].offset_px - 0.0).abs() < 1e-9);
    }

    #[test]
    fn centered_offsets_split_slack() {
        let mut i = input("hi");
        i.align = TextAlign::Center;
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        // 100 - 16 = 84 slack, half on each side.
        assert!((layout.lines()[0].offset_px - 42.0).abs() < 1e-9);
    }

    #[test]
    fn end_aligned_ltr_is_right_flush() {
        let mut i = input("hi");
        i.align = TextAlign::End;
        let p = paint_for(&i);
        let layout = TextLayout::build(&i, &p, 100.0, 0.0, None);
        assert!((layout.lines()[0].offset_px - 84.0).abs() < 1e-9);
    }

    #[test]
    fn left_flush_lines_keep_placement_as_width_grows() {
        let i = input("hello world");
        let p = paint_for(&i);
        let narrow = TextLayout::build(&i, &p, 96.0, 0.0, None);
        let wide = TextLayout::build(&i, &p, 200.0, 0.0, None);
        assert_eq!(narrow.lines().len(), 1);
        assert_eq!(narrow.lines(), wide.lines(), "left-flush placement must not move");
    }
}
