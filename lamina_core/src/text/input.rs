// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measurement inputs and fingerprint keys.
//!
//! [`TextMeasuringInput`] carries every parameter that can change shaped
//! output. Two inputs are equal iff every field compares equal — that
//! equality is the cache-hit predicate, so the manual `Eq`/`Hash` impls
//! below compare float fields by bit pattern (a float that changes at all
//! must produce a different key; NaN never occurs in validated inputs).
//!
//! [`PaintFingerprint`] is the deliberately coarser sub-key over only the
//! fields that feed the expensive shaping object: font family, size,
//! weight, style, language, and direction. Inputs that differ in content or
//! alignment but agree on the paint fingerprint can share a
//! [`TextPaint`](super::shape::TextPaint).

use core::hash::{Hash, Hasher};
use std::sync::Arc;

/// How the engine constrains the width axis of a measure request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasureMode {
    /// Layout width is forced to the requested width.
    Exactly,
    /// Layout width is at most the requested width.
    AtMost,
    /// No width constraint; the requested width is only an upper envelope.
    Undefined,
}

/// Logical text alignment, resolved against [`Direction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextAlign {
    /// Flush to the leading edge (left in LTR, right in RTL).
    Start,
    /// Centered in the layout width.
    Center,
    /// Flush to the trailing edge.
    End,
}

/// Base text direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left-to-right.
    Ltr,
    /// Right-to-left.
    Rtl,
}

/// Font slant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Upright.
    Normal,
    /// Italic.
    Italic,
}

/// Font selection parameters, in authored (dp) units.
#[derive(Clone, Debug)]
pub struct FontSpec {
    /// Font family name.
    pub family: Arc<str>,
    /// Authored size in dp.
    pub size_dp: f64,
    /// Weight (100–900, 400 = regular).
    pub weight: u16,
    /// Slant.
    pub style: FontStyle,
    /// BCP-47 language tag driving shaping rules.
    pub language: Arc<str>,
}

impl PartialEq for FontSpec {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.size_dp.to_bits() == other.size_dp.to_bits()
            && self.weight == other.weight
            && self.style == other.style
            && self.language == other.language
    }
}

impl Eq for FontSpec {}

impl Hash for FontSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.size_dp.to_bits().hash(state);
        self.weight.hash(state);
        self.style.hash(state);
        self.language.hash(state);
    }
}

/// A styled range within the run text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleSpan {
    /// Byte offset of the span start.
    pub start: usize,
    /// Byte offset one past the span end.
    pub end: usize,
    /// What the span applies.
    pub kind: SpanKind,
}

/// Kind of styling a [`StyleSpan`] applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Bold weight.
    Bold,
    /// Italic slant.
    Italic,
    /// Underline decoration.
    Underline,
    /// Strike-through decoration.
    Strikethrough,
}

/// Text shadow parameters, in dp.
#[derive(Clone, Copy, Debug)]
pub struct Shadow {
    /// Horizontal offset.
    pub offset_x_dp: f64,
    /// Vertical offset.
    pub offset_y_dp: f64,
    /// Blur radius.
    pub radius_dp: f64,
    /// Shadow color as ARGB.
    pub color: u32,
}

impl PartialEq for Shadow {
    fn eq(&self, other: &Self) -> bool {
        self.offset_x_dp.to_bits() == other.offset_x_dp.to_bits()
            && self.offset_y_dp.to_bits() == other.offset_y_dp.to_bits()
            && self.radius_dp.to_bits() == other.radius_dp.to_bits()
            && self.color == other.color
    }
}

impl Eq for Shadow {}

impl Hash for Shadow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset_x_dp.to_bits().hash(state);
        self.offset_y_dp.to_bits().hash(state);
        self.radius_dp.to_bits().hash(state);
        self.color.hash(state);
    }
}

/// Everything that can change shaped output for one text component.
///
/// This is the cache key. The measure *envelope* (requested width/height and
/// width mode) is deliberately not part of it — envelope changes are what
/// the partial-hit and full-hit checks of the cache compare against the
/// stored entry, and folding them into the key would make every resize a
/// cold miss.
#[derive(Clone, Debug)]
pub struct TextMeasuringInput {
    /// Run text content.
    pub text: Arc<str>,
    /// Styled ranges within `text`.
    pub spans: Vec<StyleSpan>,
    /// Font selection.
    pub font: FontSpec,
    /// Additional advance per grapheme, in dp.
    pub letter_spacing_dp: f64,
    /// Line height multiplier over the font's natural line height.
    pub line_height: f64,
    /// Logical alignment.
    pub align: TextAlign,
    /// Base direction.
    pub direction: Direction,
    /// Active highlight byte range, if any (karaoke-style emphasis).
    pub highlight: Option<(usize, usize)>,
    /// Shadow parameters, if any.
    pub shadow: Option<Shadow>,
    /// Whether the component is displayed at all.
    pub visible: bool,
}

impl TextMeasuringInput {
    /// Returns the coarse paint sub-key for this input.
    #[must_use]
    pub fn paint_fingerprint(&self) -> PaintFingerprint {
        PaintFingerprint {
            font: self.font.clone(),
            direction: self.direction,
        }
    }

    /// Returns whether lines end up flush against the physical left edge,
    /// where grown-width reuse is sound.
    ///
    /// Left-flush text reflows identically as available width grows past its
    /// intrinsic width; centered or right-flush text moves on every width
    /// change.
    #[must_use]
    pub fn resolves_to_left(&self) -> bool {
        matches!(
            (self.align, self.direction),
            (TextAlign::Start, Direction::Ltr) | (TextAlign::End, Direction::Rtl)
        )
    }
}

impl PartialEq for TextMeasuringInput {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.spans == other.spans
            && self.font == other.font
            && self.letter_spacing_dp.to_bits() == other.letter_spacing_dp.to_bits()
            && self.line_height.to_bits() == other.line_height.to_bits()
            && self.align == other.align
            && self.direction == other.direction
            && self.highlight == other.highlight
            && self.shadow == other.shadow
            && self.visible == other.visible
    }
}

impl Eq for TextMeasuringInput {}

impl Hash for TextMeasuringInput {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.spans.hash(state);
        self.font.hash(state);
        self.letter_spacing_dp.to_bits().hash(state);
        self.line_height.to_bits().hash(state);
        self.align.hash(state);
        self.direction.hash(state);
        self.highlight.hash(state);
        self.shadow.hash(state);
        self.visible.hash(state);
    }
}

/// Coarse equivalence key for the expensive shaping object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PaintFingerprint {
    /// Font selection (family, size, weight, style, language).
    pub font: FontSpec,
    /// Base direction.
    pub direction: Direction,
}
