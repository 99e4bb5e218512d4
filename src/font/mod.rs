//! Fonts and glyph runs.
//!
//! folio does not parse or subset fonts itself. A font is anything that
//! implements [`Font`]: it answers glyph queries while drawing and writes its
//! own font dictionary once the document knows which glyphs were used.

use crate::graph::ObjectGraph;
use crate::object::image::Image;
use crate::primitive::Object;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::Range;
use std::sync::Arc;
use tiny_skia_path::{Path, Rect};

pub(crate) mod positioner;
pub mod standard;

pub use standard::StandardFont;

/// A font that glyphs can be drawn with.
pub trait Font: Debug {
    /// A value that identifies the font within a document. Glyph runs that
    /// use fonts with the same id share one font dictionary.
    fn id(&self) -> u64;

    fn units_per_em(&self) -> f32;

    /// The horizontal advance of a glyph, in font units.
    fn advance(&self, glyph: u16) -> Option<f32>;

    fn has_glyph(&self, glyph: u16) -> bool;

    /// Whether the glyph can be shown with a text showing operator. Glyphs
    /// without an outline, like bitmap emoji, are drawn as paths or images.
    fn has_outline(&self, _glyph: u16) -> bool {
        true
    }

    /// The outline of a glyph in font units, with the y axis pointing up.
    fn outline(&self, _glyph: u16) -> Option<Path> {
        None
    }

    /// An image for a glyph that has no outline, together with the rectangle
    /// it covers relative to the glyph origin, in user space units at the
    /// given font size.
    fn glyph_image(&self, _glyph: u16, _size: f32) -> Option<(Image, Rect)> {
        None
    }

    /// Whether the encoded glyph codes take two bytes.
    fn multi_byte(&self) -> bool;

    /// Fonts with more glyphs than one font dictionary can hold are split
    /// into several sub-fonts.
    fn subfont(&self, _glyph: u16) -> u16 {
        0
    }

    /// The code that selects the glyph within its sub-font.
    fn encode_glyph(&self, glyph: u16) -> u16 {
        glyph
    }

    /// The text the font itself maps the glyph to, if any.
    fn unicode(&self, glyph: u16) -> Option<char>;

    /// Write the font dictionary of a sub-font for the glyphs that were
    /// used. Auxiliary objects like descriptors or font files are allocated
    /// in `graph` and referenced from the returned object.
    fn write_font(&self, graph: &mut ObjectGraph, subfont: u16, glyphs: &BTreeSet<u16>) -> Object;
}

/// A positioned glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// The glyph id.
    pub id: u16,
    /// The x coordinate of the glyph origin.
    pub x: f32,
    /// The y coordinate of the glyph origin (the baseline).
    pub y: f32,
    /// The range of the run text this glyph belongs to. Glyphs of one cluster
    /// share the same range.
    pub text: Option<Range<usize>>,
}

impl Glyph {
    pub fn new(id: u16, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            text: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: Range<usize>) -> Self {
        self.text = Some(text);
        self
    }
}

/// A sequence of glyphs drawn with one font at one size.
#[derive(Debug, Clone)]
pub struct GlyphRun {
    pub font: Arc<dyn Font>,
    pub size: f32,
    /// The horizontal scale of the glyphs, 1 for unscaled text.
    pub text_scale_x: f32,
    pub glyphs: Vec<Glyph>,
    /// The text the glyphs were shaped from.
    pub text: String,
}

impl GlyphRun {
    pub fn new(font: Arc<dyn Font>, size: f32, glyphs: Vec<Glyph>) -> Self {
        Self {
            font,
            size,
            text_scale_x: 1.0,
            glyphs,
            text: String::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: String) -> Self {
        self.text = text;
        self
    }

    #[must_use]
    pub fn with_text_scale_x(mut self, scale: f32) -> Self {
        self.text_scale_x = scale;
        self
    }

    /// The text of a glyph cluster, if the run has text for it.
    pub(crate) fn cluster_text(&self, range: &Range<usize>) -> Option<&str> {
        self.text.get(range.clone())
    }
}
