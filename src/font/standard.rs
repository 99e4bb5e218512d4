//! The standard Helvetica font, which every PDF reader has built in.

use crate::font::{Font, Glyph, GlyphRun};
use crate::graph::ObjectGraph;
use crate::primitive::{Dict, Object};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::sync::Arc;

const FIRST_CHAR: u16 = 32;
const LAST_CHAR: u16 = 126;

/// Advance widths of the printable ASCII range, in units of 1/1000 em.
const HELVETICA_WIDTHS: [u16; (LAST_CHAR - FIRST_CHAR + 1) as usize] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32..48
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48..64
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64..80
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80..96
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96..112
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112..127
];

static HELVETICA: Lazy<Arc<StandardFont>> = Lazy::new(|| Arc::new(StandardFont::new()));

/// Helvetica with WinAnsi encoding, restricted to printable ASCII. Glyph
/// ids are the character codes.
#[derive(Debug)]
pub struct StandardFont {
    id: u64,
}

impl StandardFont {
    fn new() -> Self {
        Self {
            id: crate::util::hash128("Helvetica") as u64,
        }
    }

    /// The shared Helvetica instance.
    pub fn helvetica() -> Arc<StandardFont> {
        HELVETICA.clone()
    }

    /// Lay out `text` on a single line starting at `(x, y)`. Characters the
    /// font has no glyph for are dropped.
    pub fn layout(self: Arc<Self>, text: &str, size: f32, x: f32, y: f32) -> GlyphRun {
        let mut glyphs = vec![];
        let mut cur_x = x;

        for (i, c) in text.char_indices() {
            let Ok(code) = u16::try_from(u32::from(c)) else {
                continue;
            };

            if !self.has_glyph(code) {
                continue;
            }

            glyphs.push(Glyph::new(code, cur_x, y).with_text(i..i + c.len_utf8()));
            cur_x += self.advance(code).unwrap_or(0.0) * size / self.units_per_em();
        }

        GlyphRun::new(self, size, glyphs).with_text(text.to_string())
    }
}

impl Font for StandardFont {
    fn id(&self) -> u64 {
        self.id
    }

    fn units_per_em(&self) -> f32 {
        1000.0
    }

    fn advance(&self, glyph: u16) -> Option<f32> {
        let index = glyph.checked_sub(FIRST_CHAR)?;
        HELVETICA_WIDTHS.get(index as usize).map(|w| *w as f32)
    }

    fn has_glyph(&self, glyph: u16) -> bool {
        (FIRST_CHAR..=LAST_CHAR).contains(&glyph)
    }

    fn multi_byte(&self) -> bool {
        false
    }

    fn unicode(&self, glyph: u16) -> Option<char> {
        self.has_glyph(glyph)
            .then(|| char::from_u32(glyph as u32))
            .flatten()
    }

    fn write_font(&self, _: &mut ObjectGraph, _: u16, _: &BTreeSet<u16>) -> Object {
        Dict::typed("Font")
            .with("Subtype", Object::name("Type1"))
            .with("BaseFont", Object::name("Helvetica"))
            .with("Encoding", Object::name("WinAnsiEncoding"))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        let font = StandardFont::helvetica();
        assert_eq!(font.advance(b' ' as u16), Some(278.0));
        assert_eq!(font.advance(b'W' as u16), Some(944.0));
        assert_eq!(font.advance(b'~' as u16), Some(584.0));
        assert_eq!(font.advance(127), None);
        assert_eq!(font.advance(10), None);
    }

    #[test]
    fn layout_advances() {
        let run = StandardFont::helvetica().layout("Hi é", 10.0, 5.0, 20.0);

        let ids = run.glyphs.iter().map(|g| g.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![b'H' as u16, b'i' as u16, b' ' as u16]);
        assert_eq!(run.glyphs[0].x, 5.0);
        assert_eq!(run.glyphs[1].x, 5.0 + 7.22);
        assert_eq!(run.glyphs[2].text, Some(2..3));
    }
}
