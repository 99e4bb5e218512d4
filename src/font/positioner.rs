//! Writing glyph runs as text showing operators.
//!
//! Glyphs are batched into one string for as long as each glyph sits where
//! the advance of the previous one puts it. Any other position starts a new
//! batch after a `Td` relative to the start of the current line.

use crate::font::{Font, Glyph, GlyphRun};
use crate::resource::ResourceDictionary;
use crate::serialize::SerializeContext;
use float_cmp::approx_eq;
use pdf_writer::{Content, Name, Str, TextStr};
use std::sync::Arc;
use tracing::debug;

struct GlyphPositioner<'a> {
    content: &'a mut Content,
    /// Whether the text object has been opened.
    in_text: bool,
    started: bool,
    /// The start of the current line, in user space.
    line_origin: (f32, f32),
    /// How far the glyphs written since the line start have advanced.
    x_advance: f32,
    pending: Vec<u8>,
}

impl<'a> GlyphPositioner<'a> {
    fn new(content: &'a mut Content) -> Self {
        Self {
            content,
            in_text: false,
            started: false,
            line_origin: (0.0, 0.0),
            x_advance: 0.0,
            pending: vec![],
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.content.show(Str(&self.pending));
            self.pending.clear();
        }
    }

    fn begin_text(&mut self) {
        if !self.in_text {
            self.content.begin_text();
            self.in_text = true;
        }
    }

    /// Close the text object, if anything was written at all.
    fn finish(&mut self) {
        self.flush();
        if self.in_text {
            self.content.end_text();
        }
    }

    fn set_font(&mut self, name: &str, size: f32) {
        self.begin_text();
        self.flush();
        self.content.set_font(Name(name.as_bytes()), size);
    }

    fn write_glyph(&mut self, code: u16, multi_byte: bool, advance: f32, x: f32, y: f32) {
        if !self.started {
            // Flip the text back upright, the page itself is flipped.
            self.content.set_text_matrix([1.0, 0.0, 0.0, -1.0, x, y]);
            self.line_origin = (x, y);
            self.started = true;
        }

        let dx = x - self.line_origin.0;
        let dy = y - self.line_origin.1;

        // Make sure we don't write miniscule adjustments
        if !approx_eq!(f32, dx, self.x_advance, epsilon = 0.001)
            || !approx_eq!(f32, dy, 0.0, epsilon = 0.001)
        {
            self.flush();
            self.content.next_line(dx, -dy);
            self.line_origin = (x, y);
            self.x_advance = 0.0;
        }

        self.x_advance += advance;

        if multi_byte {
            self.pending.extend_from_slice(&code.to_be_bytes());
        } else {
            self.pending.push(code as u8);
        }
    }

    fn begin_actual_text(&mut self, text: &str) {
        self.begin_text();
        self.flush();
        let mut span = self
            .content
            .begin_marked_content_with_properties(Name(b"Span"));
        span.properties().actual_text(TextStr(text));
    }

    fn end_actual_text(&mut self) {
        self.flush();
        self.content.end_marked_content();
    }
}

/// Write the glyphs of a run as one text object. The object is left out if
/// none of the glyphs is written.
///
/// Glyphs the font can't show with a text operator are returned, so that they
/// can be drawn some other way.
pub(crate) fn show_glyph_run(
    run: &GlyphRun,
    resources: &mut ResourceDictionary,
    sc: &mut SerializeContext,
    content: &mut Content,
) -> Vec<Glyph> {
    let font = &run.font;
    let advance_scale = run.size * run.text_scale_x / font.units_per_em();
    let mut positioner = GlyphPositioner::new(content);
    let mut fallback = vec![];
    let mut current_subfont = None;

    for cluster in clusters(&run.glyphs) {
        let actual_text = actual_text(run, cluster);
        if let Some(text) = actual_text {
            positioner.begin_actual_text(text);
        }

        for glyph in cluster {
            if !font.has_glyph(glyph.id) {
                debug!("font {} has no glyph {}, skipping it", font.id(), glyph.id);
                continue;
            }

            if !font.has_outline(glyph.id) {
                fallback.push(glyph.clone());
                continue;
            }

            let subfont = font.subfont(glyph.id);
            let key = sc.canon.font(&mut sc.graph, font, subfont);
            if current_subfont != Some(subfont) {
                let name = resources.register_font(sc.canon.font_ref(key));
                positioner.set_font(&name, run.size);
                current_subfont = Some(subfont);
            }

            sc.canon.use_glyph(key, glyph.id);
            let advance = font.advance(glyph.id).unwrap_or(0.0) * advance_scale;
            positioner.write_glyph(
                font.encode_glyph(glyph.id),
                font.multi_byte(),
                advance,
                glyph.x,
                glyph.y,
            );
        }

        if actual_text.is_some() {
            positioner.end_actual_text();
        }
    }

    positioner.finish();
    fallback
}

/// Split glyphs into runs of glyphs that belong to the same text cluster.
fn clusters(glyphs: &[Glyph]) -> impl Iterator<Item = &[Glyph]> {
    glyphs.chunk_by(|a, b| a.text.is_some() && a.text == b.text)
}

/// The text a cluster needs to be marked with, if the font alone would
/// extract something else.
fn actual_text<'a>(run: &'a GlyphRun, cluster: &[Glyph]) -> Option<&'a str> {
    let range = cluster.first()?.text.as_ref()?;
    let text = run.cluster_text(range)?;

    let extracted = cluster
        .iter()
        .map(|glyph| unicode_of(&run.font, glyph.id))
        .collect::<Option<String>>();

    (extracted.as_deref() != Some(text)).then_some(text)
}

fn unicode_of(font: &Arc<dyn Font>, glyph: u16) -> Option<char> {
    font.has_glyph(glyph).then(|| font.unicode(glyph)).flatten()
}
