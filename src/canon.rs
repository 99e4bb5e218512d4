//! Per-document caches that make sure equal resources are written once.

use crate::error::FolioResult;
use crate::font::Font;
use crate::graph::{ObjRef, ObjectGraph};
use crate::object::ext_g_state::ExtGState;
use crate::object::mask::invert_function;
use crate::primitive::Stream;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A font dictionary whose glyph set is still growing. Its object is reserved
/// when the font is first used and filled when the document is finished.
#[derive(Debug)]
struct FontEntry {
    font: Arc<dyn Font>,
    subfont: u16,
    obj: ObjRef,
    glyphs: BTreeSet<u16>,
}

/// A handle to a font entry of the canon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FontKey(usize);

#[derive(Debug, Default)]
pub(crate) struct Canon {
    ext_g_states: HashMap<ExtGState, ObjRef>,
    invert_function: Option<ObjRef>,
    pub(crate) images: HashMap<u128, ObjRef>,
    pub(crate) patterns: HashMap<u128, ObjRef>,
    fonts: Vec<FontEntry>,
    font_index: HashMap<(u64, u16), FontKey>,
}

impl Canon {
    pub(crate) fn ext_g_state(&mut self, graph: &mut ObjectGraph, state: ExtGState) -> ObjRef {
        if let Some(r) = self.ext_g_states.get(&state) {
            return *r;
        }

        let invert = state
            .needs_invert_function()
            .then(|| self.invert_function(graph));
        let r = graph.alloc(state.to_dict(invert));
        self.ext_g_states.insert(state, r);
        r
    }

    fn invert_function(&mut self, graph: &mut ObjectGraph) -> ObjRef {
        *self.invert_function.get_or_insert_with(|| {
            let (dict, code) = invert_function();
            graph.alloc(Stream::new(dict, code))
        })
    }

    pub(crate) fn font(
        &mut self,
        graph: &mut ObjectGraph,
        font: &Arc<dyn Font>,
        subfont: u16,
    ) -> FontKey {
        let fonts = &mut self.fonts;
        *self
            .font_index
            .entry((font.id(), subfont))
            .or_insert_with(|| {
                fonts.push(FontEntry {
                    font: font.clone(),
                    subfont,
                    obj: graph.reserve(),
                    glyphs: BTreeSet::new(),
                });
                FontKey(fonts.len() - 1)
            })
    }

    pub(crate) fn font_ref(&self, key: FontKey) -> ObjRef {
        self.fonts[key.0].obj
    }

    pub(crate) fn use_glyph(&mut self, key: FontKey, glyph: u16) {
        self.fonts[key.0].glyphs.insert(glyph);
    }

    /// Fill the reserved font objects now that all glyphs are known.
    pub(crate) fn write_fonts(&mut self, graph: &mut ObjectGraph) -> FolioResult<()> {
        for entry in &self.fonts {
            let font = entry.font.write_font(graph, entry.subfont, &entry.glyphs);
            graph.set(entry.obj, font)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;
    use crate::object::mask::{Mask, MaskType};
    use crate::object::ext_g_state::SoftMask;
    use crate::primitive::Object;

    #[test]
    fn equal_states_share_an_object() {
        let mut graph = ObjectGraph::new();
        let mut canon = Canon::default();

        let a = canon.ext_g_state(&mut graph, ExtGState::new().soft_mask(SoftMask::None));
        let b = canon.ext_g_state(&mut graph, ExtGState::new().soft_mask(SoftMask::None));
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn inverted_masks_share_the_transfer_function() {
        let mut graph = ObjectGraph::new();
        let mut canon = Canon::default();
        let group_a = graph.reserve();
        let group_b = graph.reserve();

        for group in [group_a, group_b] {
            let mask = Mask::new(group, MaskType::Alpha, true);
            canon.ext_g_state(&mut graph, ExtGState::new().soft_mask(SoftMask::Mask(mask)));
        }

        // Two groups, one function, two states.
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn fonts_are_filled_on_write() {
        let mut graph = ObjectGraph::new();
        let mut canon = Canon::default();
        let font: Arc<dyn Font> = StandardFont::helvetica();

        let key = canon.font(&mut graph, &font, 0);
        assert_eq!(canon.font(&mut graph, &font, 0), key);
        canon.use_glyph(key, b'A' as u16);

        let r = canon.font_ref(key);
        assert!(graph.is_reserved(r));
        canon.write_fonts(&mut graph).unwrap();

        let dict = graph.get(r).unwrap().as_dict().unwrap();
        assert_eq!(dict.get("BaseFont"), Some(&Object::name("Helvetica")));
    }
}
