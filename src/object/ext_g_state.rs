//! Extended graphics states.

use crate::blend_mode::BlendMode;
use crate::graph::ObjRef;
use crate::object::mask::Mask;
use crate::paint::Paint;
use crate::path::{LineCap, LineJoin, Stroke};
use crate::primitive::{Dict, Object};
use std::sync::Arc;
use tiny_skia_path::NormalizedF32;

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
struct StrokeProps {
    width: u32,
    miter_limit: u32,
    line_cap: LineCap,
    line_join: LineJoin,
}

/// The soft mask entry of a graphics state.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub(crate) enum SoftMask {
    /// Remove any soft mask that is currently active.
    None,
    Mask(Mask),
}

#[derive(Debug, Hash, PartialEq, Eq, Default, Clone)]
struct Repr {
    alpha: Option<NormalizedF32>,
    blend_mode: Option<BlendMode>,
    stroke: Option<StrokeProps>,
    soft_mask: Option<SoftMask>,
}

/// An ExtGState dictionary. Equal states are written only once per document.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Default)]
pub(crate) struct ExtGState(Arc<Repr>);

impl ExtGState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The state that carries everything about a paint that does not go into
    /// the content stream directly.
    pub(crate) fn for_paint(paint: &Paint) -> Self {
        let stroke = paint.style.stroke().cloned().unwrap_or_default();
        // Modes PDF can't express are emulated on top of a normal draw, so they
        // all share the same state.
        let blend_mode = match paint.blend_mode.pdf_name() {
            "Normal" => BlendMode::SourceOver,
            _ => paint.blend_mode,
        };

        Self::new()
            .alpha(paint.opacity)
            .blend_mode(blend_mode)
            .stroke(&stroke)
    }

    #[must_use]
    pub(crate) fn alpha(mut self, alpha: NormalizedF32) -> Self {
        Arc::make_mut(&mut self.0).alpha = Some(alpha);
        self
    }

    #[must_use]
    pub(crate) fn blend_mode(mut self, blend_mode: BlendMode) -> Self {
        Arc::make_mut(&mut self.0).blend_mode = Some(blend_mode);
        self
    }

    #[must_use]
    pub(crate) fn stroke(mut self, stroke: &Stroke) -> Self {
        Arc::make_mut(&mut self.0).stroke = Some(StrokeProps {
            width: stroke.width.to_bits(),
            miter_limit: stroke.miter_limit.to_bits(),
            line_cap: stroke.line_cap,
            line_join: stroke.line_join,
        });
        self
    }

    #[must_use]
    pub(crate) fn soft_mask(mut self, soft_mask: SoftMask) -> Self {
        Arc::make_mut(&mut self.0).soft_mask = Some(soft_mask);
        self
    }

    pub(crate) fn needs_invert_function(&self) -> bool {
        matches!(self.0.soft_mask, Some(SoftMask::Mask(mask)) if mask.is_inverted())
    }

    pub(crate) fn to_dict(&self, invert_function: Option<ObjRef>) -> Dict {
        let mut dict = Dict::typed("ExtGState");

        if let Some(alpha) = self.0.alpha {
            dict.insert("CA", alpha.get());
            dict.insert("ca", alpha.get());
        }

        if let Some(stroke) = self.0.stroke {
            dict.insert("LC", stroke.line_cap.to_pdf());
            dict.insert("LJ", stroke.line_join.to_pdf());
            dict.insert("LW", f32::from_bits(stroke.width));
            dict.insert("ML", f32::from_bits(stroke.miter_limit));
            dict.insert("SA", true);
        }

        if let Some(blend_mode) = self.0.blend_mode {
            dict.insert("BM", Object::name(blend_mode.pdf_name()));
        }

        match self.0.soft_mask {
            Some(SoftMask::None) => dict.insert("SMask", Object::name("None")),
            Some(SoftMask::Mask(mask)) => dict.insert("SMask", mask.to_dict(invert_function)),
            None => {}
        }

        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Color, PaintStyle};

    #[test]
    fn paint_state_entries() {
        let paint = Paint::from(Color::new(255, 0, 0))
            .with_opacity(0.5)
            .with_blend_mode(BlendMode::Multiply)
            .with_style(PaintStyle::Stroke(Stroke::with_width(3.0)));

        let dict = ExtGState::for_paint(&paint).to_dict(None);
        assert_eq!(dict.get("ca"), Some(&Object::Real(0.5)));
        assert_eq!(dict.get("LW"), Some(&Object::Real(3.0)));
        assert_eq!(dict.get("BM"), Some(&Object::name("Multiply")));
        assert_eq!(dict.get("SA"), Some(&Object::Bool(true)));
    }

    #[test]
    fn emulated_modes_share_a_state() {
        let normal = ExtGState::for_paint(&Paint::default());
        let src_in = ExtGState::for_paint(&Paint::default().with_blend_mode(BlendMode::SourceIn));
        assert_eq!(normal, src_in);
    }

    #[test]
    fn no_soft_mask() {
        let dict = ExtGState::new().soft_mask(SoftMask::None).to_dict(None);
        assert_eq!(dict.get("SMask"), Some(&Object::name("None")));
        assert_eq!(dict.len(), 2);
    }
}
