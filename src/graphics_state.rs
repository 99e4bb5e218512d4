//! Tracking the graphics state of a content stream, so that only the
//! operators that actually change something are written.

use crate::clip::{write_clip, ClipStack};
use crate::error::{FolioError, FolioResult};
use crate::paint::Color;
use crate::path::{PathOps, Rect};
use crate::util::TransformExt;
use pdf_writer::types::{ColorSpaceOperand, TextRenderingMode};
use pdf_writer::{Content, Name};
use tiny_skia_path::Transform;
use tracing::warn;

/// How deep the `q` nesting of one content stream may get.
pub(crate) const MAX_STACK_DEPTH: usize = 12;

/// Everything about the graphics state a draw needs, apart from the draw
/// operators themselves.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GraphicsStateEntry {
    pub(crate) transform: Transform,
    pub(crate) clip: ClipStack,
    pub(crate) color: Color,
    /// The pattern resource used instead of the color.
    pub(crate) pattern: Option<String>,
    pub(crate) ext_g_state: Option<String>,
    /// The horizontal text scale. Zero for draws that show no text.
    pub(crate) text_scale_x: f32,
    pub(crate) text_render_mode: TextRenderingMode,
}

impl Default for GraphicsStateEntry {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            clip: ClipStack::new(),
            color: Color::black(),
            pattern: None,
            ext_g_state: None,
            text_scale_x: 1.0,
            text_render_mode: TextRenderingMode::Fill,
        }
    }
}

/// The stack of graphics states a PDF viewer maintains while interpreting a
/// content stream, as far as we have told it about.
#[derive(Debug)]
pub(crate) struct GraphicStack {
    entries: Vec<GraphicsStateEntry>,
}

impl Default for GraphicStack {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicStack {
    pub(crate) fn new() -> Self {
        Self {
            entries: vec![GraphicsStateEntry::default()],
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.entries.len() - 1
    }

    fn cur(&self) -> &GraphicsStateEntry {
        // The base entry is never popped.
        &self.entries[self.entries.len() - 1]
    }

    fn cur_mut(&mut self) -> &mut GraphicsStateEntry {
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    pub(crate) fn push(&mut self, content: &mut Content) -> FolioResult<()> {
        if self.depth() >= MAX_STACK_DEPTH {
            return Err(FolioError::UnsupportedNestingDepth(MAX_STACK_DEPTH));
        }

        content.save_state();
        self.entries.push(self.cur().clone());
        Ok(())
    }

    pub(crate) fn pop(&mut self, content: &mut Content) {
        if self.depth() > 0 {
            content.restore_state();
            self.entries.pop();
        }
    }

    /// Bring the state up to date with `entry`.
    ///
    /// Returns `false` if the clip of the entry could not be written, in which
    /// case nothing of the entry should be drawn.
    pub(crate) fn update(
        &mut self,
        entry: &GraphicsStateEntry,
        device_bounds: Rect,
        path_ops: &dyn PathOps,
        content: &mut Content,
    ) -> FolioResult<bool> {
        if !self.update_clip(&entry.clip, device_bounds, path_ops, content)? {
            return Ok(false);
        }

        self.update_matrix(entry.transform, content)?;
        self.update_drawing_state(entry, content);
        Ok(true)
    }

    fn update_clip(
        &mut self,
        clip: &ClipStack,
        device_bounds: Rect,
        path_ops: &dyn PathOps,
        content: &mut Content,
    ) -> FolioResult<bool> {
        if *clip == self.cur().clip {
            return Ok(true);
        }

        while self.depth() > 0 {
            self.pop(content);
            if *clip == self.cur().clip {
                return Ok(true);
            }
        }

        if clip.is_wide_open() {
            return Ok(true);
        }

        let shapes = match clip.resolve(device_bounds, path_ops) {
            Ok(shapes) => shapes,
            Err(error) => {
                warn!("{error}, skipping the draw");
                return Ok(false);
            }
        };

        self.push(content)?;
        self.cur_mut().clip = clip.clone();
        write_clip(&shapes, content);
        Ok(true)
    }

    fn update_matrix(&mut self, transform: Transform, content: &mut Content) -> FolioResult<()> {
        if transform == self.cur().transform {
            return Ok(());
        }

        // Matrix frames always sit on top of a clip frame with the same clip.
        if !self.cur().transform.is_identity() {
            self.pop(content);
        }

        if transform.is_identity() {
            return Ok(());
        }

        self.push(content)?;
        content.transform(transform.to_pdf_transform());
        self.cur_mut().transform = transform;
        Ok(())
    }

    fn update_drawing_state(&mut self, entry: &GraphicsStateEntry, content: &mut Content) {
        let cur = self.cur_mut();

        if let Some(pattern) = &entry.pattern {
            if cur.pattern.as_ref() != Some(pattern) {
                let name = Name(pattern.as_bytes());
                content.set_stroke_color_space(ColorSpaceOperand::Pattern);
                content.set_stroke_pattern(None, name);
                content.set_fill_color_space(ColorSpaceOperand::Pattern);
                content.set_fill_pattern(None, name);
                cur.pattern = Some(pattern.clone());
            }
        } else if entry.color != cur.color || cur.pattern.is_some() {
            let [r, g, b] = entry.color.to_pdf_components();
            content.set_stroke_rgb(r, g, b);
            content.set_fill_rgb(r, g, b);
            cur.color = entry.color;
            cur.pattern = None;
        }

        if entry.ext_g_state.is_some() && entry.ext_g_state != cur.ext_g_state {
            if let Some(name) = &entry.ext_g_state {
                content.set_parameters(Name(name.as_bytes()));
            }
            cur.ext_g_state = entry.ext_g_state.clone();
        }

        if entry.text_scale_x != 0.0 {
            if entry.text_scale_x != cur.text_scale_x {
                content.set_horizontal_scaling(entry.text_scale_x * 100.0);
                cur.text_scale_x = entry.text_scale_x;
            }

            if entry.text_render_mode != cur.text_render_mode {
                content.set_text_rendering_mode(entry.text_render_mode);
                cur.text_render_mode = entry.text_render_mode;
            }
        }
    }

    /// Pop everything that was pushed.
    pub(crate) fn drain(&mut self, content: &mut Content) {
        while self.depth() > 0 {
            self.pop(content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{BasicPathOps, PathOp, Shape};
    use crate::tests::rect;

    fn device() -> Rect {
        rect(0.0, 0.0, 100.0, 100.0)
    }

    fn run(stack: &mut GraphicStack, entries: &[GraphicsStateEntry]) -> String {
        let mut content = Content::new();
        for entry in entries {
            stack
                .update(entry, device(), &BasicPathOps, &mut content)
                .unwrap();
        }
        String::from_utf8(content.finish()).unwrap()
    }

    fn clipped(r: Rect) -> ClipStack {
        let mut clip = ClipStack::new();
        clip.push(Shape::Rect(r), PathOp::Intersect);
        clip
    }

    #[test]
    fn unchanged_state_writes_nothing() {
        let entry = GraphicsStateEntry {
            color: Color::new(255, 0, 0),
            ext_g_state: Some("G0".to_string()),
            ..GraphicsStateEntry::default()
        };

        let mut stack = GraphicStack::new();
        assert_eq!(run(&mut stack, &[entry.clone()]), "1 0 0 RG\n1 0 0 rg\n/G0 gs");
        assert_eq!(run(&mut stack, &[entry]), "");
    }

    #[test]
    fn transform_gets_its_own_frame() {
        let entry = GraphicsStateEntry {
            transform: Transform::from_translate(10.0, 20.0),
            clip: clipped(rect(0.0, 0.0, 50.0, 50.0)),
            ..GraphicsStateEntry::default()
        };

        let mut stack = GraphicStack::new();
        assert_eq!(
            run(&mut stack, &[entry.clone()]),
            "q\n0 0 50 50 re\nW\nn\nq\n1 0 0 1 10 20 cm"
        );
        assert_eq!(stack.depth(), 2);

        let untransformed = GraphicsStateEntry {
            transform: Transform::identity(),
            ..entry
        };
        assert_eq!(run(&mut stack, &[untransformed]), "Q");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn clip_change_pops_to_matching_frame() {
        let clipped_entry = GraphicsStateEntry {
            clip: clipped(rect(0.0, 0.0, 50.0, 50.0)),
            ..GraphicsStateEntry::default()
        };

        let mut stack = GraphicStack::new();
        run(&mut stack, &[clipped_entry]);
        assert_eq!(run(&mut stack, &[GraphicsStateEntry::default()]), "Q");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn pattern_replaces_color() {
        let pattern = GraphicsStateEntry {
            pattern: Some("P0".to_string()),
            ..GraphicsStateEntry::default()
        };

        let mut stack = GraphicStack::new();
        assert_eq!(
            run(&mut stack, &[pattern]),
            "/Pattern CS\n/P0 SCN\n/Pattern cs\n/P0 scn"
        );

        // Black again, which is the color the stack remembers, but the
        // pattern has to be replaced.
        assert_eq!(
            run(&mut stack, &[GraphicsStateEntry::default()]),
            "0 0 0 RG\n0 0 0 rg"
        );
    }

    #[test]
    fn text_state_only_for_text() {
        let text = GraphicsStateEntry {
            text_scale_x: 0.5,
            text_render_mode: TextRenderingMode::Stroke,
            ..GraphicsStateEntry::default()
        };
        let shape = GraphicsStateEntry {
            text_scale_x: 0.0,
            ..GraphicsStateEntry::default()
        };

        let mut stack = GraphicStack::new();
        assert_eq!(run(&mut stack, &[shape.clone()]), "");
        assert_eq!(run(&mut stack, &[text]), "50 Tz\n1 Tr");
        assert_eq!(run(&mut stack, &[shape]), "");
    }

    #[test]
    fn nesting_is_bounded() {
        let mut stack = GraphicStack::new();
        let mut content = Content::new();

        for _ in 0..MAX_STACK_DEPTH {
            stack.push(&mut content).unwrap();
        }

        assert_eq!(
            stack.push(&mut content),
            Err(FolioError::UnsupportedNestingDepth(MAX_STACK_DEPTH))
        );

        stack.drain(&mut content);
        let ops = String::from_utf8(content.finish()).unwrap();
        assert_eq!(ops.matches('q').count(), ops.matches('Q').count());
    }
}
