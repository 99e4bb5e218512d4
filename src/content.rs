//! Content entries: the draw operators of a device, grouped by the graphics
//! state they need.

use crate::error::FolioResult;
use crate::graphics_state::{GraphicStack, GraphicsStateEntry};
use crate::path::{PathOps, Rect, Shape};
use crate::util::TransformExt;
use pdf_writer::Content;
use std::collections::VecDeque;
use tiny_skia_path::{Path, PathSegment, Transform};

/// The draw operators that share one graphics state.
#[derive(Debug)]
pub(crate) struct ContentEntry {
    pub(crate) state: GraphicsStateEntry,
    data: Vec<u8>,
}

impl ContentEntry {
    fn new(state: GraphicsStateEntry) -> Self {
        Self { state, data: vec![] }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append the operators of one draw.
    pub(crate) fn append(&mut self, content: Content) {
        append_ops(&mut self.data, content.finish());
    }
}

/// The content entries of one device, in painting order.
#[derive(Debug, Default)]
pub(crate) struct ContentEntries {
    entries: VecDeque<ContentEntry>,
}

impl ContentEntries {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been drawn.
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.iter().all(ContentEntry::is_empty)
    }

    /// The entry a draw with the given state should be written into.
    ///
    /// An empty entry at the back is reused, and so is a back entry with the
    /// same state. Draws behind everything else always get a new entry at the
    /// front.
    pub(crate) fn entry_for(
        &mut self,
        state: GraphicsStateEntry,
        behind: bool,
    ) -> &mut ContentEntry {
        let reuse = !behind
            && self
                .entries
                .back()
                .is_some_and(|back| back.is_empty() || back.state == state);

        if reuse {
            let last = self.entries.len() - 1;
            self.entries[last].state = state;
            return &mut self.entries[last];
        }

        if behind {
            self.entries.push_front(ContentEntry::new(state));
            &mut self.entries[0]
        } else {
            self.entries.push_back(ContentEntry::new(state));
            let last = self.entries.len() - 1;
            &mut self.entries[last]
        }
    }

    /// Remove the front entry if nothing was drawn into it.
    pub(crate) fn pop_front_if_empty(&mut self) {
        if self.entries.front().is_some_and(ContentEntry::is_empty) {
            self.entries.pop_front();
        }
    }

    /// Write all entries, each preceded by the operators that establish its
    /// state. Entries without content are left out entirely.
    pub(crate) fn finish(
        self,
        initial: Transform,
        device_bounds: Rect,
        path_ops: &dyn PathOps,
    ) -> FolioResult<Vec<u8>> {
        let mut out = vec![];
        if self.is_empty() {
            return Ok(out);
        }

        if !initial.is_identity() {
            let mut content = Content::new();
            content.transform(initial.to_pdf_transform());
            append_ops(&mut out, content.finish());
        }

        let mut stack = GraphicStack::new();
        for entry in self.entries.into_iter().filter(|e| !e.is_empty()) {
            let mut state_ops = Content::new();
            let visible = stack.update(&entry.state, device_bounds, path_ops, &mut state_ops)?;
            append_ops(&mut out, state_ops.finish());

            if visible {
                append_ops(&mut out, entry.data);
            }
        }

        let mut closing = Content::new();
        stack.drain(&mut closing);
        append_ops(&mut out, closing.finish());

        Ok(out)
    }
}

fn append_ops(out: &mut Vec<u8>, ops: Vec<u8>) {
    if ops.is_empty() {
        return;
    }

    if !out.is_empty() {
        out.push(b'\n');
    }

    out.extend(ops);
}

/// Write a shape as path construction operators.
pub(crate) fn write_shape(content: &mut Content, shape: &Shape) {
    match shape {
        Shape::Empty => {}
        Shape::Rect(rect) => {
            content.rect(rect.x(), rect.y(), rect.width(), rect.height());
        }
        Shape::Path(path, _) => write_path(content, path),
    }
}

/// Write a path as path construction operators. Paths that are an
/// axis-aligned rectangle are written with `re`.
pub(crate) fn write_path(content: &mut Content, path: &Path) {
    if let Some(rect) = as_rect(path) {
        content.rect(rect.x(), rect.y(), rect.width(), rect.height());
        return;
    }

    // Taken from resvg
    fn calc(n1: f32, n2: f32) -> f32 {
        (n1 + n2 * 2.0) / 3.0
    }

    let mut p_prev = None;

    for operation in path.segments() {
        match operation {
            PathSegment::MoveTo(p) => {
                content.move_to(p.x, p.y);
                p_prev = Some(p);
            }
            PathSegment::LineTo(p) => {
                content.line_to(p.x, p.y);
                p_prev = Some(p);
            }
            PathSegment::QuadTo(p1, p2) => {
                // Since PDF doesn't support quad curves, we need to convert them into
                // cubic.
                let prev = p_prev.unwrap_or(p1);
                content.cubic_to(
                    calc(prev.x, p1.x),
                    calc(prev.y, p1.y),
                    calc(p2.x, p1.x),
                    calc(p2.y, p1.y),
                    p2.x,
                    p2.y,
                );
                p_prev = Some(p2);
            }
            PathSegment::CubicTo(p1, p2, p3) => {
                content.cubic_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
                p_prev = Some(p3);
            }
            PathSegment::Close => {
                content.close_path();
            }
        };
    }
}

/// The rectangle a closed four-point path describes, if it is axis-aligned.
pub(crate) fn as_rect(path: &Path) -> Option<Rect> {
    let segments = path.segments().collect::<Vec<_>>();
    let (a, b, c, d) = match segments.as_slice() {
        [
            PathSegment::MoveTo(a),
            PathSegment::LineTo(b),
            PathSegment::LineTo(c),
            PathSegment::LineTo(d),
            PathSegment::Close,
        ] => (a, b, c, d),
        _ => return None,
    };

    let horizontal_first = a.y == b.y && b.x == c.x && c.y == d.y && d.x == a.x;
    let vertical_first = a.x == b.x && b.y == c.y && c.x == d.x && d.y == a.y;

    if horizontal_first || vertical_first {
        let rect = path.bounds();
        (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
    } else {
        None
    }
}
