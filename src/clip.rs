//! Clip stacks.
//!
//! A clip stack records every clip operation that is in effect, in device
//! space. Two stacks are equal when they consist of the same operations, even
//! if a different sequence would describe the same region.

use crate::content::write_shape;
use crate::error::FolioResult;
use crate::path::{apply, FillRule, PathOp, PathOps, Rect, Shape};
use pdf_writer::Content;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClipElement {
    pub(crate) shape: Shape,
    pub(crate) op: PathOp,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ClipStack {
    elements: Vec<ClipElement>,
}

impl ClipStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is clipped away.
    pub(crate) fn is_wide_open(&self) -> bool {
        self.elements.is_empty()
    }

    pub(crate) fn push(&mut self, shape: Shape, op: PathOp) {
        self.elements.push(ClipElement { shape, op });
    }

    /// A rectangle that contains everything the clip lets through.
    pub(crate) fn bounds(&self, device_bounds: Rect) -> Option<Rect> {
        let mut bounds = device_bounds;

        for element in &self.elements {
            if element.op == PathOp::Intersect {
                bounds = bounds.intersect(&element.shape.bounds()?)?;
            }
        }

        Some(bounds)
    }

    /// The shapes that have to be intersected, one after the other, to
    /// produce the clip region.
    pub(crate) fn resolve(
        &self,
        device_bounds: Rect,
        path_ops: &dyn PathOps,
    ) -> FolioResult<Vec<Shape>> {
        if self.elements.iter().all(|e| e.op == PathOp::Intersect) {
            let mut rect = Some(device_bounds);
            let mut shapes = vec![];

            for element in &self.elements {
                match &element.shape {
                    Shape::Rect(r) => rect = rect.and_then(|rect| rect.intersect(r)),
                    Shape::Empty => rect = None,
                    shape => shapes.push(shape.clone()),
                }
            }

            let rect = rect.map(Shape::Rect).unwrap_or(Shape::Empty);
            shapes.insert(0, rect);
            return Ok(shapes);
        }

        let mut region = Shape::Rect(device_bounds);
        for element in &self.elements {
            region = apply(path_ops, &region, &element.shape, element.op)?;
        }

        Ok(vec![region])
    }
}

/// Write the clip operators for resolved clip shapes.
pub(crate) fn write_clip(shapes: &[Shape], content: &mut Content) {
    for shape in shapes {
        match shape {
            Shape::Empty => {
                content.rect(0.0, 0.0, 0.0, 0.0);
                content.clip_nonzero();
            }
            shape => {
                write_shape(content, shape);
                match shape {
                    Shape::Path(_, FillRule::EvenOdd) => content.clip_even_odd(),
                    _ => content.clip_nonzero(),
                };
            }
        }

        content.end_path();
    }
}
