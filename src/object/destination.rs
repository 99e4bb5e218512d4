//! Destinations within a document.

use crate::graph::ObjRef;
use crate::primitive::Object;
use tiny_skia_path::Point;

/// A destination that shows a point of a page at the top left of the
/// viewer, keeping the current zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct XyzDestination {
    page: ObjRef,
    point: Point,
}

impl XyzDestination {
    pub(crate) fn new(page: ObjRef, point: Point) -> Self {
        Self { page, point }
    }

    /// The destination array. Points are given with the y axis pointing down,
    /// so they are flipped with the height of the page.
    pub(crate) fn to_array(self, page_height: f32) -> Object {
        Object::Array(vec![
            self.page.into(),
            Object::name("XYZ"),
            Object::Real(self.point.x),
            Object::Real(page_height - self.point.y),
            Object::Null,
        ])
    }
}
