//! Path-related properties and the boolean path operations used for clipping.

use crate::error::{FolioError, FolioResult};
use crate::util::RectExt;
pub use tiny_skia_path::{Path, PathBuilder, Rect};
use tiny_skia_path::Transform;

/// A line cap.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Hash)]
pub enum LineCap {
    /// The butt line cap.
    #[default]
    Butt,
    /// The round line cap.
    Round,
    /// The square line cap.
    Square,
}

impl LineCap {
    pub(crate) fn to_pdf(self) -> i64 {
        match self {
            LineCap::Butt => 0,
            LineCap::Round => 1,
            LineCap::Square => 2,
        }
    }
}

/// A line join.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Hash)]
pub enum LineJoin {
    /// The miter line join.
    #[default]
    Miter,
    /// The round line join.
    Round,
    /// The bevel line join.
    Bevel,
}

impl LineJoin {
    pub(crate) fn to_pdf(self) -> i64 {
        match self {
            LineJoin::Miter => 0,
            LineJoin::Round => 1,
            LineJoin::Bevel => 2,
        }
    }
}

/// A stroke dash.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDash {
    /// The dash array.
    pub array: Vec<f32>,
    /// The offset of the dash.
    pub offset: f32,
}

impl StrokeDash {
    /// Create a new stroke dash.
    pub fn new(array: impl IntoIterator<Item = f32>, offset: f32) -> Self {
        Self {
            array: array.into_iter().collect(),
            offset,
        }
    }
}

/// The geometry of a stroke. The color of a stroke comes from its paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// The width of the stroke. A width of zero is a hairline.
    pub width: f32,
    /// The miter limit of the stroke.
    pub miter_limit: f32,
    /// The line cap of the stroke.
    pub line_cap: LineCap,
    /// The line join of the stroke.
    pub line_join: LineJoin,
    /// The (optional) dash of the stroke.
    pub dash: Option<StrokeDash>,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            width: 1.0,
            miter_limit: 4.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            dash: None,
        }
    }
}

impl Stroke {
    /// Create a stroke with the given width and default geometry otherwise.
    pub fn with_width(width: f32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub(crate) fn to_tiny_skia(&self) -> tiny_skia_path::Stroke {
        let mut stroke = tiny_skia_path::Stroke {
            width: self.width,
            miter_limit: self.miter_limit,
            line_cap: match self.line_cap {
                LineCap::Butt => tiny_skia_path::LineCap::Butt,
                LineCap::Round => tiny_skia_path::LineCap::Round,
                LineCap::Square => tiny_skia_path::LineCap::Square,
            },
            line_join: match self.line_join {
                LineJoin::Miter => tiny_skia_path::LineJoin::Miter,
                LineJoin::Round => tiny_skia_path::LineJoin::Round,
                LineJoin::Bevel => tiny_skia_path::LineJoin::Bevel,
            },
            dash: None,
        };

        if let Some(stroke_dash) = &self.dash {
            stroke.dash =
                tiny_skia_path::StrokeDash::new(stroke_dash.array.clone(), stroke_dash.offset);
        }

        stroke
    }

    /// The outline of `path` stroked with this stroke, in the coordinate
    /// space of the path.
    pub(crate) fn outline(&self, path: &Path) -> Option<Path> {
        let mut stroke = self.to_tiny_skia();
        // Hairlines still cover some area.
        stroke.width = stroke.width.max(1.0);
        path.stroke(&stroke, 1.0)
    }
}

/// A fill rule.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Default)]
pub enum FillRule {
    /// The `non-zero` fill rule.
    #[default]
    NonZero,
    /// The `even-odd` fill rule.
    EvenOdd,
}

/// A region of the device, used for clips and for the coverage of a draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A region that covers nothing.
    Empty,
    Rect(Rect),
    Path(Path, FillRule),
}

impl Shape {
    /// Map the shape with a transform. Rectangles stay rectangles as long as
    /// the transform has no rotation or skew.
    pub fn transform(self, ts: Transform) -> Option<Shape> {
        match self {
            Shape::Empty => Some(Shape::Empty),
            Shape::Rect(rect) if !ts.has_skew() => rect.transform(ts).map(Shape::Rect),
            Shape::Rect(rect) => PathBuilder::from_rect(rect)
                .transform(ts)
                .map(|path| Shape::Path(path, FillRule::NonZero)),
            Shape::Path(path, rule) => path.transform(ts).map(|path| Shape::Path(path, rule)),
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Shape::Empty => None,
            Shape::Rect(rect) => Some(*rect),
            Shape::Path(path, _) => Some(path.bounds()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Shape::Empty)
    }

    pub(crate) fn to_path(&self) -> Option<(Path, FillRule)> {
        match self {
            Shape::Empty => None,
            Shape::Rect(rect) => Some((PathBuilder::from_rect(*rect), FillRule::NonZero)),
            Shape::Path(path, rule) => Some((path.clone(), *rule)),
        }
    }
}

/// A boolean operation between two shapes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathOp {
    /// Keep what is inside both shapes.
    Intersect,
    /// Keep what is inside the first shape but outside the second.
    Difference,
}

/// Boolean operations on shapes.
///
/// Implementations may give up on inputs they cannot handle by returning
/// `None`. Draws that depend on a failed operation are skipped.
pub trait PathOps {
    fn op(&self, a: &Shape, b: &Shape, op: PathOp) -> Option<Shape>;
}

/// Apply a path operation, turning a failure into an error.
pub(crate) fn apply(
    path_ops: &dyn PathOps,
    a: &Shape,
    b: &Shape,
    op: PathOp,
) -> FolioResult<Shape> {
    path_ops.op(a, b, op).ok_or(FolioError::GeometryFailure)
}

/// Path operations that handle rectangles exactly, and paths only in the
/// trivial cases where the result is one of the inputs or nothing.
#[derive(Debug, Default, Copy, Clone)]
pub struct BasicPathOps;

impl PathOps for BasicPathOps {
    fn op(&self, a: &Shape, b: &Shape, op: PathOp) -> Option<Shape> {
        let (Some(a_bounds), Some(b_bounds)) = (a.bounds(), b.bounds()) else {
            return Some(match op {
                PathOp::Intersect => Shape::Empty,
                PathOp::Difference => a.clone(),
            });
        };

        if a_bounds.is_disjoint(&b_bounds) {
            return Some(match op {
                PathOp::Intersect => Shape::Empty,
                PathOp::Difference => a.clone(),
            });
        }

        match (a, b, op) {
            (Shape::Rect(a), Shape::Rect(b), PathOp::Intersect) => {
                Some(a.intersect(b).map(rect_shape).unwrap_or(Shape::Empty))
            }
            (Shape::Rect(a), Shape::Rect(b), PathOp::Difference) => Some(rect_difference(a, b)),
            (Shape::Rect(rect), Shape::Path(..), PathOp::Intersect)
                if rect.contains_rect(&b_bounds) =>
            {
                Some(b.clone())
            }
            (Shape::Path(..), Shape::Rect(rect), PathOp::Intersect)
                if rect.contains_rect(&a_bounds) =>
            {
                Some(a.clone())
            }
            (Shape::Path(..), Shape::Rect(rect), PathOp::Difference)
                if rect.contains_rect(&a_bounds) =>
            {
                Some(Shape::Empty)
            }
            _ => None,
        }
    }
}

fn rect_shape(rect: Rect) -> Shape {
    if rect.width() > 0.0 && rect.height() > 0.0 {
        Shape::Rect(rect)
    } else {
        Shape::Empty
    }
}

/// `a` minus `b`, as up to four disjoint rectangles.
fn rect_difference(a: &Rect, b: &Rect) -> Shape {
    let Some(b) = a.intersect(b) else {
        return Shape::Rect(*a);
    };

    let pieces = [
        (a.left(), a.top(), a.right(), b.top()),
        (a.left(), b.bottom(), a.right(), a.bottom()),
        (a.left(), b.top(), b.left(), b.bottom()),
        (b.right(), b.top(), a.right(), b.bottom()),
    ];

    let rects = pieces
        .into_iter()
        .filter(|(l, t, r, b)| r > l && b > t)
        .filter_map(|(l, t, r, b)| Rect::from_ltrb(l, t, r, b))
        .collect::<Vec<_>>();

    match rects.as_slice() {
        [] => Shape::Empty,
        [rect] => Shape::Rect(*rect),
        _ => {
            let mut builder = PathBuilder::new();
            for rect in &rects {
                builder.push_rect(*rect);
            }

            builder
                .finish()
                .map(|path| Shape::Path(path, FillRule::NonZero))
                .unwrap_or(Shape::Empty)
        }
    }
}
