//! The drawing interface of a page.
//!
//! A [`Surface`] keeps the transform and clip stack of the caller and hands
//! every draw to the current device, together with the resolved state. Raster
//! layers temporarily redirect all draws into a pixmap, which is drawn back
//! as an image when the layer is popped.

use crate::content::as_rect;
use crate::device::{Device, DrawState, PdfDevice};
use crate::error::FolioResult;
use crate::font::GlyphRun;
use crate::object::image::Image;
use crate::paint::{Paint, PaintStyle};
use crate::path::{apply, FillRule, LineCap, Path, PathBuilder, PathOp, Rect, Shape, Stroke};
use crate::serialize::SerializeContext;
use tiny_skia_path::{Point, Transform};
use tracing::{debug, warn};

/// How a list of points is drawn by [`Surface::draw_points`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointMode {
    /// Every point is drawn on its own, as a dot the size of the stroke.
    Points,
    /// Every pair of points is drawn as a separate line.
    Lines,
    /// The points are connected into one open polyline.
    Polygon,
}

enum PushInstruction {
    Transform,
    ClipPath,
    /// Whether a raster device could be created for the layer. If not, the
    /// draws of the layer go to the enclosing device.
    RasterLayer(bool),
}

/// A surface to draw on.
///
/// Every `push_*` call must be matched by a call to [`Surface::pop`]. Whatever
/// is still pushed when the surface is dropped is popped automatically.
pub struct Surface<'a> {
    sc: &'a mut SerializeContext,
    root: &'a mut PdfDevice,
    layers: Vec<Box<dyn Device>>,
    push_instructions: Vec<PushInstruction>,
    state: DrawState,
    saved: Vec<DrawState>,
}

impl<'a> Surface<'a> {
    /// A surface drawing into `root`, where `base` maps user space to
    /// device space.
    pub(crate) fn new(
        sc: &'a mut SerializeContext,
        root: &'a mut PdfDevice,
        base: Transform,
    ) -> Surface<'a> {
        Self {
            sc,
            root,
            layers: vec![],
            push_instructions: vec![],
            state: DrawState::default().with_ctm(base),
            saved: vec![],
        }
    }

    /// Concatenate a transform to the current transformation matrix.
    pub fn push_transform(&mut self, transform: &Transform) {
        self.push_instructions.push(PushInstruction::Transform);
        self.save_state();
        self.state.ctm = self.state.ctm.pre_concat(*transform);
    }

    /// Intersect the clip with a path, given in user space.
    pub fn push_clip_path(&mut self, path: &Path, clip_rule: FillRule) {
        self.push_clip(path_shape(path, clip_rule), PathOp::Intersect);
    }

    /// Intersect the clip with a rectangle, given in user space.
    pub fn push_clip_rect(&mut self, rect: Rect) {
        self.push_clip(Shape::Rect(rect), PathOp::Intersect);
    }

    /// Remove the inside of a path from the clip.
    pub fn push_clip_difference(&mut self, path: &Path, clip_rule: FillRule) {
        self.push_clip(path_shape(path, clip_rule), PathOp::Difference);
    }

    fn push_clip(&mut self, shape: Shape, op: PathOp) {
        self.push_instructions.push(PushInstruction::ClipPath);
        self.save_state();

        let shape = shape.transform(self.state.ctm).unwrap_or_else(|| {
            warn!("clip can't be transformed to device space, clipping everything");
            Shape::Empty
        });
        let shape = match (shape, op) {
            // Removing nothing leaves the clip unchanged.
            (Shape::Empty, PathOp::Difference) => return,
            (shape, _) => shape,
        };
        self.state.clip.push(shape, op);
    }

    /// Draw everything until the matching [`Surface::pop`] into a pixmap
    /// instead, which is then embedded as an image.
    pub fn push_raster_layer(&mut self) {
        self.save_state();
        match self.cur_device().create_compatible() {
            Some(layer) => {
                debug!("starting raster layer");
                self.layers.push(layer);
                self.push_instructions.push(PushInstruction::RasterLayer(true));
            }
            None => {
                warn!("no raster device is available, drawing the layer directly");
                self.push_instructions.push(PushInstruction::RasterLayer(false));
            }
        }
    }

    /// Undo the last `push_*` call.
    pub fn pop(&mut self) {
        let Some(instruction) = self.push_instructions.pop() else {
            warn!("pop without a matching push, ignoring it");
            return;
        };

        match instruction {
            PushInstruction::Transform | PushInstruction::ClipPath => self.restore_state(),
            PushInstruction::RasterLayer(false) => self.restore_state(),
            PushInstruction::RasterLayer(true) => {
                let image = self.layers.pop().and_then(|layer| layer.to_image());
                let origin = self.cur_device().bounds();
                self.restore_state();

                match image {
                    Some(image) => {
                        let state = self.state.with_ctm(Transform::identity());
                        let (x, y) = (origin.x(), origin.y());
                        self.draw_with_state(&state, |device, sc, state| {
                            device.draw_image(sc, state, &image, x, y, &Paint::default())
                        });
                    }
                    None => warn!("failed to convert raster layer to an image, dropping it"),
                }
            }
        }
    }

    /// Draw a path with the style of the paint, using the non-zero rule for
    /// fills.
    pub fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.draw(|device, sc, state| device.draw_path(sc, state, path, FillRule::NonZero, paint));
    }

    /// Fill a path, ignoring the style of the paint.
    pub fn fill_path(&mut self, path: &Path, fill_rule: FillRule, paint: &Paint) {
        let paint = Paint {
            style: PaintStyle::Fill,
            ..paint.clone()
        };
        self.draw(|device, sc, state| device.draw_path(sc, state, path, fill_rule, &paint));
    }

    /// Fill everything inside the clip that is outside of the path.
    pub fn fill_path_inverse(&mut self, path: &Path, fill_rule: FillRule, paint: &Paint) {
        let Some(clip_bounds) = self.state.clip.bounds(self.cur_device().bounds()) else {
            debug!("clip is empty, skipping inverse fill");
            return;
        };
        let Some(inside) = path_shape(path, fill_rule).transform(self.state.ctm) else {
            warn!("path can't be transformed to device space, skipping inverse fill");
            return;
        };

        let clip = Shape::Rect(clip_bounds);
        let outside = match apply(&*self.sc.path_ops, &clip, &inside, PathOp::Difference) {
            Ok(outside) => outside,
            Err(error) => {
                warn!("{error}, skipping inverse fill");
                return;
            }
        };
        // The path covers the whole clip.
        let Some((outside, rule)) = outside.to_path() else {
            return;
        };

        let state = self.state.with_ctm(Transform::identity());
        self.fill_path_with_state(&state, &outside, rule, paint);
    }

    pub fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.draw_path(&PathBuilder::from_rect(rect), paint);
    }

    /// Fill the whole clip region with a paint.
    pub fn draw_paint(&mut self, paint: &Paint) {
        let Some(clip_bounds) = self.state.clip.bounds(self.cur_device().bounds()) else {
            debug!("clip is empty, skipping paint");
            return;
        };

        let state = self.state.with_ctm(Transform::identity());
        let path = PathBuilder::from_rect(clip_bounds);
        self.fill_path_with_state(&state, &path, FillRule::NonZero, paint);
    }

    /// Draw a list of points with the stroke of the paint. A paint without a
    /// stroke draws hairlines.
    pub fn draw_points(&mut self, mode: PointMode, points: &[Point], paint: &Paint) {
        let stroke = paint.style.stroke().cloned().unwrap_or(Stroke::with_width(0.0));
        let stroke_paint = Paint {
            style: PaintStyle::Stroke(stroke.clone()),
            ..paint.clone()
        };

        match mode {
            PointMode::Points => {
                let size = if stroke.width > 0.0 { stroke.width } else { 1.0 };
                for point in points {
                    let dot = if stroke.line_cap == LineCap::Round {
                        PathBuilder::from_circle(point.x, point.y, size / 2.0)
                    } else {
                        Rect::from_xywh(point.x - size / 2.0, point.y - size / 2.0, size, size)
                            .map(PathBuilder::from_rect)
                    };

                    if let Some(dot) = dot {
                        self.fill_path(&dot, FillRule::NonZero, paint);
                    }
                }
            }
            PointMode::Lines => {
                for pair in points.chunks_exact(2) {
                    let mut builder = PathBuilder::new();
                    builder.move_to(pair[0].x, pair[0].y);
                    builder.line_to(pair[1].x, pair[1].y);
                    if let Some(line) = builder.finish() {
                        self.draw_path(&line, &stroke_paint);
                    }
                }
            }
            PointMode::Polygon => {
                let mut builder = PathBuilder::new();
                for (i, point) in points.iter().enumerate() {
                    if i == 0 {
                        builder.move_to(point.x, point.y);
                    } else {
                        builder.line_to(point.x, point.y);
                    }
                }

                if let Some(polyline) = builder.finish() {
                    self.draw_path(&polyline, &stroke_paint);
                }
            }
        }
    }

    /// Draw an image with its top left corner at `(x, y)`. Alpha-only images
    /// are drawn with the color of the paint.
    pub fn draw_image(&mut self, image: &Image, x: f32, y: f32, paint: &Paint) {
        self.draw(|device, sc, state| device.draw_image(sc, state, image, x, y, paint));
    }

    /// Draw the paint through the coverage of an image.
    pub fn draw_mask_image(&mut self, image: &Image, x: f32, y: f32, paint: &Paint) {
        let mask = image.alpha_mask();
        self.draw_image(&mask, x, y, paint);
    }

    pub fn draw_glyphs(&mut self, run: &GlyphRun, paint: &Paint) {
        self.draw(|device, sc, state| device.draw_glyph_run(sc, state, run, paint));
    }

    fn fill_path_with_state(
        &mut self,
        state: &DrawState,
        path: &Path,
        fill_rule: FillRule,
        paint: &Paint,
    ) {
        let paint = Paint {
            style: PaintStyle::Fill,
            ..paint.clone()
        };
        self.draw_with_state(state, |device, sc, state| {
            device.draw_path(sc, state, path, fill_rule, &paint)
        });
    }

    fn draw(
        &mut self,
        f: impl FnOnce(&mut dyn Device, &mut SerializeContext, &DrawState) -> FolioResult<()>,
    ) {
        let state = std::mem::take(&mut self.state);
        self.draw_with_state(&state, f);
        self.state = state;
    }

    fn draw_with_state(
        &mut self,
        state: &DrawState,
        f: impl FnOnce(&mut dyn Device, &mut SerializeContext, &DrawState) -> FolioResult<()>,
    ) {
        let device = Self::cur_device_mut(&mut *self.root, &mut self.layers);
        if let Err(error) = f(device, &mut *self.sc, state) {
            self.sc.poison(error);
        }
    }

    fn cur_device(&self) -> &dyn Device {
        match self.layers.last() {
            Some(layer) => layer.as_ref(),
            None => &*self.root as &dyn Device,
        }
    }

    fn cur_device_mut<'b>(
        root: &'b mut PdfDevice,
        layers: &'b mut [Box<dyn Device>],
    ) -> &'b mut dyn Device {
        match layers.last_mut() {
            Some(layer) => layer.as_mut(),
            None => root as &mut dyn Device,
        }
    }

    fn save_state(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore_state(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }
}

/// Paths that are axis-aligned rectangles become rectangle shapes, which
/// clips and path operations handle exactly.
fn path_shape(path: &Path, fill_rule: FillRule) -> Shape {
    match as_rect(path) {
        Some(rect) => Shape::Rect(rect),
        None => Shape::Path(path.clone(), fill_rule),
    }
}

impl Drop for Surface<'_> {
    fn drop(&mut self) {
        while !self.push_instructions.is_empty() {
            self.pop();
        }
    }
}
