//! Drawing devices.
//!
//! A device receives draws that have already been resolved against the
//! transform and clip stack of a [`Surface`](crate::surface::Surface). The
//! PDF device turns them into content entries. The raster device, which only
//! exists with the `raster` feature, paints them into a pixmap, for content
//! that has to end up as an image.

use crate::clip::ClipStack;
use crate::error::FolioResult;
use crate::font::GlyphRun;
use crate::object::image::Image;
use crate::paint::Paint;
use crate::path::{FillRule, Path, Rect};
use crate::serialize::SerializeContext;
use tiny_skia_path::Transform;

pub(crate) mod pdf;
#[cfg(feature = "raster")]
pub(crate) mod raster;

pub(crate) use pdf::PdfDevice;

/// The transform and clip a draw happens under.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawState {
    /// Maps user space to device space.
    pub(crate) ctm: Transform,
    /// The clip, in device space.
    pub(crate) clip: ClipStack,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            ctm: Transform::identity(),
            clip: ClipStack::new(),
        }
    }
}

impl DrawState {
    #[must_use]
    pub(crate) fn with_ctm(&self, ctm: Transform) -> Self {
        Self {
            ctm,
            clip: self.clip.clone(),
        }
    }
}

pub(crate) trait Device {
    /// The area of the device, in device units.
    fn bounds(&self) -> Rect;

    fn draw_path(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        path: &Path,
        fill_rule: FillRule,
        paint: &Paint,
    ) -> FolioResult<()>;

    /// Draw an image with its top left corner at `(x, y)`, one pixel per
    /// user space unit.
    fn draw_image(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        image: &Image,
        x: f32,
        y: f32,
        paint: &Paint,
    ) -> FolioResult<()>;

    fn draw_glyph_run(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        run: &GlyphRun,
        paint: &Paint,
    ) -> FolioResult<()>;

    /// A device of the same size that paints into pixels, if one is
    /// available.
    fn create_compatible(&self) -> Option<Box<dyn Device>>;

    /// The content of the device as an image. Only pixel-based devices can
    /// provide one.
    fn to_image(&self) -> Option<Image>;
}

/// The transform that places a glyph outline, given in font units with the y
/// axis pointing up, at a glyph origin.
pub(crate) fn glyph_outline_transform(run: &GlyphRun, x: f32, y: f32) -> Transform {
    let scale = run.size / run.font.units_per_em();
    Transform::from_translate(x, y).pre_scale(scale * run.text_scale_x, -scale)
}

/// The transform that places a glyph image, given the rectangle it covers
/// relative to the glyph origin.
pub(crate) fn glyph_image_transform(image: &Image, rect: Rect, x: f32, y: f32) -> Transform {
    Transform::from_translate(x + rect.x(), y + rect.y()).pre_scale(
        rect.width() / image.width() as f32,
        rect.height() / image.height() as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;
    use tiny_skia_path::Point;

    #[test]
    fn outlines_are_flipped_and_scaled() {
        let run = StandardFont::helvetica()
            .layout("A", 10.0, 0.0, 0.0)
            .with_text_scale_x(2.0);
        let ts = glyph_outline_transform(&run, 5.0, 20.0);

        let mut point = Point::from_xy(1000.0, 1000.0);
        ts.map_point(&mut point);
        assert_eq!(point, Point::from_xy(25.0, 10.0));
    }
}
