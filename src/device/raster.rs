//! A device that paints into a pixmap with tiny-skia.
//!
//! It is used for layers that have to be composited in ways no PDF
//! construct can express. Its pixels end up in the document as an image.

use crate::blend_mode::BlendMode;
use crate::clip::ClipStack;
use crate::device::{glyph_image_transform, glyph_outline_transform, Device, DrawState};
use crate::error::FolioResult;
use crate::font::GlyphRun;
use crate::object::image::Image;
use crate::paint::{Paint, PaintStyle, Shader, Stop};
use crate::path::{FillRule, Path, Rect};
use crate::serialize::SerializeContext;
use tiny_skia::{
    ColorU8, FilterQuality, GradientStop, Mask, Pixmap, PixmapPaint, Point, SpreadMode,
};
use tiny_skia_path::Transform;
use tracing::{debug, warn};

pub(crate) struct RasterDevice {
    bounds: Rect,
    pixmap: Pixmap,
}

impl RasterDevice {
    /// A transparent device that covers `bounds`, one pixel per device unit.
    pub(crate) fn new(bounds: Rect) -> Option<Self> {
        let pixmap = Pixmap::new(
            bounds.right().ceil() as u32,
            bounds.bottom().ceil() as u32,
        )?;

        Some(Self { bounds, pixmap })
    }

    /// The mask of a clip, or `None` if nothing is clipped away.
    fn clip_mask(&self, clip: &ClipStack, sc: &SerializeContext) -> Option<Option<Mask>> {
        if clip.is_wide_open() {
            return Some(None);
        }

        let shapes = match clip.resolve(self.bounds(), &*sc.path_ops) {
            Ok(shapes) => shapes,
            Err(error) => {
                warn!("{error}, skipping draw");
                return None;
            }
        };

        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
        for (i, shape) in shapes.iter().enumerate() {
            // An empty shape leaves the mask empty.
            let Some((path, fill_rule)) = shape.to_path() else {
                return Some(Some(Mask::new(self.pixmap.width(), self.pixmap.height())?));
            };

            let fill_rule = convert_fill_rule(fill_rule);
            if i == 0 {
                mask.fill_path(&path, fill_rule, true, Transform::identity());
            } else {
                mask.intersect_path(&path, fill_rule, true, Transform::identity());
            }
        }

        Some(Some(mask))
    }
}

impl Device for RasterDevice {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn draw_path(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        path: &Path,
        fill_rule: FillRule,
        paint: &Paint,
    ) -> FolioResult<()> {
        let Some(mask) = self.clip_mask(&state.clip, sc) else {
            return Ok(());
        };
        let Some(sk_paint) = convert_paint(paint) else {
            debug!("paint can't be rasterized, skipping draw");
            return Ok(());
        };

        if matches!(paint.style, PaintStyle::Fill | PaintStyle::FillAndStroke(_)) {
            self.pixmap.fill_path(
                path,
                &sk_paint,
                convert_fill_rule(fill_rule),
                state.ctm,
                mask.as_ref(),
            );
        }

        if let Some(stroke) = paint.style.stroke() {
            self.pixmap.stroke_path(
                path,
                &sk_paint,
                &stroke.to_tiny_skia(),
                state.ctm,
                mask.as_ref(),
            );
        }

        Ok(())
    }

    fn draw_image(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        image: &Image,
        x: f32,
        y: f32,
        paint: &Paint,
    ) -> FolioResult<()> {
        let Some(mask) = self.clip_mask(&state.clip, sc) else {
            return Ok(());
        };
        let color = [paint.color.r, paint.color.g, paint.color.b];
        let Some(pixmap) = to_pixmap(image, color) else {
            warn!("failed to convert an image to a pixmap, skipping it");
            return Ok(());
        };

        let pixmap_paint = PixmapPaint {
            opacity: paint.opacity.get(),
            blend_mode: convert_blend_mode(paint.blend_mode),
            quality: FilterQuality::Bilinear,
        };

        self.pixmap.draw_pixmap(
            0,
            0,
            pixmap.as_ref(),
            &pixmap_paint,
            state.ctm.pre_translate(x, y),
            mask.as_ref(),
        );

        Ok(())
    }

    fn draw_glyph_run(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        run: &GlyphRun,
        paint: &Paint,
    ) -> FolioResult<()> {
        for glyph in &run.glyphs {
            if let Some(outline) = run.font.outline(glyph.id) {
                let ctm = state
                    .ctm
                    .pre_concat(glyph_outline_transform(run, glyph.x, glyph.y));
                self.draw_path(sc, &state.with_ctm(ctm), &outline, FillRule::NonZero, paint)?;
            } else if let Some((image, rect)) = run.font.glyph_image(glyph.id, run.size) {
                let ctm = state
                    .ctm
                    .pre_concat(glyph_image_transform(&image, rect, glyph.x, glyph.y));
                self.draw_image(sc, &state.with_ctm(ctm), &image, 0.0, 0.0, paint)?;
            } else {
                debug!("glyph {} has no outline to rasterize, skipping it", glyph.id);
            }
        }

        Ok(())
    }

    fn create_compatible(&self) -> Option<Box<dyn Device>> {
        RasterDevice::new(self.bounds).map(|device| Box::new(device) as Box<dyn Device>)
    }

    fn to_image(&self) -> Option<Image> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        Image::from_rgba8(self.pixmap.width(), self.pixmap.height(), &data)
    }
}

fn to_pixmap(image: &Image, color: [u8; 3]) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    let rgba = image.to_rgba8(color);

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }

    Some(pixmap)
}

fn convert_paint(paint: &Paint) -> Option<tiny_skia::Paint<'static>> {
    let paint = paint.simplified();
    let alpha = (paint.opacity.get() * 255.0).round() as u8;

    let mut sk_paint = tiny_skia::Paint {
        blend_mode: convert_blend_mode(paint.blend_mode),
        anti_alias: true,
        ..tiny_skia::Paint::default()
    };

    match &paint.shader {
        None => {
            let c = paint.color;
            sk_paint.set_color_rgba8(c.r, c.g, c.b, alpha);
        }
        Some(shader) => sk_paint.shader = convert_shader(shader, alpha)?,
    }

    Some(sk_paint)
}

fn convert_shader(shader: &Shader, alpha: u8) -> Option<tiny_skia::Shader<'static>> {
    let stops = |stops: &[Stop]| {
        stops
            .iter()
            .map(|stop| {
                let c = stop.color;
                GradientStop::new(
                    stop.offset.get(),
                    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, alpha),
                )
            })
            .collect::<Vec<_>>()
    };

    match shader {
        Shader::LinearGradient(lg) => tiny_skia::LinearGradient::new(
            Point::from_xy(lg.x1, lg.y1),
            Point::from_xy(lg.x2, lg.y2),
            stops(&lg.stops),
            SpreadMode::Pad,
            lg.transform,
        ),
        Shader::RadialGradient(rg) => {
            if rg.fr != 0.0 {
                debug!("start radius of radial gradient is ignored when rasterizing");
            }

            tiny_skia::RadialGradient::new(
                Point::from_xy(rg.fx, rg.fy),
                Point::from_xy(rg.cx, rg.cy),
                rg.cr,
                stops(&rg.stops),
                SpreadMode::Pad,
                rg.transform,
            )
        }
    }
}

fn convert_fill_rule(fill_rule: FillRule) -> tiny_skia::FillRule {
    match fill_rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

fn convert_blend_mode(blend_mode: BlendMode) -> tiny_skia::BlendMode {
    match blend_mode {
        BlendMode::Clear => tiny_skia::BlendMode::Clear,
        BlendMode::Source => tiny_skia::BlendMode::Source,
        BlendMode::Destination => tiny_skia::BlendMode::Destination,
        BlendMode::SourceOver => tiny_skia::BlendMode::SourceOver,
        BlendMode::DestinationOver => tiny_skia::BlendMode::DestinationOver,
        BlendMode::SourceIn => tiny_skia::BlendMode::SourceIn,
        BlendMode::DestinationIn => tiny_skia::BlendMode::DestinationIn,
        BlendMode::SourceOut => tiny_skia::BlendMode::SourceOut,
        BlendMode::DestinationOut => tiny_skia::BlendMode::DestinationOut,
        BlendMode::SourceAtop => tiny_skia::BlendMode::SourceAtop,
        BlendMode::DestinationAtop => tiny_skia::BlendMode::DestinationAtop,
        BlendMode::Xor => tiny_skia::BlendMode::Xor,
        BlendMode::Plus => tiny_skia::BlendMode::Plus,
        BlendMode::Modulate => tiny_skia::BlendMode::Modulate,
        BlendMode::Screen => tiny_skia::BlendMode::Screen,
        BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
        BlendMode::Darken => tiny_skia::BlendMode::Darken,
        BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
        BlendMode::ColorDodge => tiny_skia::BlendMode::ColorDodge,
        BlendMode::ColorBurn => tiny_skia::BlendMode::ColorBurn,
        BlendMode::HardLight => tiny_skia::BlendMode::HardLight,
        BlendMode::SoftLight => tiny_skia::BlendMode::SoftLight,
        BlendMode::Difference => tiny_skia::BlendMode::Difference,
        BlendMode::Exclusion => tiny_skia::BlendMode::Exclusion,
        BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        BlendMode::Hue => tiny_skia::BlendMode::Hue,
        BlendMode::Saturation => tiny_skia::BlendMode::Saturation,
        BlendMode::Color => tiny_skia::BlendMode::Color,
        BlendMode::Luminosity => tiny_skia::BlendMode::Luminosity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::path::{PathOp, Shape};
    use crate::serialize::SerializeSettings;
    use crate::tests::{rect, rect_to_path, red_paint};

    fn setup() -> (SerializeContext, RasterDevice) {
        let sc = SerializeContext::new(SerializeSettings::default_test());
        let device = RasterDevice::new(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        (sc, device)
    }

    fn pixel(image: &Image, x: usize, y: usize) -> [u8; 4] {
        let rgba = image.to_rgba8([0, 0, 0]);
        let i = (y * image.width() as usize + x) * 4;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    #[test]
    fn fills_are_painted() {
        let (mut sc, mut device) = setup();
        device
            .draw_path(
                &mut sc,
                &DrawState::default(),
                &rect_to_path(0.0, 0.0, 5.0, 10.0),
                FillRule::NonZero,
                &red_paint(),
            )
            .unwrap();

        let image = device.to_image().unwrap();
        assert_eq!(pixel(&image, 2, 5), [255, 0, 0, 255]);
        assert_eq!(pixel(&image, 7, 5)[3], 0);
    }

    #[test]
    fn clip_limits_the_fill() {
        let (mut sc, mut device) = setup();
        let mut clip = ClipStack::new();
        clip.push(Shape::Rect(rect(0.0, 0.0, 10.0, 5.0)), PathOp::Intersect);
        let state = DrawState {
            ctm: Transform::identity(),
            clip,
        };

        device
            .draw_path(
                &mut sc,
                &state,
                &rect_to_path(0.0, 0.0, 10.0, 10.0),
                FillRule::NonZero,
                &red_paint(),
            )
            .unwrap();

        let image = device.to_image().unwrap();
        assert_eq!(pixel(&image, 5, 2)[3], 255);
        assert_eq!(pixel(&image, 5, 8)[3], 0);
    }

    #[test]
    fn clear_erases() {
        let (mut sc, mut device) = setup();
        let full = rect_to_path(0.0, 0.0, 10.0, 10.0);
        device
            .draw_path(&mut sc, &DrawState::default(), &full, FillRule::NonZero, &red_paint())
            .unwrap();
        device
            .draw_path(
                &mut sc,
                &DrawState::default(),
                &rect_to_path(0.0, 0.0, 5.0, 10.0),
                FillRule::NonZero,
                &red_paint().with_blend_mode(BlendMode::Clear),
            )
            .unwrap();

        let image = device.to_image().unwrap();
        assert_eq!(pixel(&image, 2, 5)[3], 0);
        assert_eq!(pixel(&image, 7, 5)[3], 255);
    }

    #[test]
    fn source_in_keeps_only_the_overlap() {
        let (mut sc, mut device) = setup();
        let blue = Paint::from(Color::new(0, 0, 255));
        device
            .draw_path(
                &mut sc,
                &DrawState::default(),
                &rect_to_path(0.0, 0.0, 6.0, 10.0),
                FillRule::NonZero,
                &blue,
            )
            .unwrap();
        device
            .draw_path(
                &mut sc,
                &DrawState::default(),
                &rect_to_path(4.0, 0.0, 6.0, 10.0),
                FillRule::NonZero,
                &red_paint().with_blend_mode(BlendMode::SourceIn),
            )
            .unwrap();

        let image = device.to_image().unwrap();
        // Where both overlap the source replaces the destination.
        assert_eq!(pixel(&image, 5, 5), [255, 0, 0, 255]);
        // Without a destination below it the source disappears.
        assert_eq!(pixel(&image, 8, 5)[3], 0);
        // Outside of the source the destination is untouched.
        assert_eq!(pixel(&image, 1, 5), [0, 0, 255, 255]);
    }

    #[test]
    fn alpha_images_take_the_paint_color() {
        let (mut sc, mut device) = setup();
        let image = Image::from_alpha8(1, 1, &[255]).unwrap();
        device
            .draw_image(&mut sc, &DrawState::default(), &image, 3.0, 3.0, &red_paint())
            .unwrap();

        let image = device.to_image().unwrap();
        assert_eq!(pixel(&image, 3, 3), [255, 0, 0, 255]);
        assert_eq!(pixel(&image, 0, 0)[3], 0);
    }
}
