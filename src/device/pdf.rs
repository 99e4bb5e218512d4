//! The device that turns draws into PDF content.
//!
//! Every draw is written into a content entry that carries the graphics
//! state it needs. Blend modes PDF can express go into the ExtGState of the
//! entry. For the Porter-Duff modes it can't express, the content drawn so
//! far is moved into a form XObject before the draw, the draw itself is moved
//! into a second one afterwards, and the two are recombined through soft
//! masks as described by [`composite_plan`].

use crate::blend_mode::{composite_plan, BlendMode, Layer, Treatment};
use crate::clip::ClipStack;
use crate::content::{write_path, write_shape, ContentEntries};
use crate::device::{glyph_image_transform, glyph_outline_transform, Device, DrawState};
use crate::error::{FolioError, FolioResult};
use crate::font::positioner::show_glyph_run;
use crate::font::{Glyph, GlyphRun};
use crate::graph::ObjRef;
use crate::graphics_state::GraphicsStateEntry;
use crate::object::ext_g_state::{ExtGState, SoftMask};
use crate::object::image::Image;
use crate::object::mask::{Mask, MaskType};
use crate::object::shading::register_shader;
use crate::object::xobject::FormXObject;
use crate::paint::{Paint, PaintStyle};
use crate::path::{FillRule, Path, Rect, Shape};
use crate::resource::ResourceDictionary;
use crate::serialize::SerializeContext;
use pdf_writer::types::TextRenderingMode;
use pdf_writer::{Content, Name};
use tiny_skia_path::{NormalizedF32, Transform};
use tracing::{debug, warn};

/// Everything about a draw that decides which content entry it goes into.
struct DrawInfo<'a> {
    paint: &'a Paint,
    /// Whether the draw is opaque wherever it covers anything.
    opaque: bool,
    /// The area the draw covers, in device space, if it is known.
    shape: Option<Shape>,
    /// The transform of the content entry.
    transform: Transform,
    /// The horizontal scale of text draws. `None` for everything else.
    text_scale_x: Option<f32>,
}

pub(crate) struct PdfDevice {
    bounds: Rect,
    /// Maps device space to the default coordinate space of the content.
    initial_transform: Transform,
    entries: ContentEntries,
    resources: ResourceDictionary,
}

impl PdfDevice {
    pub(crate) fn new(bounds: Rect, initial_transform: Transform) -> Self {
        Self {
            bounds,
            initial_transform,
            entries: ContentEntries::new(),
            resources: ResourceDictionary::new(),
        }
    }

    pub(crate) fn has_content(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The content stream and the resources it uses.
    pub(crate) fn finish(
        self,
        sc: &SerializeContext,
    ) -> FolioResult<(Vec<u8>, ResourceDictionary)> {
        let content = self
            .entries
            .finish(self.initial_transform, self.bounds, &*sc.path_ops)?;
        Ok((content, self.resources))
    }

    /// Move everything drawn so far into a form XObject, leaving the device
    /// empty.
    fn snapshot(&mut self, sc: &mut SerializeContext, luminosity: bool) -> FolioResult<ObjRef> {
        let entries = std::mem::take(&mut self.entries);
        let resources = std::mem::take(&mut self.resources);
        let content = entries.finish(self.initial_transform, self.bounds, &*sc.path_ops)?;

        let form = FormXObject::new(content, resources, self.bounds)
            .matrix(self.initial_transform.invert().unwrap_or_default())
            .luminosity(luminosity);

        Ok(form.serialize(sc))
    }

    fn draw<R>(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        info: DrawInfo,
        f: impl FnOnce(
            &mut ResourceDictionary,
            &mut SerializeContext,
            &mut Content,
        ) -> FolioResult<R>,
    ) -> FolioResult<Option<R>> {
        let paint = info.paint.simplified();
        let mut mode = paint.blend_mode.normalized(info.opaque);
        let treatment = mode.treatment(info.opaque);

        match treatment {
            Treatment::Skip => {
                debug!("blend mode {mode:?} has no effect, skipping draw");
                return Ok(None);
            }
            Treatment::Unsupported => {
                let error = FolioError::Unsupported("the xor and plus blend modes");
                warn!("{error}, drawing {mode:?} with source-over instead");
                mode = BlendMode::SourceOver;
            }
            _ => {}
        }

        if state.clip.bounds(self.bounds).is_none() {
            debug!("clip is empty, skipping draw");
            return Ok(None);
        }

        if let Err(error) = state.clip.resolve(self.bounds, &*sc.path_ops) {
            warn!("{error}, skipping draw");
            return Ok(None);
        }

        let pattern = match &paint.shader {
            Some(shader) => {
                let transform = self
                    .initial_transform
                    .pre_concat(state.ctm)
                    .pre_concat(shader.transform());
                let Some(pattern) = register_shader(sc, shader, transform) else {
                    warn!("gradient has no stops, skipping draw");
                    return Ok(None);
                };
                Some(pattern)
            }
            None => None,
        };

        let mut dst = None;
        if treatment == Treatment::Isolate {
            if self.has_content() {
                dst = Some(self.snapshot(sc, false)?);
            } else if mode.draws_on_empty_destination() {
                debug!("nothing to composite {mode:?} with, drawing directly");
            } else {
                debug!("{mode:?} on an empty device leaves nothing, skipping draw");
                return Ok(None);
            }
        }

        let ext_g_state = sc
            .canon
            .ext_g_state(&mut sc.graph, ExtGState::for_paint(&paint));

        let entry = GraphicsStateEntry {
            transform: info.transform,
            clip: state.clip.clone(),
            color: paint.color,
            pattern: pattern.map(|r| self.resources.register_pattern(r)),
            ext_g_state: Some(self.resources.register_ext_g_state(ext_g_state)),
            text_scale_x: info.text_scale_x.unwrap_or(0.0),
            text_render_mode: text_render_mode(&paint.style),
        };

        let mut content = Content::new();
        let result = f(&mut self.resources, sc, &mut content)?;

        let behind = treatment == Treatment::DrawBehind;
        self.entries.entry_for(entry, behind).append(content);
        if behind {
            self.entries.pop_front_if_empty();
        }

        if let Some(dst) = dst {
            self.composite(sc, state, mode, info.opaque, dst, info.shape)?;
        }

        Ok(Some(result))
    }

    /// Recombine the isolated source, which is everything the device
    /// currently holds, with the destination snapshot.
    fn composite(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        mode: BlendMode,
        opaque: bool,
        dst: ObjRef,
        shape: Option<Shape>,
    ) -> FolioResult<()> {
        let src_empty = !self.has_content();
        let src = if src_empty {
            None
        } else {
            Some(self.snapshot(sc, false)?)
        };

        let has_shape = shape.is_some();
        let steps = composite_plan(mode, opaque, src_empty, has_shape)
            .iter()
            .map(|step| if has_shape { *step } else { step.without_shape() })
            .collect::<Vec<_>>();
        debug!("compositing {mode:?} in {} steps", steps.len());

        let shape_form = match shape {
            Some(shape) if steps.iter().any(|step| step.uses(Layer::Shape)) => {
                Some(self.shape_form(sc, state, &shape)?)
            }
            _ => None,
        };

        let layer = |layer: Layer| match layer {
            Layer::Destination => Some(dst),
            Layer::Source => src,
            Layer::Shape => shape_form,
        };

        for step in steps {
            let Some(form) = layer(step.layer) else {
                continue;
            };

            // A missing layer has no alpha anywhere.
            let mask = match step.mask {
                None => None,
                Some(mask) => match layer(mask.layer) {
                    Some(group) => Some((group, mask.inverted)),
                    None if mask.inverted => None,
                    None => continue,
                },
            };

            self.draw_form(sc, form, mask, step.multiply);
        }

        Ok(())
    }

    /// A form with the coverage of a draw, filled opaque black.
    fn shape_form(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        shape: &Shape,
    ) -> FolioResult<ObjRef> {
        if !shape.is_empty() {
            let entry = GraphicsStateEntry {
                clip: state.clip.clone(),
                text_scale_x: 0.0,
                ..GraphicsStateEntry::default()
            };

            let mut content = Content::new();
            write_shape(&mut content, shape);
            match shape {
                Shape::Path(_, FillRule::EvenOdd) => content.fill_even_odd(),
                _ => content.fill_nonzero(),
            };
            self.entries.entry_for(entry, false).append(content);
        }

        self.snapshot(sc, false)
    }

    /// Draw a form XObject across the whole device, optionally through the
    /// alpha of another one.
    fn draw_form(
        &mut self,
        sc: &mut SerializeContext,
        form: ObjRef,
        mask: Option<(ObjRef, bool)>,
        multiply: bool,
    ) {
        let blend_mode = if multiply {
            BlendMode::Multiply
        } else {
            BlendMode::SourceOver
        };
        let state = ExtGState::new()
            .alpha(NormalizedF32::ONE)
            .blend_mode(blend_mode);
        let ext_g_state = sc.canon.ext_g_state(&mut sc.graph, state);

        let entry = GraphicsStateEntry {
            ext_g_state: Some(self.resources.register_ext_g_state(ext_g_state)),
            text_scale_x: 0.0,
            ..GraphicsStateEntry::default()
        };

        let mut content = Content::new();
        let name = self.resources.register_x_object(form);

        match mask {
            Some((group, inverted)) => {
                let mask = Mask::new(group, MaskType::Alpha, inverted);
                self.with_soft_mask(sc, mask, &mut content, |content| {
                    content.x_object(Name(name.as_bytes()));
                });
            }
            None => {
                content.x_object(Name(name.as_bytes()));
            }
        }

        self.entries.entry_for(entry, false).append(content);
    }

    /// Write `f` with a soft mask in effect, and remove the mask afterwards.
    fn with_soft_mask(
        &mut self,
        sc: &mut SerializeContext,
        mask: Mask,
        content: &mut Content,
        f: impl FnOnce(&mut Content),
    ) {
        with_soft_mask(&mut self.resources, sc, mask, content, f);
    }

    fn draw_image_xobject(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        image: &Image,
        x: f32,
        y: f32,
        paint: &Paint,
    ) -> FolioResult<()> {
        let (width, height) = (image.width() as f32, image.height() as f32);
        let shape = Rect::from_xywh(x, y, width, height)
            .and_then(|rect| Shape::Rect(rect).transform(state.ctm));
        // Image space is the unit square with its origin at the bottom left.
        let transform = state
            .ctm
            .pre_concat(Transform::from_row(width, 0.0, 0.0, -height, x, y + height));

        let paint = Paint {
            shader: None,
            style: PaintStyle::Fill,
            ..paint.clone()
        };

        let info = DrawInfo {
            paint: &paint,
            opaque: paint.is_opaque() && image.is_opaque(),
            shape,
            transform,
            text_scale_x: None,
        };

        self.draw(sc, state, info, |resources, sc, content| {
            let image = image.register(sc)?;
            let name = resources.register_x_object(image);
            content.x_object(Name(name.as_bytes()));
            Ok(())
        })?;

        Ok(())
    }

    /// Draw the paint through the coverage of an alpha-only image.
    fn draw_alpha_image(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        image: &Image,
        x: f32,
        y: f32,
        paint: &Paint,
    ) -> FolioResult<()> {
        let Some(device_rect) = Rect::from_xywh(x, y, image.width() as f32, image.height() as f32)
            .and_then(|rect| Shape::Rect(rect).transform(state.ctm))
            .and_then(|shape| shape.bounds())
        else {
            debug!("image covers nothing, skipping it");
            return Ok(());
        };

        // The coverage is drawn as gray into a luminosity group, which is
        // black wherever the image is not.
        let mut mask_device = PdfDevice::new(self.bounds, self.initial_transform);
        let mask_state = DrawState {
            ctm: state.ctm,
            clip: ClipStack::new(),
        };
        mask_device.draw_image_xobject(sc, &mask_state, image, x, y, &Paint::default())?;
        let group = mask_device.snapshot(sc, true)?;

        let paint = Paint {
            style: PaintStyle::Fill,
            ..paint.clone()
        };

        // The mask is positioned by the transform that is current when it is
        // set, so the fill happens in device space.
        let info = DrawInfo {
            paint: &paint,
            opaque: false,
            shape: Some(Shape::Rect(device_rect)),
            transform: Transform::identity(),
            text_scale_x: None,
        };

        self.draw(sc, state, info, |resources, sc, content| {
            let mask = Mask::new(group, MaskType::Luminosity, false);
            with_soft_mask(resources, sc, mask, content, |content| {
                content.rect(
                    device_rect.x(),
                    device_rect.y(),
                    device_rect.width(),
                    device_rect.height(),
                );
                content.fill_nonzero();
            });
            Ok(())
        })?;

        Ok(())
    }

    fn draw_fallback_glyph(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        run: &GlyphRun,
        glyph: &Glyph,
        paint: &Paint,
    ) -> FolioResult<()> {
        if let Some(outline) = run.font.outline(glyph.id) {
            let ctm = state
                .ctm
                .pre_concat(glyph_outline_transform(run, glyph.x, glyph.y));
            return self.draw_path(sc, &state.with_ctm(ctm), &outline, FillRule::NonZero, paint);
        }

        if let Some((image, rect)) = run.font.glyph_image(glyph.id, run.size) {
            let ctm = state
                .ctm
                .pre_concat(glyph_image_transform(&image, rect, glyph.x, glyph.y));
            return self.draw_image(sc, &state.with_ctm(ctm), &image, 0.0, 0.0, paint);
        }

        debug!("glyph {} can't be drawn in any way, skipping it", glyph.id);
        Ok(())
    }
}

impl Device for PdfDevice {
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
        let bounds = path.bounds();
        let stroke = paint.style.stroke();

        // A stroked line still covers something.
        let degenerate = match stroke {
            None => bounds.width() == 0.0 || bounds.height() == 0.0,
            Some(_) => bounds.width() == 0.0 && bounds.height() == 0.0,
        };
        if degenerate {
            debug!("path is empty, skipping it");
            return Ok(());
        }

        let coverage = match stroke {
            Some(stroke) => stroke
                .outline(path)
                .map(|outline| Shape::Path(outline, FillRule::NonZero)),
            None => Some(Shape::Path(path.clone(), fill_rule)),
        };

        let info = DrawInfo {
            paint,
            opaque: paint.is_opaque(),
            shape: coverage.and_then(|shape| shape.transform(state.ctm)),
            transform: state.ctm,
            text_scale_x: None,
        };

        self.draw(sc, state, info, |_, _, content| {
            write_painted_path(content, path, fill_rule, &paint.style);
            Ok(())
        })?;

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
        if image.is_alpha_only() {
            self.draw_alpha_image(sc, state, image, x, y, paint)
        } else {
            self.draw_image_xobject(sc, state, image, x, y, paint)
        }
    }

    fn draw_glyph_run(
        &mut self,
        sc: &mut SerializeContext,
        state: &DrawState,
        run: &GlyphRun,
        paint: &Paint,
    ) -> FolioResult<()> {
        if run.glyphs.is_empty() {
            return Ok(());
        }

        let info = DrawInfo {
            paint,
            opaque: paint.is_opaque(),
            shape: None,
            transform: state.ctm,
            text_scale_x: Some(run.text_scale_x),
        };

        let fallback = self
            .draw(sc, state, info, |resources, sc, content| {
                Ok(show_glyph_run(run, resources, sc, content))
            })?
            .unwrap_or_default();

        for glyph in &fallback {
            self.draw_fallback_glyph(sc, state, run, glyph, paint)?;
        }

        Ok(())
    }

    fn create_compatible(&self) -> Option<Box<dyn Device>> {
        #[cfg(feature = "raster")]
        let device = crate::device::raster::RasterDevice::new(self.bounds)
            .map(|device| Box::new(device) as Box<dyn Device>);
        #[cfg(not(feature = "raster"))]
        let device = None;

        device
    }

    fn to_image(&self) -> Option<Image> {
        None
    }
}

fn with_soft_mask(
    resources: &mut ResourceDictionary,
    sc: &mut SerializeContext,
    mask: Mask,
    content: &mut Content,
    f: impl FnOnce(&mut Content),
) {
    let masked = sc.canon.ext_g_state(
        &mut sc.graph,
        ExtGState::new().soft_mask(SoftMask::Mask(mask)),
    );
    let unmasked = sc
        .canon
        .ext_g_state(&mut sc.graph, ExtGState::new().soft_mask(SoftMask::None));

    let masked = resources.register_ext_g_state(masked);
    let unmasked = resources.register_ext_g_state(unmasked);

    content.set_parameters(Name(masked.as_bytes()));
    f(content);
    content.set_parameters(Name(unmasked.as_bytes()));
}

fn write_painted_path(content: &mut Content, path: &Path, fill_rule: FillRule, style: &PaintStyle) {
    let dash = style.stroke().and_then(|stroke| stroke.dash.as_ref());
    if let Some(dash) = dash {
        content.save_state();
        content.set_dash_pattern(dash.array.iter().copied(), dash.offset);
    }

    write_path(content, path);

    match (style, fill_rule) {
        (PaintStyle::Fill, FillRule::NonZero) => content.fill_nonzero(),
        (PaintStyle::Fill, FillRule::EvenOdd) => content.fill_even_odd(),
        (PaintStyle::Stroke(_), _) => content.stroke(),
        (PaintStyle::FillAndStroke(_), FillRule::NonZero) => content.fill_nonzero_and_stroke(),
        (PaintStyle::FillAndStroke(_), FillRule::EvenOdd) => content.fill_even_odd_and_stroke(),
    };

    if dash.is_some() {
        content.restore_state();
    }
}

fn text_render_mode(style: &PaintStyle) -> TextRenderingMode {
    match style {
        PaintStyle::Fill => TextRenderingMode::Fill,
        PaintStyle::Stroke(_) => TextRenderingMode::Stroke,
        PaintStyle::FillAndStroke(_) => TextRenderingMode::FillStroke,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;
    use crate::paint::Color;
    use crate::path::{PathOp, Stroke, StrokeDash};
    use crate::primitive::Object;
    use crate::serialize::SerializeSettings;
    use crate::tests::{circle_path, rect, rect_to_path, red_paint};

    fn setup() -> (SerializeContext, PdfDevice) {
        let sc = SerializeContext::new(SerializeSettings::default_test());
        let device = PdfDevice::new(rect(0.0, 0.0, 100.0, 100.0), Transform::identity());
        (sc, device)
    }

    fn content(sc: &SerializeContext, device: PdfDevice) -> (String, ResourceDictionary) {
        let (content, resources) = device.finish(sc).unwrap();
        (String::from_utf8(content).unwrap(), resources)
    }

    fn fill_rect(sc: &mut SerializeContext, device: &mut PdfDevice, r: Rect, paint: &Paint) {
        let path = rect_to_path(r.x(), r.y(), r.width(), r.height());
        device
            .draw_path(sc, &DrawState::default(), &path, FillRule::NonZero, paint)
            .unwrap();
    }

    fn soft_masks(sc: &SerializeContext, resources: &ResourceDictionary) -> Vec<Object> {
        resources
            .ext_g_states
            .get_entries()
            .filter_map(|(_, r)| sc.graph.get(r).ok()?.as_dict()?.get("SMask").cloned())
            .filter(|mask| matches!(mask, Object::Dict(_)))
            .collect()
    }

    #[test]
    fn simple_fill() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 100.0, 100.0), &red_paint());

        let (content, resources) = content(&sc, device);
        assert_eq!(content, "1 0 0 RG\n1 0 0 rg\n/G0 gs\n0 0 100 100 re\nf");
        assert!(soft_masks(&sc, &resources).is_empty());
    }

    #[test]
    fn same_state_draws_share_state() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        fill_rect(&mut sc, &mut device, rect(20.0, 0.0, 10.0, 10.0), &red_paint());

        let (content, _) = content(&sc, device);
        assert_eq!(
            content,
            "1 0 0 RG\n1 0 0 rg\n/G0 gs\n0 0 10 10 re\nf\n20 0 10 10 re\nf"
        );
    }

    #[test]
    fn destination_draws_nothing() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        let objects = sc.graph.len();

        let paint = red_paint().with_blend_mode(BlendMode::Destination);
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 50.0, 50.0), &paint);
        assert_eq!(sc.graph.len(), objects);

        let (content, _) = content(&sc, device);
        assert_eq!(content, "1 0 0 RG\n1 0 0 rg\n/G0 gs\n0 0 10 10 re\nf");
    }

    #[test]
    fn destination_over_goes_behind() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        let blue = Paint::from(Color::new(0, 0, 255)).with_blend_mode(BlendMode::DestinationOver);
        fill_rect(&mut sc, &mut device, rect(5.0, 5.0, 10.0, 10.0), &blue);

        let (content, _) = content(&sc, device);
        assert_eq!(
            content,
            "0 0 1 RG\n0 0 1 rg\n/G0 gs\n5 5 10 10 re\nf\n1 0 0 RG\n1 0 0 rg\n0 0 10 10 re\nf"
        );
    }

    #[test]
    fn empty_destination_over_is_pruned() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 10.0, 10.0), &red_paint());

        let paint = red_paint().with_blend_mode(BlendMode::DestinationOver);
        let info = DrawInfo {
            paint: &paint,
            opaque: true,
            shape: None,
            transform: Transform::identity(),
            text_scale_x: None,
        };
        device
            .draw(&mut sc, &DrawState::default(), info, |_, _, _| Ok(()))
            .unwrap();

        let (content, _) = content(&sc, device);
        assert_eq!(content, "1 0 0 RG\n1 0 0 rg\n/G0 gs\n0 0 10 10 re\nf");
    }

    #[test]
    fn source_in_is_composited() {
        let (mut sc, mut device) = setup();
        let blue = Paint::from(Color::new(0, 0, 255));
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 50.0, 50.0), &blue);

        let paint = red_paint().with_blend_mode(BlendMode::SourceIn);
        let path = circle_path(50.0, 50.0, 20.0);
        device
            .draw_path(&mut sc, &DrawState::default(), &path, FillRule::NonZero, &paint)
            .unwrap();

        let (content, resources) = content(&sc, device);
        assert_eq!(content, "/G0 gs\n/X0 Do\n/G1 gs\n/X1 Do\n/G2 gs");
        assert_eq!(resources.x_objects.get_entries().count(), 2);

        let masks = soft_masks(&sc, &resources);
        assert_eq!(masks.len(), 1);
        let Object::Dict(mask) = &masks[0] else {
            unreachable!()
        };
        assert_eq!(mask.get("S"), Some(&Object::name("Alpha")));
        assert_eq!(mask.get("TR"), None);
    }

    #[test]
    fn isolated_mode_on_empty_device() {
        let (mut sc, mut device) = setup();
        let paint = red_paint().with_blend_mode(BlendMode::SourceIn);
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 50.0, 50.0), &paint);
        assert!(!device.has_content());

        let paint = red_paint()
            .with_opacity(0.5)
            .with_blend_mode(BlendMode::Source);
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 50.0, 50.0), &paint);
        assert!(device.has_content());
        assert_eq!(sc.graph.len(), 1);
    }

    #[test]
    fn translucent_source_needs_the_shape() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 50.0, 50.0), &red_paint());

        let paint = red_paint()
            .with_opacity(0.5)
            .with_blend_mode(BlendMode::Source);
        fill_rect(&mut sc, &mut device, rect(25.0, 25.0, 50.0, 50.0), &paint);

        let (content, resources) = content(&sc, device);
        // The shape is only used as a mask group.
        assert_eq!(resources.x_objects.get_entries().count(), 2);
        assert_eq!(content.matches(" Do").count(), 2);

        let masks = soft_masks(&sc, &resources);
        assert_eq!(masks.len(), 1);
        let Object::Dict(mask) = &masks[0] else {
            unreachable!()
        };
        assert!(mask.get("TR").is_some());
    }

    #[test]
    fn unsupported_mode_falls_back() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 50.0, 50.0), &red_paint());
        let paint = red_paint().with_blend_mode(BlendMode::Xor);
        fill_rect(&mut sc, &mut device, rect(25.0, 25.0, 50.0, 50.0), &paint);

        let (content, resources) = content(&sc, device);
        assert!(content.ends_with("25 25 50 50 re\nf"));
        assert_eq!(resources.x_objects.get_entries().count(), 0);
    }

    #[test]
    fn empty_clip_skips_draw() {
        let (mut sc, mut device) = setup();
        let mut clip = ClipStack::new();
        clip.push(Shape::Rect(rect(0.0, 0.0, 10.0, 10.0)), PathOp::Intersect);
        clip.push(Shape::Rect(rect(50.0, 50.0, 10.0, 10.0)), PathOp::Intersect);
        let state = DrawState {
            ctm: Transform::identity(),
            clip,
        };

        let path = rect_to_path(0.0, 0.0, 10.0, 10.0);
        device
            .draw_path(&mut sc, &state, &path, FillRule::NonZero, &red_paint())
            .unwrap();
        assert!(!device.has_content());
    }

    #[test]
    fn degenerate_paths() {
        let (mut sc, mut device) = setup();
        let mut builder = tiny_skia_path::PathBuilder::new();
        builder.move_to(0.0, 10.0);
        builder.line_to(50.0, 10.0);
        let line = builder.finish().unwrap();

        device
            .draw_path(&mut sc, &DrawState::default(), &line, FillRule::NonZero, &red_paint())
            .unwrap();
        assert!(!device.has_content());

        let stroked = red_paint().with_style(PaintStyle::Stroke(Stroke::with_width(2.0)));
        device
            .draw_path(&mut sc, &DrawState::default(), &line, FillRule::NonZero, &stroked)
            .unwrap();
        let (content, _) = content(&sc, device);
        assert!(content.ends_with("0 10 m\n50 10 l\nS"));
    }

    #[test]
    fn dashes_are_scoped() {
        let (mut sc, mut device) = setup();
        let stroke = Stroke {
            dash: Some(StrokeDash::new([2.0, 1.0], 0.0)),
            ..Stroke::default()
        };
        let paint = red_paint().with_style(PaintStyle::Stroke(stroke));
        let path = circle_path(50.0, 50.0, 10.0);
        device
            .draw_path(&mut sc, &DrawState::default(), &path, FillRule::NonZero, &paint)
            .unwrap();

        let (content, _) = content(&sc, device);
        assert!(content.contains("q\n[2 1] 0 d\n"));
        assert!(content.ends_with("S\nQ"));
    }

    #[test]
    fn transformed_draw() {
        let (mut sc, mut device) = setup();
        let state = DrawState {
            ctm: Transform::from_translate(10.0, 20.0),
            clip: ClipStack::new(),
        };
        let path = rect_to_path(0.0, 0.0, 5.0, 5.0);
        device
            .draw_path(&mut sc, &state, &path, FillRule::EvenOdd, &red_paint())
            .unwrap();

        let (content, _) = content(&sc, device);
        assert_eq!(
            content,
            "q\n1 0 0 1 10 20 cm\n1 0 0 RG\n1 0 0 rg\n/G0 gs\n0 0 5 5 re\nf*\nQ"
        );
    }

    #[test]
    fn images_are_flipped_into_place() {
        let (mut sc, mut device) = setup();
        let image = Image::from_gray8(4, 2, &[0; 8]).unwrap();
        device
            .draw_image(&mut sc, &DrawState::default(), &image, 10.0, 20.0, &Paint::default())
            .unwrap();

        let (content, resources) = content(&sc, device);
        assert_eq!(content, "q\n4 0 0 -2 10 22 cm\n/G0 gs\n/X0 Do\nQ");
        let (_, image_ref) = resources.x_objects.get_entries().next().unwrap();
        assert!(sc.graph.is_written(image_ref));
    }

    #[test]
    fn alpha_images_mask_the_paint() {
        let (mut sc, mut device) = setup();
        let image = Image::from_alpha8(2, 2, &[0, 255, 255, 0]).unwrap();
        device
            .draw_image(&mut sc, &DrawState::default(), &image, 10.0, 10.0, &red_paint())
            .unwrap();

        let (content, resources) = content(&sc, device);
        assert_eq!(
            content,
            "1 0 0 RG\n1 0 0 rg\n/G0 gs\n/G1 gs\n10 10 2 2 re\nf\n/G2 gs"
        );

        let masks = soft_masks(&sc, &resources);
        assert_eq!(masks.len(), 1);
        let Object::Dict(mask) = &masks[0] else {
            unreachable!()
        };
        assert_eq!(mask.get("S"), Some(&Object::name("Luminosity")));
    }

    #[test]
    fn text_is_shown() {
        let (mut sc, mut device) = setup();
        let run = StandardFont::helvetica().layout("Hi", 12.0, 10.0, 50.0);
        device
            .draw_glyph_run(&mut sc, &DrawState::default(), &run, &red_paint())
            .unwrap();

        let (content, resources) = content(&sc, device);
        assert!(content.starts_with("1 0 0 RG\n1 0 0 rg\n/G0 gs\nBT\n/F0 12 Tf\n"));
        assert!(content.ends_with("Tj\nET"));
        assert!(!resources.fonts.is_empty());
    }

    #[test]
    fn snapshot_empties_the_device() {
        let (mut sc, mut device) = setup();
        fill_rect(&mut sc, &mut device, rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        let form = device.snapshot(&mut sc, false).unwrap();

        assert!(!device.has_content());
        let dict = sc.graph.get(form).unwrap().as_dict().unwrap();
        assert_eq!(dict.get("Subtype"), Some(&Object::name("Form")));
        assert!(dict.get("Resources").is_some());
    }
}
