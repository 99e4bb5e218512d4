//! Pages and their settings.

use crate::device::{Device, PdfDevice};
use crate::error::FolioResult;
use crate::graph::ObjRef;
use crate::object::annotation::Annotation;
use crate::object::destination::XyzDestination;
use crate::primitive::{Dict, Object};
use crate::serialize::SerializeContext;
use crate::surface::Surface;
use crate::util::RectExt;
use tiny_skia_path::{Point, Rect, Transform};
use tracing::{debug, warn};

/// The settings of a page.
#[derive(Clone, Debug)]
pub struct PageSettings {
    /// The media box of the page, in points.
    ///
    /// **Default**: The dimensions of an A4 page.
    media_box: Rect,
}

impl PageSettings {
    /// Settings for a page of the given size, in points.
    ///
    /// Returns `None` if either dimension isn't positive and finite.
    pub fn new(width: f32, height: f32) -> Option<PageSettings> {
        let valid = |size: f32| size.is_finite() && size > 0.0;
        if !valid(width) || !valid(height) {
            return None;
        }

        Some(PageSettings {
            media_box: Rect::from_xywh(0.0, 0.0, width, height)?,
        })
    }

    pub fn width(&self) -> f32 {
        self.media_box.width()
    }

    pub fn height(&self) -> f32 {
        self.media_box.height()
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            media_box: Rect::from_xywh(0.0, 0.0, 595.2765, 841.89108).unwrap(),
        }
    }
}

/// A single page.
///
/// Everything drawn through [`Page::surface`] ends up in the content stream of
/// the page. A page is finished with [`Page::finish`], or when it is dropped.
pub struct Page<'a> {
    sc: &'a mut SerializeContext,
    device: PdfDevice,
    settings: PageSettings,
    page_ref: ObjRef,
    annotations: Vec<Annotation>,
    finished: bool,
}

impl<'a> Page<'a> {
    pub(crate) fn new(sc: &'a mut SerializeContext, settings: PageSettings) -> Self {
        let scale = raster_scale(sc.settings.raster_dpi);
        let height = settings.height();

        // Device space has its origin at the top left and one unit per
        // raster pixel.
        let bounds = settings
            .media_box
            .transform(Transform::from_scale(scale, scale))
            .unwrap_or(settings.media_box);
        let initial_transform =
            Transform::from_row(1.0 / scale, 0.0, 0.0, -1.0 / scale, 0.0, height);

        let page_ref = sc.graph.reserve();
        debug!("starting page {}", sc.pages.len() + 1);

        Self {
            sc,
            device: PdfDevice::new(bounds, initial_transform),
            settings,
            page_ref,
            annotations: vec![],
            finished: false,
        }
    }

    /// The surface to draw on. Coordinates are in points, with the origin at
    /// the top left of the page.
    pub fn surface(&mut self) -> Surface<'_> {
        let scale = raster_scale(self.sc.settings.raster_dpi);
        Surface::new(self.sc, &mut self.device, Transform::from_scale(scale, scale))
    }

    pub fn add_annotation(&mut self, annotation: impl Into<Annotation>) {
        self.annotations.push(annotation.into());
    }

    /// Register a destination at a point of this page, which links can refer
    /// to by its name.
    pub fn add_named_destination(&mut self, name: impl Into<String>, point: Point) {
        let destination = XyzDestination::new(self.page_ref, point);
        self.sc
            .named_destinations
            .push((name.into(), destination.to_array(self.settings.height())));
    }

    /// Finish the page.
    ///
    /// Its content stream and the resources it uses are written right away.
    /// The page object itself is written when the document is finished.
    pub fn finish(mut self) -> FolioResult<()> {
        self.finish_inner()
    }

    fn finish_inner(&mut self) -> FolioResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.sc.check()?;

        let empty = PdfDevice::new(self.device.bounds(), Transform::identity());
        let device = std::mem::replace(&mut self.device, empty);

        let (content, resources) = device.finish(self.sc)?;
        let stream = self.sc.stream(Dict::new(), content);
        let content_ref = self.sc.graph.alloc(stream);
        self.sc.add_and_write(content_ref)?;

        // Fonts are only filled in at the end, everything else can go now.
        for mapper in [&resources.ext_g_states, &resources.patterns, &resources.x_objects] {
            for (_, r) in mapper.get_entries() {
                self.sc.add_and_write(r)?;
            }
        }

        let height = self.settings.height();
        let annotations = self
            .annotations
            .iter()
            .filter_map(|annotation| {
                let dict = annotation.to_dict(height);
                if dict.is_none() {
                    warn!("annotation has an invalid area, skipping it");
                }
                dict.map(Object::Dict)
            })
            .collect::<Vec<_>>();

        let mut page = Dict::typed("Page");
        page.insert("MediaBox", self.settings.media_box.to_pdf_array());
        page.insert("Resources", resources.to_dict());
        page.insert("Contents", content_ref);
        if !annotations.is_empty() {
            page.insert("Annots", Object::Array(annotations));
        }

        self.sc.graph.set(self.page_ref, page)?;
        self.sc.pages.push(self.page_ref);
        debug!("finished page {}", self.sc.pages.len());

        Ok(())
    }
}

impl Drop for Page<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.finish_inner() {
            self.sc.poison(error);
        }
    }
}

/// Device units per point.
fn raster_scale(dpi: f32) -> f32 {
    if dpi.is_finite() && dpi > 0.0 {
        dpi / 72.0
    } else {
        warn!("invalid raster resolution {dpi}, using 72 dpi");
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::annotation::{LinkAnnotation, Target};
    use crate::serialize::SerializeSettings;
    use crate::tests::{rect, red_paint};

    fn context() -> SerializeContext {
        SerializeContext::new(SerializeSettings::default_test())
    }

    fn page_dict(sc: &SerializeContext) -> &Dict {
        sc.graph.get(sc.pages[0]).unwrap().as_dict().unwrap()
    }

    #[test]
    fn default_is_a4() {
        let settings = PageSettings::default();
        assert_eq!(settings.width(), 595.2765);
        assert_eq!(settings.height(), 841.89108);
    }

    #[test]
    fn page_size_must_be_positive() {
        assert!(PageSettings::new(0.0, 10.0).is_none());
        assert!(PageSettings::new(10.0, -1.0).is_none());
        assert!(PageSettings::new(f32::INFINITY, 10.0).is_none());
        assert!(PageSettings::new(f32::NAN, 10.0).is_none());
        assert_eq!(PageSettings::new(10.0, 20.0).map(|s| s.height()), Some(20.0));
    }

    #[test]
    fn page_dict_is_filled_on_finish() {
        let mut sc = context();
        let mut page = Page::new(&mut sc, PageSettings::new(100.0, 200.0).unwrap());
        page.surface().draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        page.finish().unwrap();

        assert_eq!(sc.pages.len(), 1);
        let dict = page_dict(&sc);
        assert_eq!(dict.get("Type"), Some(&Object::name("Page")));
        assert_eq!(dict.get("MediaBox"), Some(&Object::reals([0.0, 0.0, 100.0, 200.0])));
        assert!(dict.get("Annots").is_none());

        let Some(Object::Ref(content)) = dict.get("Contents") else {
            panic!("expected a content reference");
        };
        assert!(sc.graph.is_written(*content));
    }

    #[test]
    fn dropped_page_is_finished() {
        let mut sc = context();
        {
            let mut page = Page::new(&mut sc, PageSettings::new(100.0, 100.0).unwrap());
            page.surface().draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        }

        assert_eq!(sc.pages.len(), 1);
    }

    #[test]
    fn links_and_destinations() {
        let mut sc = context();
        let mut page = Page::new(&mut sc, PageSettings::new(100.0, 100.0).unwrap());
        page.add_annotation(LinkAnnotation {
            rect: rect(10.0, 20.0, 30.0, 40.0),
            target: Target::Url("https://example.com".to_string()),
        });
        page.add_named_destination("intro", Point::from_xy(0.0, 25.0));
        page.finish().unwrap();

        let Some(Object::Array(annots)) = page_dict(&sc).get("Annots") else {
            panic!("expected annotations");
        };
        assert_eq!(annots.len(), 1);

        let (name, dest) = &sc.named_destinations[0];
        assert_eq!(name, "intro");
        let Object::Array(dest) = dest else {
            panic!("expected a destination array");
        };
        assert_eq!(dest[0], Object::Ref(sc.pages[0]));
        assert_eq!(dest[3], Object::Real(75.0));
    }

    #[test]
    fn raster_resolution_scales_the_device() {
        let mut sc = context();
        sc.settings.raster_dpi = 144.0;
        let mut page = Page::new(&mut sc, PageSettings::new(100.0, 100.0).unwrap());
        assert_eq!(page.device.bounds().width(), 200.0);

        page.surface().draw_rect(rect(0.0, 0.0, 10.0, 10.0), &red_paint());
        let empty = PdfDevice::new(rect(0.0, 0.0, 1.0, 1.0), Transform::identity());
        let device = std::mem::replace(&mut page.device, empty);
        let (content, _) = device.finish(page.sc).unwrap();
        let content = String::from_utf8(content).unwrap();
        assert!(content.starts_with("0.5 0 0 -0.5 0 100 cm\nq\n2 0 0 2 0 0 cm\n"));
    }
}
