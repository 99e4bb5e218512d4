use crate::graph::ObjRef;
use crate::primitive::{Dict, Object};
use crate::resource::ResourceDictionary;
use crate::serialize::SerializeContext;
use crate::util::{RectExt, TransformExt};
use tiny_skia_path::{Rect, Transform};

/// A form XObject holding a snapshot of device content. It is always an
/// isolated transparency group, so that it can serve as a soft mask.
#[derive(Debug)]
pub(crate) struct FormXObject {
    content: Vec<u8>,
    resources: ResourceDictionary,
    bbox: Rect,
    matrix: Transform,
    luminosity: bool,
}

impl FormXObject {
    pub(crate) fn new(content: Vec<u8>, resources: ResourceDictionary, bbox: Rect) -> Self {
        Self {
            content,
            resources,
            bbox,
            matrix: Transform::identity(),
            luminosity: false,
        }
    }

    #[must_use]
    pub(crate) fn matrix(mut self, matrix: Transform) -> Self {
        self.matrix = matrix;
        self
    }

    /// Mark the group for use as a luminosity mask, which needs a gray
    /// blending color space.
    #[must_use]
    pub(crate) fn luminosity(mut self, luminosity: bool) -> Self {
        self.luminosity = luminosity;
        self
    }

    fn to_dict(&self) -> Dict {
        let mut dict = Dict::typed("XObject");
        dict.insert("Subtype", Object::name("Form"));

        if !self.matrix.is_identity() {
            dict.insert("Matrix", self.matrix.to_pdf_array());
        }

        dict.insert("Resources", self.resources.to_dict());
        dict.insert("BBox", self.bbox.to_pdf_array());

        let mut group = Dict::typed("Group");
        group.insert("S", Object::name("Transparency"));
        if self.luminosity {
            group.insert("CS", Object::name("DeviceGray"));
        }
        group.insert("I", true);
        dict.insert("Group", group);

        dict
    }

    pub(crate) fn serialize(self, sc: &mut SerializeContext) -> ObjRef {
        let dict = self.to_dict();
        let stream = sc.stream(dict, self.content);
        sc.graph.alloc(stream)
    }
}
