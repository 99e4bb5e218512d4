//! Raster images.
//!
//! folio does not decode image files. An [`Image`] is created from raw
//! pixels and is written as an image XObject, with a soft mask if it has
//! transparent pixels. Images are canonicalized by their content, so drawing
//! the same pixels twice embeds them once.

use crate::error::FolioResult;
use crate::graph::ObjRef;
use crate::primitive::{Dict, Object};
use crate::serialize::SerializeContext;
use crate::util::Prehashed;
use std::sync::Arc;

#[derive(Debug, Hash, Eq, PartialEq, Copy, Clone)]
enum ImageKind {
    Rgb,
    Gray,
    /// Only coverage, the color comes from the paint it is drawn with.
    Alpha,
}

impl ImageKind {
    fn color_space(self) -> &'static str {
        match self {
            ImageKind::Rgb => "DeviceRGB",
            ImageKind::Gray | ImageKind::Alpha => "DeviceGray",
        }
    }
}

#[derive(Debug, Hash, Eq, PartialEq)]
struct Repr {
    width: u32,
    height: u32,
    kind: ImageKind,
    data: Vec<u8>,
    /// The alpha channel, if any pixel is not fully opaque.
    alpha: Option<Vec<u8>>,
}

/// A raster image with 8 bits per component.
#[derive(Debug, Hash, Eq, PartialEq, Clone)]
pub struct Image(Arc<Prehashed<Repr>>);

impl Image {
    /// Create an image from unpremultiplied RGBA pixels, row by row from the
    /// top. Returns `None` if the data doesn't match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        check_size(width, height, data.len(), 4)?;

        let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(data.len() / 4);
        for pixel in data.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
            alpha.push(pixel[3]);
        }

        Some(Self::new(width, height, ImageKind::Rgb, rgb, Some(alpha)))
    }

    /// Create an opaque grayscale image.
    pub fn from_gray8(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        check_size(width, height, data.len(), 1)?;
        Some(Self::new(width, height, ImageKind::Gray, data.to_vec(), None))
    }

    /// Create an alpha-only image. It has no color of its own and is drawn
    /// with the color of the paint.
    pub fn from_alpha8(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        check_size(width, height, data.len(), 1)?;
        Some(Self::new(width, height, ImageKind::Alpha, data.to_vec(), None))
    }

    fn new(
        width: u32,
        height: u32,
        kind: ImageKind,
        data: Vec<u8>,
        alpha: Option<Vec<u8>>,
    ) -> Self {
        let alpha = alpha.filter(|alpha| alpha.iter().any(|a| *a != u8::MAX));

        Self(Arc::new(Prehashed::new(Repr {
            width,
            height,
            kind,
            data,
            alpha,
        })))
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn is_alpha_only(&self) -> bool {
        self.0.kind == ImageKind::Alpha
    }

    /// Whether every pixel of the image is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.0.kind != ImageKind::Alpha && self.0.alpha.is_none()
    }

    /// The coverage of the image as an alpha-only image. Opaque images cover
    /// their whole area.
    pub fn alpha_mask(&self) -> Image {
        if self.is_alpha_only() {
            return self.clone();
        }

        let pixels = (self.0.width * self.0.height) as usize;
        let alpha = self
            .0
            .alpha
            .clone()
            .unwrap_or_else(|| vec![u8::MAX; pixels]);
        Self::new(self.0.width, self.0.height, ImageKind::Alpha, alpha, None)
    }

    /// The pixels as unpremultiplied RGBA. Alpha-only images are colored
    /// with `color`.
    pub(crate) fn to_rgba8(&self, color: [u8; 3]) -> Vec<u8> {
        let repr = &self.0;
        let pixels = (repr.width * repr.height) as usize;
        let mut out = Vec::with_capacity(pixels * 4);

        for i in 0..pixels {
            let (rgb, a) = match repr.kind {
                ImageKind::Rgb => {
                    let rgb = [repr.data[i * 3], repr.data[i * 3 + 1], repr.data[i * 3 + 2]];
                    (rgb, repr.alpha.as_ref().map_or(u8::MAX, |alpha| alpha[i]))
                }
                ImageKind::Gray => ([repr.data[i]; 3], u8::MAX),
                ImageKind::Alpha => (color, repr.data[i]),
            };

            out.extend_from_slice(&rgb);
            out.push(a);
        }

        out
    }

    /// The image XObject for this image. It is written to the output right
    /// away, since nothing about it can change anymore.
    pub(crate) fn register(&self, sc: &mut SerializeContext) -> FolioResult<ObjRef> {
        let key = self.0.hash_value();
        if let Some(r) = sc.canon.images.get(&key) {
            return Ok(*r);
        }

        let soft_mask = match &self.0.alpha {
            Some(alpha) => {
                let dict = self.image_dict(ImageKind::Gray);
                let stream = sc.stream(dict, alpha.clone());
                Some(sc.graph.alloc(stream))
            }
            None => None,
        };

        let mut dict = self.image_dict(self.0.kind);
        if let Some(soft_mask) = soft_mask {
            dict.insert("SMask", soft_mask);
        }

        let stream = sc.stream(dict, self.0.data.clone());
        let r = sc.graph.alloc(stream);
        sc.add_and_write(r)?;
        sc.canon.images.insert(key, r);

        Ok(r)
    }

    fn image_dict(&self, kind: ImageKind) -> Dict {
        let mut dict = Dict::typed("XObject");
        dict.insert("Subtype", Object::name("Image"));
        dict.insert("Width", self.0.width as i64);
        dict.insert("Height", self.0.height as i64);
        dict.insert("ColorSpace", Object::name(kind.color_space()));
        dict.insert("BitsPerComponent", 8i64);
        dict
    }
}

fn check_size(width: u32, height: u32, len: usize, channels: usize) -> Option<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels)?;
    (width > 0 && height > 0 && expected == len).then_some(())
}
