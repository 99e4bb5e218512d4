//! PDF annotations, allowing you to add extra "content" to specific pages.
//!
//! The only annotations that are supported are link annotations, which
//! associate a region of the page with a URL or with a named destination of
//! the document.

use crate::primitive::{Dict, Object};
use crate::util::RectExt;
use tiny_skia_path::{Rect, Transform};

/// A type of annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// A link annotation.
    Link(LinkAnnotation),
}

impl Annotation {
    pub(crate) fn to_dict(&self, page_height: f32) -> Option<Dict> {
        match self {
            Annotation::Link(link) => link.to_dict(page_height),
        }
    }
}

/// The target of a link.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// An external URL.
    Url(String),
    /// A destination that was registered with
    /// [`Page::add_named_destination`](crate::object::page::Page::add_named_destination).
    Named(String),
}

/// A link annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    /// The area of the page the link covers.
    pub rect: Rect,
    /// Where the link leads.
    pub target: Target,
}

impl From<LinkAnnotation> for Annotation {
    fn from(value: LinkAnnotation) -> Self {
        Annotation::Link(value)
    }
}

impl LinkAnnotation {
    fn to_dict(&self, page_height: f32) -> Option<Dict> {
        let invert_transform = Transform::from_row(1.0, 0.0, 0.0, -1.0, 0.0, page_height);
        let actual_rect = self.rect.transform(invert_transform)?;

        let mut annotation = Dict::typed("Annot");
        annotation.insert("Subtype", Object::name("Link"));
        annotation.insert("Rect", actual_rect.to_pdf_array());
        annotation.insert("Border", Object::reals([0.0, 0.0, 0.0]));

        match &self.target {
            Target::Url(url) => {
                let mut action = Dict::typed("Action");
                action.insert("S", Object::name("URI"));
                action.insert("URI", Object::String(url.as_bytes().to_vec()));
                annotation.insert("A", action);
            }
            Target::Named(name) => annotation.insert("Dest", Object::name(name)),
        }

        Some(annotation)
    }
}
