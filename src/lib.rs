//! A library for turning 2D drawing commands into PDF documents.
//!
//! Draws go through a [`Surface`], which hands them to the PDF device of the
//! current page. The device records every draw as a content entry together
//! with the graphics state it needs, and decomposes blend modes that PDF
//! cannot express into masked form XObjects. When a page is finished, its
//! entries are replayed into a content stream that only changes the state
//! where it has to. Objects are numbered in the order they are discovered and
//! written out as early as possible.
//!
//! ```
//! use folio::{Color, Document, PageSettings, Paint, Rect};
//!
//! let mut document = Document::new();
//! let mut page = document.start_page_with(PageSettings::new(100.0, 100.0).unwrap());
//! page.surface().draw_rect(
//!     Rect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap(),
//!     &Paint::from(Color::new(255, 0, 0)),
//! );
//! page.finish().unwrap();
//!
//! let pdf = document.finish().unwrap();
//! assert!(pdf.starts_with(b"%PDF-1.4"));
//! ```

mod canon;
mod clip;
mod content;
mod device;
mod graphics_state;
mod resource;
mod serialize;
mod util;

pub mod blend_mode;
pub mod document;
pub mod error;
pub mod font;
pub mod graph;
pub mod metadata;
pub mod object;
pub mod paint;
pub mod path;
pub mod primitive;
pub mod surface;

pub use blend_mode::BlendMode;
pub use document::Document;
pub use error::{FolioError, FolioResult};
pub use metadata::{DateTime, Metadata};
pub use object::annotation::{LinkAnnotation, Target};
pub use object::image::Image;
pub use object::page::{Page, PageSettings};
pub use paint::{Color, LinearGradient, Paint, PaintStyle, RadialGradient, Shader, Stop};
pub use path::*;
pub use serialize::SerializeSettings;
pub use surface::{PointMode, Surface};
pub use tiny_skia_path::{Point, Transform};

#[cfg(test)]
mod tests;
