//! PDF object kinds that are written as part of a document.

pub mod annotation;
pub mod destination;
pub(crate) mod ext_g_state;
pub mod image;
pub(crate) mod mask;
pub mod page;
pub(crate) mod shading;
pub(crate) mod xobject;
