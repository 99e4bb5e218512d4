//! Error types.

use crate::graph::ObjRef;
use thiserror::Error;

/// A wrapper type for results returned by folio.
pub type FolioResult<T> = Result<T, FolioError>;

/// An error that can occur while building a document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FolioError {
    /// The graphic state stack of a content stream would have grown beyond
    /// its fixed capacity.
    #[error("graphic state nesting exceeds the supported depth of {0}")]
    UnsupportedNestingDepth(usize),
    /// The content of an object was accessed after it had been written out
    /// and dropped.
    #[error("object {0:?} was accessed after it has been written")]
    ObjectDropped(ObjRef),
    /// A reserved object was still empty when it had to be written.
    #[error("object {0:?} was reserved but never filled")]
    UnresolvedObject(ObjRef),
    /// An object was reached for the first time after the trailer of the
    /// document had already been started.
    #[error("object discovered after the document footer was started")]
    LateObject,
    /// The document contains more indirect objects than PDF can address.
    #[error("too many indirect objects, the maximum object number is {0}")]
    TooManyObjects(u32),
    /// A reference to an object that was never assigned a number was written.
    #[error("reference to object {0:?} that was never numbered")]
    UnnumberedReference(ObjRef),
    /// A boolean path operation failed. Draws affected by this are skipped.
    #[error("a path operation failed")]
    GeometryFailure,
    /// A drawing feature that cannot be represented.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
