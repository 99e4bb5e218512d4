//! The in-memory model of PDF objects.
//!
//! Objects are plain values. Indirect objects live in an
//! [`ObjectGraph`](crate::graph::ObjectGraph) and are referred to with an
//! [`ObjRef`]. Writing an object hands it to the `pdf-writer` object writers,
//! resolving references to object numbers on the way.

use crate::error::{FolioError, FolioResult};
use crate::graph::ObjRef;
use pdf_writer::{Null, Obj, Ref, Str, TextStr};
use tracing::warn;

/// A PDF name, written without its leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(pub String);

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name(value.to_string())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name(value)
    }
}

impl Name {
    pub(crate) fn to_pdf_name(&self) -> pdf_writer::Name<'_> {
        pdf_writer::Name(self.0.as_bytes())
    }
}

/// A PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Int(i64),
    Real(f32),
    Name(Name),
    /// A byte string.
    String(Vec<u8>),
    /// A text string. Non-ASCII text is encoded as UTF-16BE.
    Text(String),
    Array(Vec<Object>),
    Dict(Dict),
    Stream(Stream),
    Ref(ObjRef),
}

impl Object {
    /// Create a name object.
    pub fn name(name: &str) -> Self {
        Object::Name(name.into())
    }

    /// Create a text string.
    pub fn text(text: &str) -> Self {
        Object::Text(text.to_string())
    }

    /// Create an array of real numbers.
    pub fn reals(values: impl IntoIterator<Item = f32>) -> Self {
        Object::Array(values.into_iter().map(Object::Real).collect())
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Object::Dict(dict) => Some(dict),
            Object::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        }
    }

    /// Call `f` for every indirect reference that is directly contained in
    /// this object, in the order in which they would be written.
    pub(crate) fn for_each_ref(&self, f: &mut impl FnMut(ObjRef)) {
        match self {
            Object::Ref(r) => f(*r),
            Object::Array(items) => items.iter().for_each(|item| item.for_each_ref(f)),
            Object::Dict(dict) => dict.for_each_ref(f),
            Object::Stream(stream) => stream.dict.for_each_ref(f),
            _ => {}
        }
    }

    pub(crate) fn write(
        &self,
        obj: Obj<'_>,
        number: &impl Fn(ObjRef) -> Option<u32>,
    ) -> FolioResult<()> {
        match self {
            Object::Null => obj.primitive(Null),
            Object::Bool(b) => obj.primitive(*b),
            Object::Int(i) => obj.primitive(clamp_int(*i)),
            Object::Real(r) => obj.primitive(if r.is_finite() { *r } else { 0.0 }),
            Object::Name(name) => obj.primitive(name.to_pdf_name()),
            Object::String(bytes) => obj.primitive(Str(bytes)),
            Object::Text(text) => obj.primitive(TextStr(text)),
            Object::Array(items) => {
                let mut array = obj.array();
                for item in items {
                    item.write(array.push(), number)?;
                }
            }
            Object::Dict(dict) => dict.write_entries(&mut obj.dict(), number)?,
            Object::Stream(stream) => {
                warn!("stream used as a direct object, dropping its data");
                stream.dict.write_entries(&mut obj.dict(), number)?;
            }
            Object::Ref(r) => obj.primitive(to_pdf_ref(*r, number)?),
        }

        Ok(())
    }
}

/// The reference a numbered object is written with.
pub(crate) fn to_pdf_ref(r: ObjRef, number: &impl Fn(ObjRef) -> Option<u32>) -> FolioResult<Ref> {
    number(r)
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n > 0)
        .map(Ref::new)
        .ok_or(FolioError::UnnumberedReference(r))
}

fn clamp_int(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

impl From<Dict> for Object {
    fn from(value: Dict) -> Self {
        Object::Dict(value)
    }
}

impl From<Stream> for Object {
    fn from(value: Stream) -> Self {
        Object::Stream(value)
    }
}

impl From<ObjRef> for Object {
    fn from(value: ObjRef) -> Self {
        Object::Ref(value)
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Bool(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Int(value)
    }
}

impl From<f32> for Object {
    fn from(value: f32) -> Self {
        Object::Real(value)
    }
}

impl From<Name> for Object {
    fn from(value: Name) -> Self {
        Object::Name(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Array(value)
    }
}

/// A dictionary that keeps its keys in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict {
    entries: Vec<(Name, Object)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dictionary with a `/Type` entry.
    pub fn typed(ty: &str) -> Self {
        let mut dict = Self::new();
        dict.insert("Type", Object::name(ty));
        dict
    }

    /// Insert an entry, replacing an existing entry with the same key in place.
    pub fn insert(&mut self, key: &str, value: impl Into<Object>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k.0 == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.into(), value));
        }
    }

    /// Builder-style variant of [`Dict::insert`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Object>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.iter().find(|(k, _)| k.0 == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        let index = self.entries.iter().position(|(k, _)| k.0 == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    fn for_each_ref(&self, f: &mut impl FnMut(ObjRef)) {
        for (_, value) in &self.entries {
            value.for_each_ref(f);
        }
    }

    /// Write all entries into a dictionary writer.
    pub(crate) fn write_entries(
        &self,
        dict: &mut pdf_writer::Dict<'_>,
        number: &impl Fn(ObjRef) -> Option<u32>,
    ) -> FolioResult<()> {
        for (key, value) in &self.entries {
            value.write(dict.insert(key.to_pdf_name()), number)?;
        }

        Ok(())
    }
}

/// A stream object. The `/Length` entry is added when writing.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dict,
    pub data: Vec<u8>,
}

impl Stream {
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Self { dict, data }
    }
}
