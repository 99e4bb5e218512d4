//! Internal utilities.

use crate::primitive::Object;
use siphasher::sip128::{Hasher128, SipHasher13};
use std::any::Any;
use std::fmt;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use tiny_skia_path::{Rect, Transform};

pub(crate) trait TransformExt {
    fn to_pdf_transform(&self) -> [f32; 6];
    fn to_pdf_array(&self) -> Object;
}

impl TransformExt for Transform {
    fn to_pdf_transform(&self) -> [f32; 6] {
        [self.sx, self.ky, self.kx, self.sy, self.tx, self.ty]
    }

    fn to_pdf_array(&self) -> Object {
        Object::reals(self.to_pdf_transform())
    }
}

pub(crate) trait RectExt {
    fn to_pdf_array(&self) -> Object;
    fn contains_rect(&self, other: &Rect) -> bool;
    fn is_disjoint(&self, other: &Rect) -> bool;
}

impl RectExt for Rect {
    fn to_pdf_array(&self) -> Object {
        Object::reals([self.left(), self.top(), self.right(), self.bottom()])
    }

    fn contains_rect(&self, other: &Rect) -> bool {
        self.left() <= other.left()
            && self.top() <= other.top()
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    fn is_disjoint(&self, other: &Rect) -> bool {
        self.right() <= other.left()
            || other.right() <= self.left()
            || self.bottom() <= other.top()
            || other.bottom() <= self.top()
    }
}

pub(crate) trait HashExt {
    fn hash<H: Hasher>(&self, state: &mut H);
}

impl HashExt for Transform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tx.to_bits().hash(state);
        self.ty.to_bits().hash(state);
        self.sx.to_bits().hash(state);
        self.sy.to_bits().hash(state);
        self.kx.to_bits().hash(state);
        self.ky.to_bits().hash(state);
    }
}

impl HashExt for Rect {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.left().to_bits().hash(state);
        self.top().to_bits().hash(state);
        self.right().to_bits().hash(state);
        self.bottom().to_bits().hash(state);
    }
}

pub(crate) trait SipHashable {
    fn sip_hash(&self) -> u128;
}

impl<T> SipHashable for T
where
    T: Hash + ?Sized + 'static,
{
    fn sip_hash(&self) -> u128 {
        let mut state = SipHasher13::new();
        self.type_id().hash(&mut state);
        self.hash(&mut state);
        state.finish128().as_u128()
    }
}

/// Calculate a 128-bit siphash of a value.
pub(crate) fn hash128<T: Hash + ?Sized>(value: &T) -> u128 {
    let mut state = SipHasher13::new();
    value.hash(&mut state);
    state.finish128().as_u128()
}

/// Format 16 bytes as a UUID string.
pub(crate) fn format_uuid(bytes: [u8; 16]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// A value together with its precomputed hash.
pub(crate) struct Prehashed<T: ?Sized> {
    hash: u128,
    value: T,
}

impl<T: Hash + 'static> Prehashed<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        let hash = value.sip_hash();
        Self { hash, value }
    }

    #[inline]
    pub fn hash_value(&self) -> u128 {
        self.hash
    }
}

impl<T: Hash + ?Sized + 'static> Eq for Prehashed<T> {}

impl<T: Hash + ?Sized + 'static> PartialEq for Prehashed<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl<T: ?Sized> Deref for Prehashed<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: Debug> Debug for Prehashed<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: Hash + ?Sized + 'static> Hash for Prehashed<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u128(self.hash);
    }
}
