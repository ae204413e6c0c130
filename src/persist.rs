//! Fixed-size codec for everything that lives in the store.
//!
//! Values are written little-endian and packed, so the layout does not depend on the compiler's
//! struct layout. `Raw` is a plain byte array, which keeps every persisted type a fixed-layout
//! value without owned indirections.

use core::mem::size_of;

pub trait Persist: Copy + Default {
    type Raw: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Serialized size in bytes.
    const SIZE: usize = size_of::<Self::Raw>();

    fn encode(&self) -> Self::Raw;

    fn decode(raw: &Self::Raw) -> Self;
}

macro_rules! persist_primitive {
    ($($ty:ty),*) => {
        $(
            impl Persist for $ty {
                type Raw = [u8; size_of::<$ty>()];

                fn encode(&self) -> Self::Raw {
                    self.to_le_bytes()
                }

                fn decode(raw: &Self::Raw) -> Self {
                    <$ty>::from_le_bytes(*raw)
                }
            }
        )*
    };
}

persist_primitive!(u8, i8, u16, i16, u32, i32);

impl Persist for bool {
    type Raw = [u8; 1];

    fn encode(&self) -> Self::Raw {
        [*self as u8]
    }

    fn decode(raw: &Self::Raw) -> Self {
        raw[0] != 0
    }
}

/// Cursor over a raw buffer used by the `Persist` impls of composite types.
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn put<V: Persist>(&mut self, value: &V) -> &mut Self {
        let raw = value.encode();
        let bytes = raw.as_ref();
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        self
    }
}

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn take<V: Persist>(&mut self) -> V {
        let mut raw = V::Raw::default();
        let len = raw.as_ref().len();
        raw.as_mut()
            .copy_from_slice(&self.buf[self.pos..self.pos + len]);
        self.pos += len;
        V::decode(&raw)
    }
}
