//! Decoding traits and implementations.
//!
//! This module provides the [`Decoder`] trait for byte sources, and the
//! [`Decode`] trait for types that can be rebuilt from their body.
//!
//! Decoding is strict: malformed scalars, out-of-range discriminants and
//! duplicate set or map keys are rejected with [`Error::InvalidData`], and
//! values are never silently coerced.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    hash::{BuildHasher, Hash},
    marker::PhantomData,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use crate::{
    compatible::CompatibleFields,
    descriptor::discriminant_width,
    error::{Error, Result},
    options::Options,
    wire::MAX_VARINT_BYTES,
};

/// A bounds-checked byte source that reads the wire representation of
/// primitive values.
///
/// Implementors provide raw byte access; the defaults mirror the layout
/// written by [`Encoder`](crate::Encoder).
pub trait Decoder {
    // =========================================================================
    // Required methods - these must be implemented by all decoders
    // =========================================================================

    /// Consumes and returns exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if fewer than `len` bytes remain.
    fn read_raw_bytes(&mut self, len: usize) -> Result<&[u8]>;

    /// Returns the number of unread bytes.
    fn remaining(&self) -> usize;

    /// Returns the limits to apply while decoding.
    fn options(&self) -> &Options;

    // =========================================================================
    // Default implementations - can be overridden for optimization
    // =========================================================================

    /// Reads exactly `N` bytes into an array.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_raw_bytes(N)?);
        Ok(array)
    }

    /// Reads a single unsigned byte.
    fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    /// Reads a 16-bit unsigned integer in little-endian format.
    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads a 32-bit unsigned integer in little-endian format.
    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads a 64-bit unsigned integer in little-endian format.
    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Reads a 128-bit unsigned integer in little-endian format.
    fn read_u128(&mut self) -> Result<u128> {
        Ok(u128::from_le_bytes(self.read_array()?))
    }

    /// Reads a platform-sized unsigned integer.
    ///
    /// This is deserialized from a 64-bit value for portability.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if the value does not fit.
    fn read_usize(&mut self) -> Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| {
            Error::invalid_data(format!(
                "usize value {value} out of range for this platform"
            ))
        })
    }

    /// Reads a single signed byte.
    fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    /// Reads a 16-bit signed integer in little-endian format.
    fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    /// Reads a 32-bit signed integer in little-endian format.
    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads a 64-bit signed integer in little-endian format.
    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Reads a 128-bit signed integer in little-endian format.
    fn read_i128(&mut self) -> Result<i128> {
        Ok(i128::from_le_bytes(self.read_array()?))
    }

    /// Reads a platform-sized signed integer.
    ///
    /// This is deserialized from a 64-bit value for portability.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if the value does not fit.
    fn read_isize(&mut self) -> Result<isize> {
        let value = self.read_i64()?;
        isize::try_from(value).map_err(|_| {
            Error::invalid_data(format!(
                "isize value {value} out of range for this platform"
            ))
        })
    }

    /// Reads a boolean value.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] for any byte other than `0` or `1`.
    fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(Error::invalid_data(format!(
                "invalid boolean byte {byte:#04x}"
            ))),
        }
    }

    /// Reads a Unicode character from its 32-bit scalar value.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if the value is not a Unicode scalar
    /// value.
    fn read_char(&mut self) -> Result<char> {
        let code = self.read_u32()?;
        char::from_u32(code).ok_or_else(|| {
            Error::invalid_data(format!("invalid Unicode scalar value: {code}"))
        })
    }

    /// Reads a 32-bit floating-point number.
    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Reads a 64-bit floating-point number.
    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Reads a varint.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if the input ends inside the varint and
    /// with [`Error::InvalidData`] if the value exceeds 64 bits.
    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;

        for index in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;

            // the tenth group only has room for the top bit of a u64
            if index == MAX_VARINT_BYTES - 1 && byte > 1 {
                return Err(Error::invalid_data("varint exceeds 64 bits"));
            }

            value |= u64::from(byte & 0x7F) << (7 * index);

            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(Error::invalid_data("varint exceeds 64 bits"))
    }

    /// Reads a length or element count.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if the value exceeds
    /// [`Options::max_collection_len`].
    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_varint()?;
        let max = self.options().max_collection_len;

        match usize::try_from(len) {
            Ok(len) if len <= max => Ok(len),
            _ => Err(Error::invalid_data(format!(
                "length {len} exceeds the limit of {max}"
            ))),
        }
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if the bytes are not valid UTF-8.
    fn read_str(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let bytes = self.read_raw_bytes(len)?;

        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::invalid_data(format!("invalid UTF-8: {e}")))
    }

    /// Reads a length-prefixed byte vector.
    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.read_raw_bytes(len)?.to_vec())
    }

    /// Reads a discriminant written for `alternatives` alternatives.
    ///
    /// The index is returned unchecked; callers reject values outside
    /// `0..alternatives` with [`Error::invalid_discriminant`].
    #[allow(clippy::cast_possible_truncation)]
    fn read_discriminant(&mut self, alternatives: usize) -> Result<usize> {
        Ok(match discriminant_width(alternatives) {
            1 => usize::from(self.read_u8()?),
            2 => usize::from(self.read_u16()?),
            _ => self.read_u32()? as usize,
        })
    }

    /// Returns the capacity to reserve for a collection of `len` elements.
    fn preallocation(&self, len: usize) -> usize {
        len.min(self.options().max_preallocation)
    }
}

impl<D: Decoder + ?Sized> Decoder for &mut D {
    fn read_raw_bytes(&mut self, len: usize) -> Result<&[u8]> {
        (**self).read_raw_bytes(len)
    }

    fn remaining(&self) -> usize { (**self).remaining() }

    fn options(&self) -> &Options { (**self).options() }
}

/// A type that can be rebuilt from its body.
///
/// Implement it with `#[derive(Decode)]`. The hidden methods carry the
/// presence bitmap of the enclosing aggregate so that compatible fields can
/// be resolved; hand-written implementations only provide
/// [`decode`](Self::decode).
pub trait Decode: Sized {
    /// Decodes a value.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if the input ends early and with
    /// [`Error::InvalidData`] if the bytes describe an impossible value.
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self>;

    /// Decodes a value over `self`.
    ///
    /// Aggregates overwrite their mandatory fields and keep compatible fields
    /// that are absent from the input. On error `self` may be partially
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode).
    fn decode_into<D: Decoder + ?Sized>(&mut self, decoder: &mut D) -> Result<()> {
        *self = Self::decode(decoder)?;
        Ok(())
    }

    /// Decodes the body of a record whose presence bitmap has already been
    /// read from the header.
    #[doc(hidden)]
    fn decode_body<D: Decoder + ?Sized>(
        decoder: &mut D,
        mut compatible: CompatibleFields,
    ) -> Result<Self> {
        let value = Self::decode(decoder)?;
        compatible.finish(decoder)?;
        Ok(value)
    }

    /// In-place counterpart of [`decode_body`](Self::decode_body).
    #[doc(hidden)]
    fn decode_body_into<D: Decoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        mut compatible: CompatibleFields,
    ) -> Result<()> {
        self.decode_into(decoder)?;
        compatible.finish(decoder)
    }

    /// Decodes this value as a field of an aggregate.
    #[doc(hidden)]
    fn decode_field<D: Decoder + ?Sized>(
        decoder: &mut D,
        compatible: &mut CompatibleFields,
    ) -> Result<Self> {
        let _ = compatible;
        Self::decode(decoder)
    }

    /// In-place counterpart of [`decode_field`](Self::decode_field).
    #[doc(hidden)]
    fn decode_field_into<D: Decoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        compatible: &mut CompatibleFields,
    ) -> Result<()> {
        let _ = compatible;
        self.decode_into(decoder)
    }
}

// =============================================================================
// Primitive type implementations
// =============================================================================

macro_rules! impl_decode_scalar {
    ($($ty:ty => $read:ident),+ $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
                    decoder.$read()
                }
            }
        )+
    };
}

impl_decode_scalar!(
    bool => read_bool,
    u8 => read_u8,
    i8 => read_i8,
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
    usize => read_usize,
    isize => read_isize,
    u128 => read_u128,
    i128 => read_i128,
    f32 => read_f32,
    f64 => read_f64,
    char => read_char,
    String => read_str,
);

impl Decode for () {
    fn decode<D: Decoder + ?Sized>(_: &mut D) -> Result<Self> { Ok(()) }
}

impl<T: ?Sized> Decode for PhantomData<T> {
    fn decode<D: Decoder + ?Sized>(_: &mut D) -> Result<Self> { Ok(Self) }
}

impl Decode for Duration {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let secs = decoder.read_u64()?;
        let nanos = decoder.read_u32()?;

        if nanos >= 1_000_000_000 {
            return Err(Error::invalid_data(format!(
                "duration nanoseconds {nanos} out of range"
            )));
        }

        Ok(Self::new(secs, nanos))
    }
}

// =============================================================================
// Smart pointer implementations
// =============================================================================

impl<T: Decode> Decode for Box<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        T::decode(decoder).map(Box::new)
    }

    fn decode_into<D: Decoder + ?Sized>(&mut self, decoder: &mut D) -> Result<()> {
        (**self).decode_into(decoder)
    }

    fn decode_body<D: Decoder + ?Sized>(
        decoder: &mut D,
        compatible: CompatibleFields,
    ) -> Result<Self> {
        T::decode_body(decoder, compatible).map(Box::new)
    }

    fn decode_body_into<D: Decoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        compatible: CompatibleFields,
    ) -> Result<()> {
        (**self).decode_body_into(decoder, compatible)
    }
}

impl Decode for Box<str> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        decoder.read_str().map(String::into_boxed_str)
    }
}

impl<T: Decode> Decode for Box<[T]> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        Vec::<T>::decode(decoder).map(Vec::into_boxed_slice)
    }
}

// A uniquely owned pointee is decoded in place. A shared one is replaced, as
// writing through it would change the value under its other owners.
macro_rules! impl_decode_shared {
    ($($ptr:ident),+) => {
        $(
            impl<T: Decode> Decode for $ptr<T> {
                fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
                    T::decode(decoder).map($ptr::new)
                }

                fn decode_into<D: Decoder + ?Sized>(
                    &mut self,
                    decoder: &mut D,
                ) -> Result<()> {
                    match $ptr::get_mut(self) {
                        Some(inner) => inner.decode_into(decoder),
                        None => {
                            *self = Self::decode(decoder)?;
                            Ok(())
                        }
                    }
                }

                fn decode_body<D: Decoder + ?Sized>(
                    decoder: &mut D,
                    compatible: CompatibleFields,
                ) -> Result<Self> {
                    T::decode_body(decoder, compatible).map($ptr::new)
                }

                fn decode_body_into<D: Decoder + ?Sized>(
                    &mut self,
                    decoder: &mut D,
                    compatible: CompatibleFields,
                ) -> Result<()> {
                    match $ptr::get_mut(self) {
                        Some(inner) => inner.decode_body_into(decoder, compatible),
                        None => {
                            *self = Self::decode_body(decoder, compatible)?;
                            Ok(())
                        }
                    }
                }
            }
        )+
    };
}

impl_decode_shared!(Rc, Arc);

impl Decode for Arc<str> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        decoder.read_str().map(Arc::from)
    }
}

// =============================================================================
// Option and Result implementations
// =============================================================================

impl<T: Decode> Decode for Option<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        if decoder.read_bool()? { T::decode(decoder).map(Some) } else { Ok(None) }
    }
}

impl<T: Decode, U: Decode> Decode for std::result::Result<T, U> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        match decoder.read_discriminant(2)? {
            0 => T::decode(decoder).map(Ok),
            1 => U::decode(decoder).map(Err),
            index => Err(Error::invalid_discriminant(index, 2, "Result")),
        }
    }
}

// =============================================================================
// Collection implementations
// =============================================================================

impl<T: Decode> Decode for Vec<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_len()?;
        let mut vec = Self::with_capacity(decoder.preallocation(len));
        for _ in 0..len {
            vec.push(T::decode(decoder)?);
        }
        Ok(vec)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        Vec::<T>::decode(decoder).map(Self::from)
    }
}

impl<T: Decode> Decode for LinkedList<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_len()?;
        let mut list = Self::new();
        for _ in 0..len {
            list.push_back(T::decode(decoder)?);
        }
        Ok(list)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(decoder)?);
        }

        items.try_into().map_err(|_: Vec<T>| {
            Error::invalid_data(format!("expected {N} array elements"))
        })
    }
}

fn duplicate_key() -> Error { Error::invalid_data("duplicate key in set or map") }

impl<T: Decode + Eq + Hash, S: BuildHasher + Default> Decode for HashSet<T, S> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_len()?;
        let mut set =
            Self::with_capacity_and_hasher(decoder.preallocation(len), S::default());
        for _ in 0..len {
            if !set.insert(T::decode(decoder)?) {
                return Err(duplicate_key());
            }
        }
        Ok(set)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_len()?;
        let mut set = Self::new();
        for _ in 0..len {
            if !set.insert(T::decode(decoder)?) {
                return Err(duplicate_key());
            }
        }
        Ok(set)
    }
}

impl<K: Decode + Eq + Hash, V: Decode, S: BuildHasher + Default> Decode
    for HashMap<K, V, S>
{
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_len()?;
        let mut map =
            Self::with_capacity_and_hasher(decoder.preallocation(len), S::default());
        for _ in 0..len {
            let key = K::decode(decoder)?;
            let value = V::decode(decoder)?;
            if map.insert(key, value).is_some() {
                return Err(duplicate_key());
            }
        }
        Ok(map)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_len()?;
        let mut map = Self::new();
        for _ in 0..len {
            let key = K::decode(decoder)?;
            let value = V::decode(decoder)?;
            if map.insert(key, value).is_some() {
                return Err(duplicate_key());
            }
        }
        Ok(map)
    }
}

// =============================================================================
// Tuple implementations
// =============================================================================

macro_rules! impl_decode_tuple {
    ($($name:ident),+) => {
        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
                Ok(($($name::decode(decoder)?,)+))
            }
        }
    };
}

impl_decode_tuple!(A);
impl_decode_tuple!(A, B);
impl_decode_tuple!(A, B, C);
impl_decode_tuple!(A, B, C, D_);
impl_decode_tuple!(A, B, C, D_, E);
impl_decode_tuple!(A, B, C, D_, E, F);
impl_decode_tuple!(A, B, C, D_, E, F, G);
impl_decode_tuple!(A, B, C, D_, E, F, G, H);
impl_decode_tuple!(A, B, C, D_, E, F, G, H, I);
impl_decode_tuple!(A, B, C, D_, E, F, G, H, I, J);
impl_decode_tuple!(A, B, C, D_, E, F, G, H, I, J, K);
impl_decode_tuple!(A, B, C, D_, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod test;
