//! Encoding traits and implementations.
//!
//! This module provides the [`Encoder`] trait for byte sinks, and the
//! [`Encode`] trait for types that can write their body.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    hash::BuildHasher,
    marker::PhantomData,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use crate::{
    compatible::PresenceBitmap,
    descriptor::discriminant_width,
    error::{Error, Result},
    wire::{MAX_VARINT_BYTES, encode_varint},
};

/// A byte sink that writes the wire representation of primitive values.
///
/// Only [`emit_raw_bytes`](Self::emit_raw_bytes) is required. The defaults
/// fix the wire format: scalars at their natural width in little-endian
/// order, lengths and counts as varints.
///
/// # Example
///
/// ```ignore
/// use wirepack::{Encoder, Result};
///
/// struct Checksum(u32);
///
/// impl Encoder for Checksum {
///     fn emit_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
///         for byte in bytes {
///             self.0 = self.0.wrapping_mul(31).wrapping_add(u32::from(*byte));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Encoder {
    // =========================================================================
    // Required methods - these must be implemented by all encoders
    // =========================================================================

    /// Emits raw bytes directly to the output.
    ///
    /// # Errors
    ///
    /// Fails if the sink cannot take the bytes, for example a fixed region
    /// that is too small.
    fn emit_raw_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    // =========================================================================
    // Default implementations - can be overridden for optimization
    // =========================================================================

    /// Emits a single unsigned byte.
    fn emit_u8(&mut self, v: u8) -> Result<()> { self.emit_raw_bytes(&[v]) }

    /// Emits a 16-bit unsigned integer in little-endian format.
    fn emit_u16(&mut self, v: u16) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 32-bit unsigned integer in little-endian format.
    fn emit_u32(&mut self, v: u32) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 64-bit unsigned integer in little-endian format.
    fn emit_u64(&mut self, v: u64) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 128-bit unsigned integer in little-endian format.
    fn emit_u128(&mut self, v: u128) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a platform-sized unsigned integer.
    ///
    /// This is serialized as a 64-bit value for portability.
    fn emit_usize(&mut self, v: usize) -> Result<()> {
        self.emit_u64(v as u64)
    }

    /// Emits a single signed byte.
    fn emit_i8(&mut self, v: i8) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 16-bit signed integer in little-endian format.
    fn emit_i16(&mut self, v: i16) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 32-bit signed integer in little-endian format.
    fn emit_i32(&mut self, v: i32) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 64-bit signed integer in little-endian format.
    fn emit_i64(&mut self, v: i64) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 128-bit signed integer in little-endian format.
    fn emit_i128(&mut self, v: i128) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a platform-sized signed integer.
    ///
    /// This is serialized as a 64-bit value for portability.
    fn emit_isize(&mut self, v: isize) -> Result<()> {
        self.emit_i64(v as i64)
    }

    /// Emits a boolean value as `1u8` or `0u8`.
    fn emit_bool(&mut self, v: bool) -> Result<()> {
        self.emit_u8(u8::from(v))
    }

    /// Emits a Unicode character as its 32-bit scalar value.
    fn emit_char(&mut self, v: char) -> Result<()> {
        self.emit_u32(u32::from(v))
    }

    /// Emits a 32-bit floating-point number in IEEE 754 representation.
    fn emit_f32(&mut self, v: f32) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 64-bit floating-point number in IEEE 754 representation.
    fn emit_f64(&mut self, v: f64) -> Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a varint.
    fn emit_varint(&mut self, v: u64) -> Result<()> {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let len = encode_varint(v, &mut buf);
        self.emit_raw_bytes(&buf[..len])
    }

    /// Emits a length or element count as a varint.
    fn emit_len(&mut self, len: usize) -> Result<()> {
        self.emit_varint(len as u64)
    }

    /// Emits a string slice as a varint length followed by the UTF-8 bytes.
    fn emit_str(&mut self, v: &str) -> Result<()> { self.emit_bytes(v.as_bytes()) }

    /// Emits a byte slice as a varint length followed by the raw bytes.
    fn emit_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.emit_len(v.len())?;
        self.emit_raw_bytes(v)
    }

    /// Emits the discriminant of alternative `index` out of `alternatives`,
    /// using the narrowest width that covers `alternatives`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if `index` is out of range.
    fn emit_discriminant(
        &mut self,
        index: usize,
        alternatives: usize,
    ) -> Result<()> {
        let out_of_range = || {
            Error::invalid_data(format!(
                "discriminant {index} out of range for {alternatives} \
                 alternatives"
            ))
        };

        if index >= alternatives {
            return Err(out_of_range());
        }

        match discriminant_width(alternatives) {
            1 => self.emit_u8(u8::try_from(index).map_err(|_| out_of_range())?),
            2 => {
                self.emit_u16(u16::try_from(index).map_err(|_| out_of_range())?)
            }
            _ => {
                self.emit_u32(u32::try_from(index).map_err(|_| out_of_range())?)
            }
        }
    }
}

impl<E: Encoder + ?Sized> Encoder for &mut E {
    fn emit_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).emit_raw_bytes(bytes)
    }
}

/// A type that can write its body to an [`Encoder`].
///
/// The body excludes the record header; [`Codec`](crate::Codec) writes that.
/// Implement it with `#[derive(Encode)]`. A derived struct writes its
/// presence bitmap before its first field.
pub trait Encode {
    /// Writes the body of `self`.
    ///
    /// # Errors
    ///
    /// Propagates encoder failures.
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()>;

    /// Writes `self` as the outermost value of a record.
    ///
    /// A derived struct writes its presence bitmap here only when it declares
    /// compatible fields, since the record header announces the bitmap.
    /// Nested, through [`encode`](Self::encode), it always writes one.
    #[doc(hidden)]
    fn encode_body<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        self.encode(encoder)
    }

    /// Records this field's presence bit when it is a compatible field of the
    /// enclosing aggregate. Every other type records nothing.
    #[doc(hidden)]
    fn mark_presence(&self, presence: &mut PresenceBitmap) -> Result<()> {
        let _ = presence;
        Ok(())
    }
}

// =============================================================================
// Primitive type implementations
// =============================================================================

macro_rules! impl_encode_scalar {
    ($($ty:ty => $emit:ident),+ $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
                    encoder.$emit(*self)
                }
            }
        )+
    };
}

impl_encode_scalar!(
    bool => emit_bool,
    u8 => emit_u8,
    i8 => emit_i8,
    u16 => emit_u16,
    i16 => emit_i16,
    u32 => emit_u32,
    i32 => emit_i32,
    u64 => emit_u64,
    i64 => emit_i64,
    usize => emit_usize,
    isize => emit_isize,
    u128 => emit_u128,
    i128 => emit_i128,
    f32 => emit_f32,
    f64 => emit_f64,
    char => emit_char,
);

impl Encode for str {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encoder.emit_str(self)
    }
}

impl Encode for String {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encoder.emit_str(self)
    }
}

impl Encode for () {
    fn encode<E: Encoder + ?Sized>(&self, _: &mut E) -> Result<()> { Ok(()) }
}

impl<T: ?Sized> Encode for PhantomData<T> {
    fn encode<E: Encoder + ?Sized>(&self, _: &mut E) -> Result<()> { Ok(()) }
}

impl Encode for Duration {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encoder.emit_u64(self.as_secs())?;
        encoder.emit_u32(self.subsec_nanos())
    }
}

// =============================================================================
// Reference and smart pointer implementations
// =============================================================================

macro_rules! impl_encode_pointer {
    ($($ptr:ty),+) => {
        $(
            impl<T: Encode + ?Sized> Encode for $ptr {
                fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
                    (**self).encode(encoder)
                }

                fn encode_body<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
                    (**self).encode_body(encoder)
                }

                fn mark_presence(&self, presence: &mut PresenceBitmap) -> Result<()> {
                    (**self).mark_presence(presence)
                }
            }
        )+
    };
}

impl_encode_pointer!(&T, &mut T, Box<T>, Rc<T>, Arc<T>);

// =============================================================================
// Option and Result implementations
// =============================================================================

impl<T: Encode> Encode for Option<T> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        match self {
            Some(value) => {
                encoder.emit_bool(true)?;
                value.encode(encoder)
            }
            None => encoder.emit_bool(false),
        }
    }
}

impl<T: Encode, U: Encode> Encode for std::result::Result<T, U> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        match self {
            Ok(value) => {
                encoder.emit_discriminant(0, 2)?;
                value.encode(encoder)
            }
            Err(error) => {
                encoder.emit_discriminant(1, 2)?;
                error.encode(encoder)
            }
        }
    }
}

// =============================================================================
// Collection implementations
// =============================================================================

fn encode_counted<'a, E, T, I>(encoder: &mut E, len: usize, items: I) -> Result<()>
where
    E: Encoder + ?Sized,
    T: Encode + 'a + ?Sized,
    I: IntoIterator<Item = &'a T>,
{
    encoder.emit_len(len)?;
    for item in items {
        item.encode(encoder)?;
    }
    Ok(())
}

impl<T: Encode> Encode for [T] {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encode_counted(encoder, self.len(), self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encode_counted(encoder, self.len(), self)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encode_counted(encoder, self.len(), self)
    }
}

impl<T: Encode> Encode for LinkedList<T> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encode_counted(encoder, self.len(), self)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        for item in self {
            item.encode(encoder)?;
        }
        Ok(())
    }
}

impl<T: Encode, S: BuildHasher> Encode for HashSet<T, S> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encode_counted(encoder, self.len(), self)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encode_counted(encoder, self.len(), self)
    }
}

impl<K: Encode, V: Encode, S: BuildHasher> Encode for HashMap<K, V, S> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encoder.emit_len(self.len())?;
        for (key, value) in self {
            key.encode(encoder)?;
            value.encode(encoder)?;
        }
        Ok(())
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encoder.emit_len(self.len())?;
        for (key, value) in self {
            key.encode(encoder)?;
            value.encode(encoder)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tuple implementations
// =============================================================================

macro_rules! impl_encode_tuple {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
                let ($($name,)+) = self;
                $($name.encode(encoder)?;)+
                Ok(())
            }
        }
    };
}

impl_encode_tuple!(A);
impl_encode_tuple!(A, B);
impl_encode_tuple!(A, B, C);
impl_encode_tuple!(A, B, C, D);
impl_encode_tuple!(A, B, C, D, E_);
impl_encode_tuple!(A, B, C, D, E_, F);
impl_encode_tuple!(A, B, C, D, E_, F, G);
impl_encode_tuple!(A, B, C, D, E_, F, G, H);
impl_encode_tuple!(A, B, C, D, E_, F, G, H, I);
impl_encode_tuple!(A, B, C, D, E_, F, G, H, I, J);
impl_encode_tuple!(A, B, C, D, E_, F, G, H, I, J, K);
impl_encode_tuple!(A, B, C, D, E_, F, G, H, I, J, K, L);
