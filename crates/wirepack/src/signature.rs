//! Structural signatures.
//!
//! A [`Signature`] is a 32-bit fingerprint of a type's *shape*: the ordered
//! kinds and widths of its mandatory fields, recursively. Field names never
//! take part, so two types that differ only in naming share a signature.
//!
//! # Algorithm
//!
//! The signature is SipHash-1-3, keyed with [`SIGNATURE_KEYS`], over the
//! little-endian bytes of [`SIGNATURE_ALGORITHM_VERSION`] followed by the
//! type literal (see [`crate::descriptor`]). The low 32 bits of the digest are
//! kept and bit 0 is cleared, because the header uses that bit to flag a
//! presence bitmap.
//!
//! Every buffer ever written depends on these constants. Any change to the
//! folding, the keys or the literal tags must bump
//! [`SIGNATURE_ALGORITHM_VERSION`].

use std::{fmt, hash::Hasher};

use siphasher::sip::SipHasher13;

use crate::{
    decode::Decoder,
    descriptor::Shape,
    encode::Encoder,
    error::Result,
    layout::Layout,
};

/// Version of the signature algorithm, folded into every signature.
pub const SIGNATURE_ALGORITHM_VERSION: u32 = 1;

/// The SipHash keys used for signatures (`"wirepack"`, `"shapesig"` as
/// little-endian words).
pub const SIGNATURE_KEYS: (u64, u64) =
    (0x6b63_6170_6572_6977, 0x6769_7365_7061_6873);

/// Header bit signalling that a presence bitmap follows the signature word.
pub(crate) const COMPATIBLE_FLAG: u32 = 1;

/// A deterministic fingerprint of a type's field shape.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(u32);

impl Signature {
    /// Computes the signature of a type literal.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of_literal(literal: &[u8]) -> Self {
        let mut hasher =
            SipHasher13::new_with_keys(SIGNATURE_KEYS.0, SIGNATURE_KEYS.1);
        hasher.write(&SIGNATURE_ALGORITHM_VERSION.to_le_bytes());
        hasher.write(literal);

        Self((hasher.finish() as u32) & !COMPATIBLE_FLAG)
    }

    /// Returns the signature of `T`.
    ///
    /// # Errors
    ///
    /// Fails if `T`'s shape is cyclic or otherwise invalid.
    pub fn of<T: Shape + ?Sized>() -> Result<Self> {
        Ok(Layout::of::<T>()?.signature())
    }

    /// Reinterprets a raw header word, discarding the flag bit.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self { Self(raw & !COMPATIBLE_FLAG) }

    /// Returns the signature as an integer. Bit 0 is always clear.
    #[must_use]
    pub const fn to_raw(self) -> u32 { self.0 }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#010x})", self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// The fixed-width word at the front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub signature: Signature,
    pub has_compatible: bool,
}

impl Header {
    pub(crate) fn encode<E: Encoder + ?Sized>(
        self,
        encoder: &mut E,
    ) -> Result<()> {
        let flag = if self.has_compatible { COMPATIBLE_FLAG } else { 0 };
        encoder.emit_u32(self.signature.to_raw() | flag)
    }

    pub(crate) fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let raw = decoder.read_u32()?;

        Ok(Self {
            signature: Signature::from_raw(raw),
            has_compatible: raw & COMPATIBLE_FLAG != 0,
        })
    }
}

#[cfg(test)]
mod test;
