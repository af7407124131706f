//! Versioned optional fields and the presence bitmap.
//!
//! A [`Compatible`] field may be absent from a record without failing the
//! decode. Compatible fields never enter their aggregate's type literal, so
//! adding or removing them keeps the aggregate's signature: an old consumer
//! skips the payloads it does not know and a new consumer sees the fields an
//! old producer did not write as absent.
//!
//! On the wire a struct starts with a [`PresenceBitmap`] (one bit per
//! compatible slot). A nested struct always writes one, even with no slots,
//! so that a struct nested in another record can gain its first compatible
//! field. The outermost struct of a record writes it only when the header
//! announces it. After the mandatory fields, every present slot contributes
//! a varint byte length and its payload, in slot order.
//!
//! ```ignore
//! use wirepack::{Compatible, Decode, Encode, Shape};
//!
//! #[derive(Shape, Encode, Decode)]
//! struct Request {
//!     id: u64,
//!     deadline_ms: Compatible<u32, 20240101>,
//! }
//! ```

use crate::{
    decode::{Decode, Decoder},
    descriptor::{Descriptor, DescriptorBuilder, Shape},
    encode::{Encode, Encoder},
    error::{Error, Result},
    wire::{SizeCounter, varint_len},
};

/// The most compatible fields one aggregate may declare.
pub const MAX_COMPATIBLE_FIELDS: usize = 64;

/// A field that is optional by version.
///
/// `VERSION` tags the release that introduced the field. Versions must not
/// decrease across an aggregate's compatible fields, which must all follow
/// its mandatory fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Compatible<T, const VERSION: u64 = 0>(pub Option<T>);

impl<T, const VERSION: u64> Compatible<T, VERSION> {
    /// The version tag of this field.
    pub const VERSION: u64 = VERSION;

    /// Creates a present field.
    pub const fn new(value: T) -> Self { Self(Some(value)) }

    /// Creates an absent field.
    #[must_use]
    pub const fn absent() -> Self { Self(None) }

    /// Whether the field holds a value.
    #[must_use]
    pub const fn is_present(&self) -> bool { self.0.is_some() }

    /// Returns the value, if present.
    #[must_use]
    pub const fn get(&self) -> Option<&T> { self.0.as_ref() }

    /// Returns the value mutably, if present.
    pub const fn get_mut(&mut self) -> Option<&mut T> { self.0.as_mut() }

    /// Stores `value`, returning the previous one.
    pub const fn set(&mut self, value: T) -> Option<T> { self.0.replace(value) }

    /// Takes the value out, leaving the field absent.
    pub const fn take(&mut self) -> Option<T> { self.0.take() }

    /// Unwraps into the underlying option.
    pub fn into_inner(self) -> Option<T> { self.0 }
}

impl<T, const VERSION: u64> Default for Compatible<T, VERSION> {
    fn default() -> Self { Self(None) }
}

impl<T, const VERSION: u64> From<Option<T>> for Compatible<T, VERSION> {
    fn from(value: Option<T>) -> Self { Self(value) }
}

impl<T, const VERSION: u64> From<Compatible<T, VERSION>> for Option<T> {
    fn from(value: Compatible<T, VERSION>) -> Self { value.0 }
}

impl<T: Shape, const VERSION: u64> Shape for Compatible<T, VERSION> {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Compatible(Box::new(builder.describe::<T>()?), VERSION))
    }
}

impl<T: Encode, const VERSION: u64> Encode for Compatible<T, VERSION> {
    fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        let Some(value) = &self.0 else {
            return Ok(());
        };

        let mut counter = SizeCounter::new();
        value.encode(&mut counter)?;

        encoder.emit_len(counter.size())?;
        value.encode(encoder)
    }

    fn mark_presence(&self, presence: &mut PresenceBitmap) -> Result<()> {
        presence.push(self.0.is_some())
    }
}

impl<T: Decode, const VERSION: u64> Decode for Compatible<T, VERSION> {
    fn decode<D: Decoder + ?Sized>(_: &mut D) -> Result<Self> {
        Err(Error::invalid_data(
            "a compatible field can only be decoded as part of its aggregate",
        ))
    }

    fn decode_field<D: Decoder + ?Sized>(
        decoder: &mut D,
        compatible: &mut CompatibleFields,
    ) -> Result<Self> {
        compatible.read(decoder).map(Self)
    }

    fn decode_field_into<D: Decoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        compatible: &mut CompatibleFields,
    ) -> Result<()> {
        if let Some(value) = compatible.read(decoder)? {
            self.0 = Some(value);
        }

        Ok(())
    }
}

/// One presence bit per compatible slot of an aggregate.
///
/// Encoded as a varint slot count followed by `ceil(count / 8)` bytes, least
/// significant bit first. A producer writes one slot per compatible field it
/// knows; a consumer treats slots past the count as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PresenceBitmap {
    bits: u64,
    len: usize,
}

impl PresenceBitmap {
    /// Creates an empty bitmap.
    #[must_use]
    pub const fn new() -> Self { Self { bits: 0, len: 0 } }

    /// The number of slots.
    #[must_use]
    pub const fn len(&self) -> usize { self.len }

    /// Whether the bitmap has no slots.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.len == 0 }

    /// Appends a slot.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] past [`MAX_COMPATIBLE_FIELDS`] slots.
    pub fn push(&mut self, present: bool) -> Result<()> {
        if self.len >= MAX_COMPATIBLE_FIELDS {
            return Err(Error::invalid_data(format!(
                "more than {MAX_COMPATIBLE_FIELDS} compatible slots"
            )));
        }

        if present {
            self.bits |= 1 << self.len;
        }
        self.len += 1;

        Ok(())
    }

    /// Whether `slot` is present. Slots past the count are absent.
    #[must_use]
    pub const fn is_present(&self, slot: usize) -> bool {
        slot < self.len && (self.bits >> slot) & 1 == 1
    }

    /// The number of bytes [`encode`](Self::encode) writes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        varint_len(self.len as u64) + self.len.div_ceil(8)
    }

    /// Writes the bitmap.
    ///
    /// # Errors
    ///
    /// Propagates encoder failures.
    pub fn encode<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        encoder.emit_len(self.len)?;
        encoder.emit_raw_bytes(&self.bits.to_le_bytes()[..self.len.div_ceil(8)])
    }

    /// Reads a bitmap.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidData`] if the count exceeds
    /// [`MAX_COMPATIBLE_FIELDS`] or a bit past the count is set.
    pub fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_varint()?;
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= MAX_COMPATIBLE_FIELDS)
            .ok_or_else(|| {
                Error::invalid_data(format!(
                    "presence bitmap declares {len} slots, at most \
                     {MAX_COMPATIBLE_FIELDS} are allowed"
                ))
            })?;

        let mut word = [0u8; 8];
        let byte_len = len.div_ceil(8);
        word[..byte_len].copy_from_slice(decoder.read_raw_bytes(byte_len)?);
        let bits = u64::from_le_bytes(word);

        if len < MAX_COMPATIBLE_FIELDS && bits >> len != 0 {
            return Err(Error::invalid_data(
                "presence bit set past the slot count",
            ));
        }

        Ok(Self { bits, len })
    }
}

/// Decoding state for the compatible slots of one aggregate.
///
/// Derived [`Decode`] implementations thread this through their fields:
/// each compatible field claims the next slot, and
/// [`finish`](Self::finish) skips the payloads of present slots that the
/// consumer does not declare.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompatibleFields {
    presence: PresenceBitmap,
    next_slot: usize,
}

impl CompatibleFields {
    /// Starts decoding slots described by `presence`.
    #[must_use]
    pub const fn new(presence: PresenceBitmap) -> Self {
        Self { presence, next_slot: 0 }
    }

    /// Reads the presence bitmap of a nested aggregate, if it writes one.
    ///
    /// # Errors
    ///
    /// Propagates bitmap decoding failures.
    pub fn begin<D: Decoder + ?Sized>(
        decoder: &mut D,
        has_presence: bool,
    ) -> Result<Self> {
        if has_presence {
            PresenceBitmap::decode(decoder).map(Self::new)
        } else {
            Ok(Self::default())
        }
    }

    /// The bitmap being consumed.
    #[must_use]
    pub const fn presence(&self) -> &PresenceBitmap { &self.presence }

    /// Claims the next slot and decodes its payload if present.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if the declared payload length exceeds
    /// the input and with [`Error::InvalidData`] if the payload does not
    /// decode to exactly that length.
    pub fn read<T: Decode, D: Decoder + ?Sized>(
        &mut self,
        decoder: &mut D,
    ) -> Result<Option<T>> {
        let slot = self.next_slot;
        self.next_slot += 1;

        if !self.presence.is_present(slot) {
            return Ok(None);
        }

        let len = decoder.read_len()?;
        let available = decoder.remaining();
        if len > available {
            return Err(Error::Truncated { needed: len, available });
        }

        let value = T::decode(decoder)?;

        let consumed = available - decoder.remaining();
        if consumed != len {
            return Err(Error::invalid_data(format!(
                "compatible slot {slot} declares {len} bytes but its payload \
                 has {consumed}"
            )));
        }

        Ok(Some(value))
    }

    /// Skips the payloads of the remaining present slots.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if a payload runs past the input.
    pub fn finish<D: Decoder + ?Sized>(&mut self, decoder: &mut D) -> Result<()> {
        while self.next_slot < self.presence.len() {
            let slot = self.next_slot;
            self.next_slot += 1;

            if self.presence.is_present(slot) {
                let len = decoder.read_len()?;
                decoder.read_raw_bytes(len)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test;
