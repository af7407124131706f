//! Record-level entry points.
//!
//! A record is a header word followed by a value's body:
//!
//! ```text
//! [signature | has_compatible (u32 LE)]
//! [presence bitmap, if has_compatible]
//! [mandatory fields in declaration order]
//! [varint length + payload for each present compatible slot]
//! ```
//!
//! [`Codec`] carries the decoding [`Options`]; the crate-level free functions
//! use [`Codec::default`].

use crate::{
    compatible::{CompatibleFields, PresenceBitmap},
    decode::{Decode, Decoder},
    descriptor::{Descriptor, Shape},
    encode::{Encode, Encoder},
    error::{Error, Result},
    layout::Layout,
    options::{Options, TrailingBytes},
    pack::{Pack, Unpack},
    partial::{self, FieldSelector, PartialRecord},
    signature::Header,
    wire::{BufferEncoder, SizeCounter, SliceDecoder, SliceEncoder},
};

/// Serializes and deserializes records under a set of [`Options`].
///
/// # Example
///
/// ```ignore
/// use wirepack::{Codec, Options};
///
/// let codec = Codec::new(Options::builder().max_collection_len(1024).build());
///
/// let bytes = codec.serialize(&vec![1u32, 2, 3])?;
/// let values: Vec<u32> = codec.deserialize(&bytes)?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Codec {
    options: Options,
}

impl Codec {
    /// Creates a codec with the given options.
    #[must_use]
    pub const fn new(options: Options) -> Self { Self { options } }

    /// The options applied while decoding.
    #[must_use]
    pub const fn options(&self) -> &Options { &self.options }

    /// Encodes `value` into a new buffer.
    ///
    /// # Errors
    ///
    /// Fails if `T`'s shape is invalid.
    pub fn serialize<T: Shape + Encode + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.serialize_append(value, &mut buffer)?;
        Ok(buffer)
    }

    /// Encodes `value` onto the end of `buffer` and returns the number of
    /// bytes appended.
    ///
    /// Existing contents are never modified. On error `buffer` is truncated
    /// back to its original length.
    ///
    /// # Errors
    ///
    /// Fails if `T`'s shape is invalid.
    pub fn serialize_append<T: Shape + Encode + ?Sized>(
        &self,
        value: &T,
        buffer: &mut Vec<u8>,
    ) -> Result<usize> {
        let start = buffer.len();

        match write_record(value, &mut BufferEncoder::new(buffer)) {
            Ok(()) => Ok(buffer.len() - start),
            Err(error) => {
                buffer.truncate(start);
                Err(error)
            }
        }
    }

    /// Encodes `value` into a new buffer after `offset` zeroed bytes, which
    /// the caller may fill with its own framing.
    ///
    /// # Errors
    ///
    /// Fails if `T`'s shape is invalid.
    pub fn serialize_with_offset<T: Shape + Encode + ?Sized>(
        &self,
        value: &T,
        offset: usize,
    ) -> Result<Vec<u8>> {
        let mut buffer = vec![0; offset];
        self.serialize_append(value, &mut buffer)?;
        Ok(buffer)
    }

    /// Returns the exact number of bytes [`serialize`](Self::serialize)
    /// would produce.
    ///
    /// # Errors
    ///
    /// Fails if `T`'s shape is invalid.
    pub fn serialized_size<T: Shape + Encode + ?Sized>(
        &self,
        value: &T,
    ) -> Result<usize> {
        let mut counter = SizeCounter::new();
        write_record(value, &mut counter)?;
        Ok(counter.size())
    }

    /// Encodes `value` into the front of `out` and returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Capacity`] if `out` is too small. The size is
    /// checked before anything is written, so `out` is untouched on failure.
    pub fn serialize_to<T: Shape + Encode + ?Sized>(
        &self,
        value: &T,
        out: &mut [u8],
    ) -> Result<usize> {
        let required = self.serialized_size(value)?;
        if required > out.len() {
            tracing::debug!(
                type_name = std::any::type_name::<T>(),
                required,
                capacity = out.len(),
                "output region too small"
            );

            return Err(Error::Capacity { required, capacity: out.len() });
        }

        let mut encoder = SliceEncoder::new(out);
        write_record(value, &mut encoder)?;
        Ok(encoder.written())
    }

    /// Encodes several values as consecutive records, each with its own
    /// header.
    ///
    /// # Errors
    ///
    /// Fails if any value's shape is invalid.
    pub fn serialize_many<P: Pack + ?Sized>(&self, values: &P) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        values.pack(&mut BufferEncoder::new(&mut buffer))?;
        Ok(buffer)
    }

    /// Decodes a record of type `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::SchemaMismatch`] if the header's signature differs from
    ///   `T`'s; the body is not read.
    /// - [`Error::Truncated`] if the buffer ends early.
    /// - [`Error::InvalidData`] for malformed contents.
    /// - [`Error::TrailingBytes`] if bytes remain and the options reject them.
    pub fn deserialize<T: Shape + Decode>(&self, bytes: &[u8]) -> Result<T> {
        let mut decoder = SliceDecoder::new(bytes, &self.options);
        let value = read_record(&mut decoder)?;
        self.check_trailing(&decoder)?;
        Ok(value)
    }

    /// Decodes a record of type `T` over an existing value.
    ///
    /// Mandatory fields are overwritten. Compatible fields absent from the
    /// buffer keep their current value. On error `value` may be partially
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](Self::deserialize).
    pub fn deserialize_into<T: Shape + Decode>(
        &self,
        bytes: &[u8],
        value: &mut T,
    ) -> Result<()> {
        let mut decoder = SliceDecoder::new(bytes, &self.options);
        let compatible = read_header::<T, _>(&mut decoder)?;
        value.decode_body_into(&mut decoder, compatible)?;
        self.check_trailing(&decoder)
    }

    /// Decodes the record starting at `*offset` and advances `offset` past it.
    ///
    /// Bytes after the record are left for later calls. `offset` is only
    /// updated on success.
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](Self::deserialize), except that trailing
    /// bytes are never an error.
    pub fn deserialize_at<T: Shape + Decode>(
        &self,
        bytes: &[u8],
        offset: &mut usize,
    ) -> Result<T> {
        let rest = bytes.get(*offset..).ok_or(Error::Truncated {
            needed: *offset,
            available: bytes.len(),
        })?;

        let mut decoder = SliceDecoder::new(rest, &self.options);
        let value = read_record(&mut decoder)?;
        *offset += decoder.position();
        Ok(value)
    }

    /// Decodes consecutive records written by
    /// [`serialize_many`](Self::serialize_many).
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](Self::deserialize), for each record.
    pub fn deserialize_many<U: Unpack>(&self, bytes: &[u8]) -> Result<U> {
        let mut decoder = SliceDecoder::new(bytes, &self.options);
        let values = U::unpack(&mut decoder)?;
        self.check_trailing(&decoder)?;
        Ok(values)
    }

    /// Locates the selected fields of a `T` record without decoding the
    /// others.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownField`] for a selector that matches no
    /// field, and otherwise as [`deserialize`](Self::deserialize) for the
    /// part of the buffer that is walked.
    pub fn deserialize_partial<'a, T: Shape + ?Sized>(
        &self,
        bytes: &'a [u8],
        selectors: &[FieldSelector<'_>],
    ) -> Result<PartialRecord<'a>> {
        partial::extract::<T>(bytes, selectors, &self.options)
    }

    /// Decodes a single field of a `T` record as `F`.
    ///
    /// For compatible fields `F` is the wrapped type.
    ///
    /// # Errors
    ///
    /// Same as [`deserialize_partial`](Self::deserialize_partial) and
    /// [`PartialRecord::get`].
    pub fn get_field<'s, T: Shape + ?Sized, F: Shape + Decode>(
        &self,
        bytes: &[u8],
        selector: impl Into<FieldSelector<'s>>,
    ) -> Result<F> {
        let selector = selector.into();
        self.deserialize_partial::<T>(bytes, &[selector])?.get(selector)
    }

    fn check_trailing(&self, decoder: &SliceDecoder<'_>) -> Result<()> {
        let count = decoder.remaining();

        match self.options.trailing_bytes {
            TrailingBytes::Reject if count > 0 => {
                Err(Error::TrailingBytes { count })
            }
            TrailingBytes::Reject | TrailingBytes::Ignore => Ok(()),
        }
    }
}

/// Writes the header and body of one record.
pub(crate) fn write_record<T, E>(value: &T, encoder: &mut E) -> Result<()>
where
    T: Shape + Encode + ?Sized,
    E: Encoder + ?Sized,
{
    let layout = Layout::of::<T>()?;

    Header {
        signature: layout.signature(),
        has_compatible: layout.has_compatible(),
    }
    .encode(encoder)?;

    value.encode_body(encoder)
}

/// Reads one record of type `T`.
pub(crate) fn read_record<T, D>(decoder: &mut D) -> Result<T>
where
    T: Shape + Decode,
    D: Decoder + ?Sized,
{
    let compatible = read_header::<T, D>(decoder)?;
    T::decode_body(decoder, compatible)
}

/// Validates a record header against `T` and reads the presence bitmap the
/// header announces.
pub(crate) fn read_header<T, D>(decoder: &mut D) -> Result<CompatibleFields>
where
    T: Shape + ?Sized,
    D: Decoder + ?Sized,
{
    let layout = Layout::of::<T>()?;
    let header = Header::decode(decoder)?;

    if header.signature != layout.signature() {
        tracing::debug!(
            type_name = layout.type_name(),
            expected = %layout.signature(),
            found = %header.signature,
            "signature mismatch"
        );

        return Err(Error::SchemaMismatch {
            expected: layout.signature(),
            found: header.signature,
        });
    }

    if !header.has_compatible {
        return Ok(CompatibleFields::default());
    }

    if !matches!(layout.descriptor(), Descriptor::Aggregate(_)) {
        return Err(Error::invalid_data(format!(
            "presence bitmap announced for `{}`, which is not an aggregate",
            layout.type_name()
        )));
    }

    PresenceBitmap::decode(decoder).map(CompatibleFields::new)
}

#[cfg(test)]
mod test;
