//! In-memory encoders and decoders.
//!
//! This module provides the concrete [`Encoder`] and [`Decoder`]
//! implementations used by [`Codec`](crate::Codec):
//!
//! - [`BufferEncoder`] appends to a growable `Vec<u8>`.
//! - [`SliceEncoder`] writes into a caller-owned fixed region.
//! - [`SizeCounter`] only counts bytes, for exact size computation.
//! - [`SliceDecoder`] reads from a borrowed byte slice.
//!
//! # Varint Encoding
//!
//! Length prefixes and element counts use unsigned LEB128: each byte stores 7
//! bits of data, low group first, with the MSB indicating continuation. At
//! most [`MAX_VARINT_BYTES`] bytes are read; encodings whose value does not fit
//! in 64 bits are rejected as invalid data.
//!
//! Scalars are *not* varints: they use their fixed little-endian width so that
//! field offsets are computable from the type alone.

use crate::{
    decode::Decoder,
    encode::Encoder,
    error::{Error, Result},
    options::Options,
};

// =============================================================================
// Varint helper functions
// =============================================================================

/// Maximum number of bytes of a varint.
pub const MAX_VARINT_BYTES: usize = 10;

/// Encodes `value` as a varint into the buffer and returns the number of
/// bytes written.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn encode_varint(
    mut value: u64,
    buf: &mut [u8; MAX_VARINT_BYTES],
) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Returns the number of bytes of the varint encoding of `value`.
#[inline]
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Appends the varint encoding of `value` to `out`.
pub(crate) fn write_varint(out: &mut Vec<u8>, value: u64) {
    let mut buf = [0u8; MAX_VARINT_BYTES];
    let len = encode_varint(value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

// =============================================================================
// BufferEncoder
// =============================================================================

/// An encoder that appends to a growable buffer.
///
/// Existing contents of the buffer are left in place.
#[derive(Debug)]
pub struct BufferEncoder<'b> {
    buffer: &'b mut Vec<u8>,
}

impl<'b> BufferEncoder<'b> {
    /// Creates an encoder appending to `buffer`.
    #[must_use]
    pub const fn new(buffer: &'b mut Vec<u8>) -> Self { Self { buffer } }

    /// Returns the total length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize { self.buffer.len() }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }
}

impl Encoder for BufferEncoder<'_> {
    fn emit_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }
}

// =============================================================================
// SliceEncoder
// =============================================================================

/// An encoder that writes into a fixed, caller-owned region.
///
/// Writing past the end fails with [`Error::Capacity`]. Callers that must not
/// leave a partial write behind compute the size with [`SizeCounter`] first,
/// as [`Codec::serialize_to`](crate::Codec::serialize_to) does.
#[derive(Debug)]
pub struct SliceEncoder<'b> {
    buffer: &'b mut [u8],
    position: usize,
}

impl<'b> SliceEncoder<'b> {
    /// Creates an encoder writing from the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'b mut [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub const fn written(&self) -> usize { self.position }
}

impl Encoder for SliceEncoder<'_> {
    fn emit_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.position + bytes.len();
        let Some(target) = self.buffer.get_mut(self.position..end) else {
            return Err(Error::Capacity {
                required: end,
                capacity: self.buffer.len(),
            });
        };

        target.copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }
}

// =============================================================================
// SizeCounter
// =============================================================================

/// An encoder that discards its input and counts the bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeCounter {
    size: usize,
}

impl SizeCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub const fn new() -> Self { Self { size: 0 } }

    /// Returns the number of bytes emitted so far.
    #[must_use]
    pub const fn size(&self) -> usize { self.size }
}

impl Encoder for SizeCounter {
    fn emit_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.size += bytes.len();
        Ok(())
    }

    fn emit_varint(&mut self, value: u64) -> Result<()> {
        self.size += varint_len(value);
        Ok(())
    }
}

// =============================================================================
// SliceDecoder
// =============================================================================

/// A decoder reading from a borrowed byte slice.
///
/// Every read is bounds-checked; running off the end fails with
/// [`Error::Truncated`] and never reads past the slice.
#[derive(Debug, Clone)]
pub struct SliceDecoder<'a> {
    bytes: &'a [u8],
    position: usize,
    options: Options,
}

impl<'a> SliceDecoder<'a> {
    /// Creates a decoder positioned at the start of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8], options: &Options) -> Self {
        Self { bytes, position: 0, options: *options }
    }

    /// Returns the offset of the next unread byte.
    #[must_use]
    pub const fn position(&self) -> usize { self.position }

    /// Moves the read position to `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if `position` is past the end.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.bytes.len() {
            return Err(Error::Truncated {
                needed: position - self.position.min(position),
                available: self.bytes.len() - self.position,
            });
        }

        self.position = position;
        Ok(())
    }

    /// Consumes `len` bytes and returns them with the slice's lifetime.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Truncated`] if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.bytes.len() - self.position;
        if len > available {
            return Err(Error::Truncated { needed: len, available });
        }

        let bytes = self.bytes;
        let taken = &bytes[self.position..self.position + len];
        self.position += len;
        Ok(taken)
    }

    /// Returns the unread bytes without consuming them.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        let bytes = self.bytes;
        &bytes[self.position..]
    }
}

impl Decoder for SliceDecoder<'_> {
    fn read_raw_bytes(&mut self, len: usize) -> Result<&[u8]> { self.take(len) }

    fn remaining(&self) -> usize { self.bytes.len() - self.position }

    fn options(&self) -> &Options { &self.options }
}
