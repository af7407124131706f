//! A compact binary codec with structural schema checking.
//!
//! `wirepack` turns values into self-checking byte records and back. Every
//! record starts with a 32-bit [`Signature`] derived from the *shape* of the
//! encoded type: the kinds, widths and order of its fields. Decoding a record
//! as a type with a different shape fails with [`Error::SchemaMismatch`]
//! before any field is read, with no IDL or code generation step.
//!
//! Schemas can still evolve: fields wrapped in [`Compatible`] are left out of
//! the signature and may be added or removed independently by producers and
//! consumers.
//!
//! # Overview
//!
//! The crate is organised around three traits, all derivable:
//!
//! - [`Shape`]: describes a type's static structure, from which the
//!   [`Layout`] plan and signature are built once per type.
//! - [`Encode`]: writes a value's body to an [`Encoder`].
//! - [`Decode`]: rebuilds a value from a [`Decoder`].
//!
//! ```ignore
//! use wirepack::{Compatible, Decode, Encode, Shape};
//!
//! #[derive(Debug, PartialEq, Shape, Encode, Decode)]
//! struct Person {
//!     id: u32,
//!     name: String,
//!     email: Compatible<String, 1>,
//! }
//!
//! let person = Person {
//!     id: 7,
//!     name: "Ada".to_owned(),
//!     email: Compatible::new("ada@example.com".to_owned()),
//! };
//!
//! let bytes = wirepack::serialize(&person)?;
//! assert_eq!(wirepack::deserialize::<Person>(&bytes)?, person);
//!
//! // Only the selected field is decoded.
//! let name: String = wirepack::get_field::<Person, _>(&bytes, "name")?;
//! ```
//!
//! ## Field Attributes
//!
//! Use `#[wirepack(skip)]` to leave a field out of the shape and the
//! encoding. The field must implement `Default` for decoding.
//!
//! ## Enums
//!
//! Enums are encoded as a discriminant, one to four bytes wide depending on
//! the number of variants, followed by the active variant's fields.
//! Compatible fields are not allowed in enum variants.

// Allow derive macros to reference this crate as `wirepack` internally
extern crate self as wirepack;

pub mod codec;
pub mod compatible;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod layout;
pub mod options;
pub mod pack;
pub mod partial;
pub mod signature;
pub mod wire;

pub use codec::Codec;
pub use compatible::{Compatible, PresenceBitmap};
pub use decode::{Decode, Decoder};
pub use descriptor::{Descriptor, DescriptorBuilder, Shape};
pub use encode::{Encode, Encoder};
pub use error::{Error, Result};
pub use layout::{Encoding, FieldLayout, Layout};
pub use options::{Options, TrailingBytes};
pub use pack::{Pack, Unpack};
pub use partial::{FieldSelector, PartialRecord};
pub use signature::Signature;
// Re-export derive macros
pub use wirepack_derive::{Decode, Encode, Shape};

// =============================================================================
// Convenience functions
// =============================================================================

/// Encodes `value` into a new buffer with default options.
///
/// See [`Codec::serialize`].
///
/// # Errors
///
/// Fails if `T`'s shape is invalid.
pub fn serialize<T: Shape + Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Codec::default().serialize(value)
}

/// Appends the record of `value` to `buffer`.
///
/// See [`Codec::serialize_append`].
///
/// # Errors
///
/// Fails if `T`'s shape is invalid; `buffer` is then left unchanged.
pub fn serialize_append<T: Shape + Encode + ?Sized>(
    value: &T,
    buffer: &mut Vec<u8>,
) -> Result<usize> {
    Codec::default().serialize_append(value, buffer)
}

/// Encodes `value` into the front of `out`.
///
/// See [`Codec::serialize_to`].
///
/// # Errors
///
/// Fails with [`Error::Capacity`], writing nothing, if `out` is too small.
pub fn serialize_to<T: Shape + Encode + ?Sized>(
    value: &T,
    out: &mut [u8],
) -> Result<usize> {
    Codec::default().serialize_to(value, out)
}

/// Encodes `value` after `offset` reserved zero bytes.
///
/// See [`Codec::serialize_with_offset`].
///
/// # Errors
///
/// Fails if `T`'s shape is invalid.
pub fn serialize_with_offset<T: Shape + Encode + ?Sized>(
    value: &T,
    offset: usize,
) -> Result<Vec<u8>> {
    Codec::default().serialize_with_offset(value, offset)
}

/// Returns the exact encoded size of `value`.
///
/// # Errors
///
/// Fails if `T`'s shape is invalid.
pub fn serialized_size<T: Shape + Encode + ?Sized>(value: &T) -> Result<usize> {
    Codec::default().serialized_size(value)
}

/// Encodes several values as consecutive records.
///
/// # Errors
///
/// Fails if any value's shape is invalid.
pub fn serialize_many<P: Pack + ?Sized>(values: &P) -> Result<Vec<u8>> {
    Codec::default().serialize_many(values)
}

/// Decodes a record of type `T` with default options.
///
/// See [`Codec::deserialize`].
///
/// # Errors
///
/// Fails with [`Error::SchemaMismatch`], [`Error::Truncated`],
/// [`Error::InvalidData`] or [`Error::TrailingBytes`].
pub fn deserialize<T: Shape + Decode>(bytes: &[u8]) -> Result<T> {
    Codec::default().deserialize(bytes)
}

/// Decodes a record of type `T` over `value`.
///
/// See [`Codec::deserialize_into`].
///
/// # Errors
///
/// Same as [`deserialize`].
pub fn deserialize_into<T: Shape + Decode>(bytes: &[u8], value: &mut T) -> Result<()> {
    Codec::default().deserialize_into(bytes, value)
}

/// Decodes the record at `*offset`, advancing `offset` on success.
///
/// See [`Codec::deserialize_at`].
///
/// # Errors
///
/// Same as [`deserialize`], without the trailing bytes check.
pub fn deserialize_at<T: Shape + Decode>(bytes: &[u8], offset: &mut usize) -> Result<T> {
    Codec::default().deserialize_at(bytes, offset)
}

/// Decodes consecutive records.
///
/// # Errors
///
/// Same as [`deserialize`], for each record.
pub fn deserialize_many<U: Unpack>(bytes: &[u8]) -> Result<U> {
    Codec::default().deserialize_many(bytes)
}

/// Locates the selected fields of a `T` record.
///
/// See [`Codec::deserialize_partial`].
///
/// # Errors
///
/// Fails with [`Error::UnknownField`] for unknown selectors, and as
/// [`deserialize`] for the walked part of the buffer.
pub fn deserialize_partial<'a, T: Shape + ?Sized>(
    bytes: &'a [u8],
    selectors: &[FieldSelector<'_>],
) -> Result<PartialRecord<'a>> {
    Codec::default().deserialize_partial::<T>(bytes, selectors)
}

/// Decodes a single field of a `T` record.
///
/// # Errors
///
/// See [`PartialRecord::get`].
pub fn get_field<'s, T: Shape + ?Sized, F: Shape + Decode>(
    bytes: &[u8],
    selector: impl Into<FieldSelector<'s>>,
) -> Result<F> {
    Codec::default().get_field::<T, F>(bytes, selector)
}

/// Returns the type literal that `T`'s signature is computed from.
///
/// # Errors
///
/// Fails if `T`'s shape is invalid.
pub fn type_literal<T: Shape + ?Sized>() -> Result<Vec<u8>> {
    Ok(Layout::of::<T>()?.literal().to_vec())
}

/// Returns the structural signature of `T`.
///
/// # Errors
///
/// Fails if `T`'s shape is invalid.
pub fn signature<T: Shape + ?Sized>() -> Result<Signature> {
    Signature::of::<T>()
}
