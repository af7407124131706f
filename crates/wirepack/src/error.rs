//! Error type shared by every codec operation.
//!
//! Each failure is surfaced synchronously as a distinct [`Error`] variant. The
//! three conditions callers most often branch on have dedicated predicates:
//! [`Error::is_schema_mismatch`], [`Error::is_truncated`] and
//! [`Error::is_capacity`].

use crate::signature::Signature;

/// The result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while describing, encoding or decoding a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The structural signature in the buffer header does not match the
    /// signature of the type being decoded. The body is never interpreted.
    #[error("schema mismatch: expected signature {expected}, found {found}")]
    SchemaMismatch {
        /// The signature of the statically expected type.
        expected: Signature,

        /// The signature read from the buffer header.
        found: Signature,
    },

    /// The buffer ended before the layout was satisfied. More bytes may make
    /// the same buffer decodable.
    #[error(
        "truncated input: {needed} bytes required but only {available} remain"
    )]
    Truncated {
        /// The number of bytes the decoder tried to consume.
        needed: usize,

        /// The number of bytes left in the buffer.
        available: usize,
    },

    /// A caller-owned output region is too small for the encoded value.
    /// Reported before any byte is written.
    #[error(
        "insufficient capacity: {required} bytes required but only {capacity} \
         available"
    )]
    Capacity {
        /// The exact encoded size of the value.
        required: usize,

        /// The size of the region supplied by the caller.
        capacity: usize,
    },

    /// The bytes are well-delimited but describe an impossible value, such as
    /// a boolean byte other than `0` or `1`.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Bytes remain after the last expected record.
    #[error("{count} trailing bytes after the last record")]
    TrailingBytes {
        /// The number of unread bytes.
        count: usize,
    },

    /// A type contains itself, directly or through other aggregates.
    #[error("type `{type_name}` contains itself")]
    CyclicType {
        /// The name of the aggregate that was reached twice.
        type_name: &'static str,
    },

    /// A type's shape breaks a layout rule, for example a compatible field
    /// nested inside a container.
    #[error("invalid shape for `{type_name}`: {reason}")]
    InvalidShape {
        /// The name of the offending type.
        type_name: &'static str,

        /// What rule was broken.
        reason: String,
    },

    /// A field selector names a field the type does not declare or that was
    /// not selected for extraction.
    #[error("no field matching {0}")]
    UnknownField(String),

    /// A field was requested as a type whose shape differs from the declared
    /// field.
    #[error("field {field} has a different shape than the requested type")]
    FieldShapeMismatch {
        /// The selector of the field.
        field: String,
    },

    /// A compatible field was requested but the producer did not write it.
    #[error("compatible field {field} is absent from the buffer")]
    FieldAbsent {
        /// The selector of the field.
        field: String,
    },
}

impl Error {
    /// Returns `true` for [`Error::SchemaMismatch`].
    #[must_use]
    pub const fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }

    /// Returns `true` for [`Error::Truncated`].
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }

    /// Returns `true` for [`Error::Capacity`].
    #[must_use]
    pub const fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity { .. })
    }

    pub(crate) fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData(reason.into())
    }

    pub(crate) fn invalid_shape(
        type_name: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidShape { type_name, reason: reason.into() }
    }

    /// Builds the error reported for a discriminant outside the alternatives
    /// of `type_name`.
    #[doc(hidden)]
    #[must_use]
    pub fn invalid_discriminant(
        index: usize,
        alternatives: usize,
        type_name: &str,
    ) -> Self {
        Self::InvalidData(format!(
            "invalid discriminant {index} for {type_name} (expected \
             0..{alternatives})"
        ))
    }
}
