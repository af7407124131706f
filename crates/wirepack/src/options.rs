//! Decoding limits and policies.
//!
//! [`Options`] are carried by a [`Codec`](crate::Codec) and consulted by every
//! [`Decoder`](crate::Decoder). Encoding is not configurable: the wire format
//! is fixed so that any two peers agree on it.
//!
//! ```ignore
//! use wirepack::{Codec, Options, TrailingBytes};
//!
//! let options = Options::builder()
//!     .max_collection_len(1 << 20)
//!     .trailing_bytes(TrailingBytes::Ignore)
//!     .build();
//!
//! let codec = Codec::new(options);
//! ```

use bon::Builder;

/// What to do when bytes remain after the expected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TrailingBytes {
    /// Fail with [`Error::TrailingBytes`](crate::Error::TrailingBytes).
    #[default]
    Reject,

    /// Leave the remaining bytes unread.
    Ignore,
}

/// Limits applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Builder)]
pub struct Options {
    /// The largest element count or byte length accepted from a length
    /// prefix.
    ///
    /// Larger prefixes fail with [`Error::InvalidData`](crate::Error) before
    /// anything is allocated.
    #[builder(default = DEFAULT_MAX_COLLECTION_LEN)]
    pub max_collection_len: usize,

    /// The number of elements reserved up front for a decoded collection.
    ///
    /// Collections longer than this grow while decoding, so a forged length
    /// prefix cannot force a large allocation.
    #[builder(default = 4096)]
    pub max_preallocation: usize,

    /// Policy for bytes left over after the expected records.
    #[builder(default)]
    pub trailing_bytes: TrailingBytes,
}

#[allow(clippy::cast_possible_truncation)]
const DEFAULT_MAX_COLLECTION_LEN: usize = u32::MAX as usize;

impl Options {
    /// The options used by the crate-level free functions.
    pub const DEFAULT: Self = Self {
        max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
        max_preallocation: 4096,
        trailing_bytes: TrailingBytes::Reject,
    };
}

impl Default for Options {
    fn default() -> Self { Self::DEFAULT }
}
