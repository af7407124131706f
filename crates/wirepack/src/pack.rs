//! Several independent records in one buffer.
//!
//! Each value keeps its own header, so a consumer can read any prefix of the
//! records with [`deserialize_at`](crate::deserialize_at) as well as all of
//! them with [`deserialize_many`](crate::deserialize_many). Value N's record
//! always precedes value N+1's.

use crate::{
    codec::{read_record, write_record},
    decode::{Decode, Decoder},
    descriptor::Shape,
    encode::{Encode, Encoder},
    error::Result,
};

/// A group of values written as consecutive records.
pub trait Pack {
    /// Writes one record per value.
    ///
    /// # Errors
    ///
    /// Fails if any value's shape is invalid.
    fn pack<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()>;
}

/// A group of values read from consecutive records.
pub trait Unpack: Sized {
    /// Reads one record per value.
    ///
    /// # Errors
    ///
    /// Fails as a single-record decode would, for each record.
    fn unpack<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self>;
}

impl<T: Shape + Encode> Pack for [T] {
    fn pack<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        self.iter().try_for_each(|value| write_record(value, encoder))
    }
}

impl<T: Shape + Encode, const N: usize> Pack for [T; N] {
    fn pack<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        self.as_slice().pack(encoder)
    }
}

impl<T: Shape + Encode> Pack for Vec<T> {
    fn pack<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
        self.as_slice().pack(encoder)
    }
}

/// Reads records until the input is exhausted. A partial trailing record
/// fails with [`Error::Truncated`](crate::Error::Truncated).
impl<T: Shape + Decode> Unpack for Vec<T> {
    fn unpack<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
        let mut values = Self::new();
        while decoder.remaining() > 0 {
            values.push(read_record(decoder)?);
        }
        Ok(values)
    }
}

macro_rules! impl_pack_tuple {
    ($($name:ident),+) => {
        impl<$($name: Shape + Encode),+> Pack for ($($name,)+) {
            #[allow(non_snake_case)]
            fn pack<E: Encoder + ?Sized>(&self, encoder: &mut E) -> Result<()> {
                let ($($name,)+) = self;
                $(write_record($name, encoder)?;)+
                Ok(())
            }
        }

        impl<$($name: Shape + Decode),+> Unpack for ($($name,)+) {
            fn unpack<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self> {
                Ok(($(read_record::<$name, D>(decoder)?,)+))
            }
        }
    };
}

impl_pack_tuple!(A);
impl_pack_tuple!(A, B);
impl_pack_tuple!(A, B, C);
impl_pack_tuple!(A, B, C, D_);
impl_pack_tuple!(A, B, C, D_, E_);
impl_pack_tuple!(A, B, C, D_, E_, F);
impl_pack_tuple!(A, B, C, D_, E_, F, G);
impl_pack_tuple!(A, B, C, D_, E_, F, G, H);
impl_pack_tuple!(A, B, C, D_, E_, F, G, H, I);
impl_pack_tuple!(A, B, C, D_, E_, F, G, H, I, J);
impl_pack_tuple!(A, B, C, D_, E_, F, G, H, I, J, K);
impl_pack_tuple!(A, B, C, D_, E_, F, G, H, I, J, K, L);
