//! Per-type layout plans.
//!
//! A [`Layout`] is derived once per type from its [`Descriptor`]. It fixes the
//! type literal and [`Signature`], partitions an aggregate's fields into
//! mandatory and compatible ones, assigns every field an [`Encoding`], and
//! records the byte offset of each mandatory field that can be located
//! without reading the buffer.
//!
//! Layouts are cached process-wide by [`TypeId`] and shared as
//! `Arc<Layout>`. The first call for a type builds its layout under the cache
//! shard's entry lock; later calls return the published value.

use std::{
    any::TypeId,
    sync::{Arc, LazyLock},
};

use dashmap::{DashMap, mapref::entry::Entry};
use fxhash::FxBuildHasher;

use crate::{
    compatible::CompatibleFields,
    decode::Decoder,
    descriptor::{AggregateDescriptor, Descriptor, DescriptorBuilder, Shape},
    error::{Error, Result},
    partial::FieldSelector,
    signature::Signature,
};

static LAYOUTS: LazyLock<DashMap<TypeId, Arc<Layout>, FxBuildHasher>> =
    LazyLock::new(DashMap::default);

/// How a field is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Exactly this many bytes, no prefix.
    Fixed(usize),

    /// A varint byte length or element count, then the contents.
    LengthPrefixed,

    /// A presence byte, then the payload if present.
    Optional,

    /// A discriminant of the given width, then the active alternative.
    Variant {
        /// Width of the discriminant in bytes.
        discriminant_width: usize,
    },

    /// A variable-width aggregate or array written inline.
    Nested,

    /// A bit in the presence bitmap; the payload, if any, follows the
    /// mandatory fields.
    Compatible,
}

impl Encoding {
    /// Returns the encoding of a mandatory field of the given shape.
    #[must_use]
    pub fn of(descriptor: &Descriptor) -> Self {
        if let Some(width) = descriptor.fixed_width() {
            return Self::Fixed(width);
        }

        match descriptor {
            Descriptor::Text
            | Descriptor::Sequence(_)
            | Descriptor::Set(_)
            | Descriptor::Map(..) => Self::LengthPrefixed,
            Descriptor::Optional(_) => Self::Optional,
            Descriptor::Variant(variant) => Self::Variant {
                discriminant_width: variant.discriminant_width(),
            },
            Descriptor::Compatible(..) => Self::Compatible,
            Descriptor::Unit
            | Descriptor::Scalar(_)
            | Descriptor::Array(..)
            | Descriptor::Aggregate(_) => Self::Nested,
        }
    }
}

/// The slot of a compatible field in its aggregate's presence bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompatibleSlot {
    /// Zero-based slot number, in declaration order.
    pub slot: usize,

    /// The field's version tag.
    pub version: u64,
}

/// Layout metadata of one aggregate field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    index: usize,
    name: &'static str,
    descriptor: Descriptor,
    encoding: Encoding,
    offset: Option<usize>,
    compatible: Option<CompatibleSlot>,
    literal: Vec<u8>,
}

impl FieldLayout {
    /// Position of the field in declaration order.
    #[must_use]
    pub const fn index(&self) -> usize { self.index }

    /// The field's name.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The field's shape; for compatible fields, the wrapped type's shape.
    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor { &self.descriptor }

    /// How the field is laid out.
    #[must_use]
    pub const fn encoding(&self) -> Encoding { self.encoding }

    /// Byte offset of a mandatory field from the first mandatory byte, when
    /// every field before it has a fixed width.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> { self.offset }

    /// The bitmap slot of a compatible field.
    #[must_use]
    pub const fn compatible(&self) -> Option<CompatibleSlot> { self.compatible }

    /// Whether the field is compatible.
    #[must_use]
    pub const fn is_compatible(&self) -> bool { self.compatible.is_some() }

    /// The literal of the field's shape, used to check requested types.
    #[must_use]
    pub fn literal(&self) -> &[u8] { &self.literal }
}

/// The immutable layout plan of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    type_name: &'static str,
    descriptor: Descriptor,
    literal: Vec<u8>,
    signature: Signature,
    has_compatible: bool,
    fields: Vec<FieldLayout>,
}

impl Layout {
    /// Returns the cached layout of `T`, building it on first use.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CyclicType`] or [`Error::InvalidShape`] if `T`'s
    /// shape is invalid. Failures are not cached.
    pub fn of<T: Shape + ?Sized>() -> Result<Arc<Self>> {
        let id = TypeId::of::<T>();

        if let Some(layout) = LAYOUTS.get(&id) {
            return Ok(layout.clone());
        }

        match LAYOUTS.entry(id) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let layout = Arc::new(Self::build::<T>()?);
                entry.insert(layout.clone());
                Ok(layout)
            }
        }
    }

    fn build<T: Shape + ?Sized>() -> Result<Self> {
        let type_name = std::any::type_name::<T>();
        let descriptor = DescriptorBuilder::new().describe::<T>()?;
        let literal = descriptor.top_level_literal();
        let signature = Signature::of_literal(&literal);

        let (fields, has_compatible) = match &descriptor {
            Descriptor::Aggregate(aggregate) => {
                (plan_fields(aggregate), aggregate.has_compatible())
            }
            _ => (Vec::new(), false),
        };

        let layout = Self {
            type_name,
            descriptor,
            literal,
            signature,
            has_compatible,
            fields,
        };

        tracing::debug!(
            type_name,
            %signature,
            mandatory = layout.mandatory_fields().count(),
            compatible = layout.compatible_fields().count(),
            fixed_size = ?layout.fixed_size(),
            "planned layout"
        );

        Ok(layout)
    }

    /// The Rust name of the type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// The type's descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor { &self.descriptor }

    /// The type literal hashed into the signature.
    #[must_use]
    pub fn literal(&self) -> &[u8] { &self.literal }

    /// The structural signature written in every record header.
    #[must_use]
    pub const fn signature(&self) -> Signature { self.signature }

    /// Whether records of this type carry a presence bitmap.
    #[must_use]
    pub const fn has_compatible(&self) -> bool { self.has_compatible }

    /// The body size if every value has the same encoded size.
    #[must_use]
    pub fn fixed_size(&self) -> Option<usize> {
        match &self.descriptor {
            Descriptor::Aggregate(aggregate) => aggregate.body_fixed_width(),
            descriptor => descriptor.fixed_width(),
        }
    }

    /// All fields of an aggregate in declaration order; empty for other
    /// types.
    #[must_use]
    pub fn fields(&self) -> &[FieldLayout] { &self.fields }

    /// The mandatory fields in declaration order.
    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldLayout> {
        self.fields.iter().filter(|field| !field.is_compatible())
    }

    /// The compatible fields in slot order.
    pub fn compatible_fields(&self) -> impl Iterator<Item = &FieldLayout> {
        self.fields.iter().filter(|field| field.is_compatible())
    }

    /// Finds the field picked by `selector`.
    #[must_use]
    pub fn field(&self, selector: FieldSelector<'_>) -> Option<&FieldLayout> {
        match selector {
            FieldSelector::Index(index) => self.fields.get(index),
            FieldSelector::Name(name) => {
                self.fields.iter().find(|field| field.name == name)
            }
        }
    }
}

fn plan_fields(aggregate: &AggregateDescriptor) -> Vec<FieldLayout> {
    let mut next_offset = Some(0usize);
    let mut next_slot = 0;

    aggregate
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let descriptor = field.shape().clone();
            let literal = descriptor.literal();

            let (encoding, offset, compatible) = match field.version() {
                Some(version) => {
                    let slot = CompatibleSlot { slot: next_slot, version };
                    next_slot += 1;
                    (Encoding::Compatible, None, Some(slot))
                }
                None => {
                    let offset = next_offset;
                    next_offset = next_offset
                        .zip(descriptor.fixed_width())
                        .and_then(|(offset, width)| offset.checked_add(width));
                    (Encoding::of(&descriptor), offset, None)
                }
            };

            FieldLayout {
                index,
                name: field.name(),
                descriptor,
                encoding,
                offset,
                compatible,
                literal,
            }
        })
        .collect()
}

/// Steps over one value of the given shape without materialising it.
pub(crate) fn skip<D: Decoder + ?Sized>(
    descriptor: &Descriptor,
    decoder: &mut D,
) -> Result<()> {
    if let Some(width) = descriptor.fixed_width() {
        decoder.read_raw_bytes(width)?;
        return Ok(());
    }

    match descriptor {
        Descriptor::Text => {
            let len = decoder.read_len()?;
            decoder.read_raw_bytes(len)?;
        }
        Descriptor::Sequence(element) | Descriptor::Set(element) => {
            let count = decoder.read_len()?;
            skip_elements(element, count, decoder)?;
        }
        Descriptor::Array(element, count) => {
            skip_elements(element, *count, decoder)?;
        }
        Descriptor::Map(key, value) => {
            let count = decoder.read_len()?;
            for _ in 0..count {
                skip(key, decoder)?;
                skip(value, decoder)?;
            }
        }
        Descriptor::Optional(inner) => {
            if decoder.read_bool()? {
                skip(inner, decoder)?;
            }
        }
        Descriptor::Variant(variant) => {
            let alternatives = variant.alternatives();
            let index = decoder.read_discriminant(alternatives.len())?;
            let alternative = alternatives.get(index).ok_or_else(|| {
                Error::invalid_discriminant(
                    index,
                    alternatives.len(),
                    variant.type_name(),
                )
            })?;

            for field in alternative.fields() {
                skip(field.shape(), decoder)?;
            }
        }
        Descriptor::Aggregate(aggregate) => {
            let mut compatible =
                CompatibleFields::begin(decoder, aggregate.is_extensible())?;
            for field in aggregate.mandatory_fields() {
                skip(field.shape(), decoder)?;
            }
            compatible.finish(decoder)?;
        }
        Descriptor::Compatible(..) => {
            return Err(Error::invalid_data(
                "a compatible field cannot be skipped outside its aggregate",
            ));
        }
        Descriptor::Unit | Descriptor::Scalar(_) => {}
    }

    Ok(())
}

fn skip_elements<D: Decoder + ?Sized>(
    element: &Descriptor,
    count: usize,
    decoder: &mut D,
) -> Result<()> {
    if let Some(width) = element.fixed_width() {
        let total = count.checked_mul(width).ok_or_else(|| {
            Error::invalid_data(format!(
                "{count} elements of {width} bytes overflow the address space"
            ))
        })?;
        decoder.read_raw_bytes(total)?;
        return Ok(());
    }

    for _ in 0..count {
        skip(element, decoder)?;
    }

    Ok(())
}

#[cfg(test)]
mod test;
