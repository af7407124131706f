//! Type descriptors and the canonical type literal.
//!
//! Every serializable type implements [`Shape`], which describes the type's
//! static structure as a [`Descriptor`] tree: scalars with their widths,
//! containers with their element shapes, optionals, variants, and aggregates
//! with their fields in declaration order. Aggregates normally get their
//! implementation from `#[derive(Shape)]`.
//!
//! A descriptor is folded into a *type literal*, a byte string made of the
//! frozen [`tag`] constants, and the literal is hashed into the structural
//! [`Signature`](crate::Signature). Field names are carried in descriptors for
//! partial decoding but never enter the literal.
//!
//! # Example
//!
//! ```ignore
//! use wirepack::{Shape, Encode, Decode};
//!
//! #[derive(Shape, Encode, Decode)]
//! struct Person {
//!     id: u32,
//!     name: String,
//! }
//!
//! // {aggregate, u32 (width 4), text, end}
//! assert_eq!(
//!     wirepack::type_literal::<Person>().unwrap(),
//!     [0xFE, 0x07, 4, 0x10, 0xFF],
//! );
//! ```

use std::{
    any::TypeId,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    marker::PhantomData,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use crate::{
    compatible::MAX_COMPATIBLE_FIELDS,
    error::{Error, Result},
    wire::write_varint,
};

/// Frozen tag bytes of the type literal.
///
/// These values are part of the wire contract: changing any of them changes
/// every signature.
pub mod tag {
    /// `()` and other zero-sized values.
    pub const UNIT: u8 = 0x01;
    /// `bool`.
    pub const BOOL: u8 = 0x02;
    /// `u8`.
    pub const U8: u8 = 0x03;
    /// `i8`.
    pub const I8: u8 = 0x04;
    /// `u16`.
    pub const U16: u8 = 0x05;
    /// `i16`.
    pub const I16: u8 = 0x06;
    /// `u32`.
    pub const U32: u8 = 0x07;
    /// `i32`.
    pub const I32: u8 = 0x08;
    /// `u64` and `usize`.
    pub const U64: u8 = 0x09;
    /// `i64` and `isize`.
    pub const I64: u8 = 0x0A;
    /// `u128`.
    pub const U128: u8 = 0x0B;
    /// `i128`.
    pub const I128: u8 = 0x0C;
    /// `f32`.
    pub const F32: u8 = 0x0D;
    /// `f64`.
    pub const F64: u8 = 0x0E;
    /// `char`.
    pub const CHAR: u8 = 0x0F;
    /// UTF-8 text.
    pub const TEXT: u8 = 0x10;
    /// Ordered sequence, followed by the element literal.
    pub const SEQUENCE: u8 = 0x11;
    /// Set, followed by the element literal.
    pub const SET: u8 = 0x12;
    /// Mapping, followed by the key and value literals.
    pub const MAP: u8 = 0x13;
    /// Fixed-length array, followed by the element literal and a varint
    /// length.
    pub const ARRAY: u8 = 0x14;
    /// Optional value, followed by the payload literal.
    pub const OPTIONAL: u8 = 0x15;
    /// Start of a variant, followed by a varint alternative count.
    pub const VARIANT_BEGIN: u8 = 0x16;
    /// End of a variant.
    pub const VARIANT_END: u8 = 0x17;
    /// Start of a nested struct, which carries its own presence bitmap.
    pub const EXTENSIBLE_AGGREGATE_BEGIN: u8 = 0xFD;
    /// Start of an aggregate.
    pub const AGGREGATE_BEGIN: u8 = 0xFE;
    /// End of an aggregate.
    pub const AGGREGATE_END: u8 = 0xFF;
}

/// Fixed-width primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Scalar {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    F32,
    F64,
    Char,
}

impl Scalar {
    /// Returns the encoded width in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Char => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::U128 | Self::I128 => 16,
        }
    }

    /// Returns the literal tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Bool => tag::BOOL,
            Self::U8 => tag::U8,
            Self::I8 => tag::I8,
            Self::U16 => tag::U16,
            Self::I16 => tag::I16,
            Self::U32 => tag::U32,
            Self::I32 => tag::I32,
            Self::U64 => tag::U64,
            Self::I64 => tag::I64,
            Self::U128 => tag::U128,
            Self::I128 => tag::I128,
            Self::F32 => tag::F32,
            Self::F64 => tag::F64,
            Self::Char => tag::CHAR,
        }
    }
}

/// The static shape of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// A zero-sized value.
    Unit,

    /// A fixed-width primitive.
    Scalar(Scalar),

    /// Length-prefixed UTF-8 text.
    Text,

    /// A count-prefixed ordered sequence.
    Sequence(Box<Descriptor>),

    /// A count-prefixed set.
    Set(Box<Descriptor>),

    /// A count-prefixed mapping.
    Map(Box<Descriptor>, Box<Descriptor>),

    /// A fixed number of elements with no prefix.
    Array(Box<Descriptor>, usize),

    /// A presence byte followed by the payload.
    Optional(Box<Descriptor>),

    /// A discriminant followed by one alternative's fields.
    Variant(Arc<VariantDescriptor>),

    /// A struct-like record.
    Aggregate(Arc<AggregateDescriptor>),

    /// A versioned optional field. Only valid as a direct aggregate field,
    /// where it is unwrapped into a compatible [`FieldDescriptor`].
    Compatible(Box<Descriptor>, u64),
}

impl Descriptor {
    /// Returns the encoded width if every value of this shape has the same
    /// size.
    #[must_use]
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Unit => Some(0),
            Self::Scalar(scalar) => Some(scalar.width()),
            Self::Array(element, len) => element.fixed_width()?.checked_mul(*len),
            Self::Aggregate(aggregate) => aggregate.fixed_width(),
            Self::Text
            | Self::Sequence(_)
            | Self::Set(_)
            | Self::Map(..)
            | Self::Optional(_)
            | Self::Variant(_)
            | Self::Compatible(..) => None,
        }
    }

    /// Returns the literal of this shape as it appears nested inside another
    /// type.
    #[must_use]
    pub fn literal(&self) -> Vec<u8> {
        let mut literal = Vec::new();
        self.write_literal(&mut literal, false);
        literal
    }

    /// Returns the literal of this shape as the outermost type of a record.
    ///
    /// An outermost aggregate signals its presence bitmap in the header
    /// rather than in its literal, so adding its first compatible field keeps
    /// its signature.
    #[must_use]
    pub fn top_level_literal(&self) -> Vec<u8> {
        let mut literal = Vec::new();
        self.write_literal(&mut literal, true);
        literal
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_literal(&self, out: &mut Vec<u8>, top_level: bool) {
        match self {
            Self::Unit => out.push(tag::UNIT),
            Self::Scalar(scalar) => {
                out.push(scalar.tag());
                out.push(scalar.width() as u8);
            }
            Self::Text => out.push(tag::TEXT),
            Self::Sequence(element) => {
                out.push(tag::SEQUENCE);
                element.write_literal(out, false);
            }
            Self::Set(element) => {
                out.push(tag::SET);
                element.write_literal(out, false);
            }
            Self::Map(key, value) => {
                out.push(tag::MAP);
                key.write_literal(out, false);
                value.write_literal(out, false);
            }
            Self::Array(element, len) => {
                out.push(tag::ARRAY);
                element.write_literal(out, false);
                write_varint(out, *len as u64);
            }
            Self::Optional(inner) => {
                out.push(tag::OPTIONAL);
                inner.write_literal(out, false);
            }
            Self::Variant(variant) => {
                out.push(tag::VARIANT_BEGIN);
                write_varint(out, variant.alternatives.len() as u64);
                for alternative in &variant.alternatives {
                    write_fields_literal(
                        out,
                        tag::AGGREGATE_BEGIN,
                        &alternative.fields,
                    );
                }
                out.push(tag::VARIANT_END);
            }
            Self::Aggregate(aggregate) => {
                let begin = if aggregate.is_extensible() && !top_level {
                    tag::EXTENSIBLE_AGGREGATE_BEGIN
                } else {
                    tag::AGGREGATE_BEGIN
                };
                write_fields_literal(out, begin, &aggregate.fields);
            }
            Self::Compatible(inner, _) => inner.write_literal(out, false),
        }
    }
}

fn write_fields_literal(out: &mut Vec<u8>, begin: u8, fields: &[FieldDescriptor]) {
    out.push(begin);
    for field in fields.iter().filter(|field| !field.is_compatible()) {
        field.shape.write_literal(out, false);
    }
    out.push(tag::AGGREGATE_END);
}

/// One field of an aggregate or variant alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    shape: Descriptor,
    version: Option<u64>,
}

impl FieldDescriptor {
    /// The declared field name, or its position for tuple-like types.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The shape of the field. For compatible fields this is the wrapped
    /// type's shape.
    #[must_use]
    pub const fn shape(&self) -> &Descriptor { &self.shape }

    /// The version tag of a compatible field.
    #[must_use]
    pub const fn version(&self) -> Option<u64> { self.version }

    /// Whether the field is a compatible field.
    #[must_use]
    pub const fn is_compatible(&self) -> bool { self.version.is_some() }
}

/// The fields of a struct-like record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    extensible: bool,
}

impl AggregateDescriptor {
    /// The Rust name of the aggregate.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// All fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }

    /// The fields encoded unconditionally, in declaration order.
    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| !field.is_compatible())
    }

    /// The compatible fields in slot order.
    pub fn compatible_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.is_compatible())
    }

    /// Whether the aggregate declares compatible fields.
    #[must_use]
    pub fn has_compatible(&self) -> bool {
        self.fields.iter().any(FieldDescriptor::is_compatible)
    }

    /// Whether the aggregate may gain compatible fields, so that it writes a
    /// presence bitmap whenever it is nested, even an empty one. Structs are
    /// extensible; tuples and [`Duration`] are not.
    #[must_use]
    pub const fn is_extensible(&self) -> bool { self.extensible }

    /// The width of the fields when every value of the aggregate, written as
    /// the outermost value of a record, has the same size.
    #[must_use]
    pub fn body_fixed_width(&self) -> Option<usize> {
        if self.has_compatible() {
            return None;
        }

        self.fields.iter().try_fold(0usize, |acc, field| {
            acc.checked_add(field.shape.fixed_width()?)
        })
    }

    fn fixed_width(&self) -> Option<usize> {
        if self.extensible { None } else { self.body_fixed_width() }
    }
}

/// One alternative of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternativeDescriptor {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl AlternativeDescriptor {
    /// The alternative's name.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The alternative's payload fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }
}

/// A tagged union of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDescriptor {
    type_name: &'static str,
    alternatives: Vec<AlternativeDescriptor>,
}

impl VariantDescriptor {
    /// The Rust name of the variant type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// The alternatives in declaration order.
    #[must_use]
    pub fn alternatives(&self) -> &[AlternativeDescriptor] {
        &self.alternatives
    }

    /// The width in bytes of this variant's discriminant.
    #[must_use]
    pub const fn discriminant_width(&self) -> usize {
        discriminant_width(self.alternatives.len())
    }
}

/// Returns the smallest discriminant width, in bytes, that can index
/// `alternatives` alternatives.
#[must_use]
pub const fn discriminant_width(alternatives: usize) -> usize {
    if alternatives <= 1 << 8 {
        1
    } else if alternatives <= 1 << 16 {
        2
    } else {
        4
    }
}

/// Walks the static shape of types, rejecting cycles.
///
/// A builder is handed to [`Shape::describe`]. Implementations describe
/// nested types through [`describe`](Self::describe) and records through
/// [`aggregate`](Self::aggregate) or [`variant`](Self::variant), which keep
/// the stack of records under construction.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    in_progress: Vec<TypeId>,
}

impl DescriptorBuilder {
    pub(crate) fn new() -> Self { Self::default() }

    /// Describes a nested type.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidShape`] if `T` is a compatible wrapper,
    /// which is only valid as a direct struct field, and propagates any error
    /// from `T`'s own description.
    pub fn describe<T: Shape + ?Sized>(&mut self) -> Result<Descriptor> {
        match T::describe(self)? {
            Descriptor::Compatible(..) => Err(Error::invalid_shape(
                std::any::type_name::<T>(),
                "a compatible field may only appear directly inside a struct",
            )),
            descriptor => Ok(descriptor),
        }
    }

    /// Describes a struct whose fields are listed by `fields`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CyclicType`] if `T` is already being described
    /// further up the stack, and propagates errors from the field callback.
    pub fn aggregate<T: Shape + ?Sized>(
        &mut self,
        fields: impl FnOnce(&mut FieldsBuilder<'_>) -> Result<()>,
    ) -> Result<Descriptor> {
        self.build_aggregate::<T>(true, fields)
    }

    /// Describes a tuple-like record that never gains compatible fields.
    pub(crate) fn sealed_aggregate<T: Shape + ?Sized>(
        &mut self,
        fields: impl FnOnce(&mut FieldsBuilder<'_>) -> Result<()>,
    ) -> Result<Descriptor> {
        self.build_aggregate::<T>(false, fields)
    }

    fn build_aggregate<T: Shape + ?Sized>(
        &mut self,
        extensible: bool,
        fields: impl FnOnce(&mut FieldsBuilder<'_>) -> Result<()>,
    ) -> Result<Descriptor> {
        let type_name = std::any::type_name::<T>();
        self.enter::<T>(type_name)?;

        let result = {
            let mut builder = FieldsBuilder {
                builder: self,
                type_name,
                allow_compatible: extensible,
                fields: Vec::new(),
            };
            fields(&mut builder).map(|()| builder.fields)
        };

        self.in_progress.pop();

        Ok(Descriptor::Aggregate(Arc::new(AggregateDescriptor {
            type_name,
            fields: result?,
            extensible,
        })))
    }

    /// Describes a tagged union whose alternatives are listed by
    /// `alternatives`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CyclicType`] if `T` is already being described
    /// further up the stack, and propagates errors from the callback.
    pub fn variant<T: Shape + ?Sized>(
        &mut self,
        alternatives: impl FnOnce(&mut AlternativesBuilder<'_>) -> Result<()>,
    ) -> Result<Descriptor> {
        let type_name = std::any::type_name::<T>();
        self.enter::<T>(type_name)?;

        let result = {
            let mut builder = AlternativesBuilder {
                builder: self,
                type_name,
                alternatives: Vec::new(),
            };
            alternatives(&mut builder).map(|()| builder.alternatives)
        };

        self.in_progress.pop();

        let alternatives = result?;
        if u32::try_from(alternatives.len()).is_err() {
            return Err(Error::invalid_shape(type_name, "too many alternatives"));
        }

        Ok(Descriptor::Variant(Arc::new(VariantDescriptor {
            type_name,
            alternatives,
        })))
    }

    fn enter<T: ?Sized + 'static>(&mut self, type_name: &'static str) -> Result<()> {
        let id = TypeId::of::<T>();
        if self.in_progress.contains(&id) {
            return Err(Error::CyclicType { type_name });
        }

        self.in_progress.push(id);
        Ok(())
    }
}

/// Collects the fields of one aggregate or variant alternative.
#[derive(Debug)]
pub struct FieldsBuilder<'b> {
    builder: &'b mut DescriptorBuilder,
    type_name: &'static str,
    allow_compatible: bool,
    fields: Vec<FieldDescriptor>,
}

impl FieldsBuilder<'_> {
    /// Appends a field of type `T`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidShape`] when a compatible field appears in a
    /// variant alternative, when a mandatory field follows a compatible one,
    /// when compatible versions decrease, or when the aggregate exceeds
    /// [`MAX_COMPATIBLE_FIELDS`].
    pub fn field<T: Shape + ?Sized>(&mut self, name: &'static str) -> Result<()> {
        let (shape, version) = match T::describe(self.builder)? {
            Descriptor::Compatible(inner, version) => {
                self.check_compatible(name, version)?;
                (*inner, Some(version))
            }
            shape => {
                if self.fields.iter().any(FieldDescriptor::is_compatible) {
                    return Err(Error::invalid_shape(
                        self.type_name,
                        format!(
                            "mandatory field `{name}` is declared after a \
                             compatible field"
                        ),
                    ));
                }
                (shape, None)
            }
        };

        self.fields.push(FieldDescriptor { name, shape, version });
        Ok(())
    }

    /// Appends a field of type `T`, rejecting compatible wrappers.
    pub(crate) fn mandatory_field<T: Shape + ?Sized>(
        &mut self,
        name: &'static str,
    ) -> Result<()> {
        let shape = self.builder.describe::<T>()?;
        self.fields.push(FieldDescriptor { name, shape, version: None });
        Ok(())
    }

    fn check_compatible(&self, name: &str, version: u64) -> Result<()> {
        if !self.allow_compatible {
            return Err(Error::invalid_shape(
                self.type_name,
                format!("compatible field `{name}` is not allowed in a variant"),
            ));
        }

        let mut previous = self.fields.iter().filter_map(|f| f.version);
        if let Some(last) = previous.clone().last()
            && version < last
        {
            return Err(Error::invalid_shape(
                self.type_name,
                format!(
                    "compatible field `{name}` has version {version}, lower \
                     than the preceding compatible field's {last}"
                ),
            ));
        }

        if previous.by_ref().count() >= MAX_COMPATIBLE_FIELDS {
            return Err(Error::invalid_shape(
                self.type_name,
                format!(
                    "more than {MAX_COMPATIBLE_FIELDS} compatible fields"
                ),
            ));
        }

        Ok(())
    }
}

/// Collects the alternatives of one variant.
#[derive(Debug)]
pub struct AlternativesBuilder<'b> {
    builder: &'b mut DescriptorBuilder,
    type_name: &'static str,
    alternatives: Vec<AlternativeDescriptor>,
}

impl AlternativesBuilder<'_> {
    /// Appends an alternative whose payload fields are listed by `fields`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the field callback.
    pub fn alternative(
        &mut self,
        name: &'static str,
        fields: impl FnOnce(&mut FieldsBuilder<'_>) -> Result<()>,
    ) -> Result<()> {
        let mut builder = FieldsBuilder {
            builder: &mut *self.builder,
            type_name: self.type_name,
            allow_compatible: false,
            fields: Vec::new(),
        };
        fields(&mut builder)?;

        let fields = builder.fields;
        self.alternatives.push(AlternativeDescriptor { name, fields });
        Ok(())
    }
}

/// A type whose static shape can be described for the codec.
///
/// Implement it with `#[derive(Shape)]` for structs and enums. The derive
/// lists fields in declaration order; `#[wirepack(skip)]` fields are left out.
#[diagnostic::on_unimplemented(
    message = "The type `{Self}` does not implement `Shape`",
    note = "You can derive `Shape` using the `#[derive(Shape)]` macro"
)]
pub trait Shape: 'static {
    /// Describes the type's shape.
    ///
    /// # Errors
    ///
    /// Fails if the shape is cyclic or breaks a layout rule.
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor>;
}

// =============================================================================
// Implementations for std types
// =============================================================================

macro_rules! impl_shape_scalar {
    ($($ty:ty => $scalar:ident),+ $(,)?) => {
        $(
            impl Shape for $ty {
                fn describe(_: &mut DescriptorBuilder) -> Result<Descriptor> {
                    Ok(Descriptor::Scalar(Scalar::$scalar))
                }
            }
        )+
    };
}

impl_shape_scalar!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    usize => U64,
    isize => I64,
    u128 => U128,
    i128 => I128,
    f32 => F32,
    f64 => F64,
    char => Char,
);

impl Shape for () {
    fn describe(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Unit)
    }
}

impl<T: ?Sized + 'static> Shape for PhantomData<T> {
    fn describe(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Unit)
    }
}

impl Shape for str {
    fn describe(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Text)
    }
}

impl Shape for String {
    fn describe(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Text)
    }
}

macro_rules! impl_shape_pointer {
    ($($ptr:ident),+) => {
        $(
            impl<T: Shape + ?Sized> Shape for $ptr<T> {
                fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
                    builder.describe::<T>()
                }
            }
        )+
    };
}

impl_shape_pointer!(Box, Rc, Arc);

impl<T: Shape> Shape for Option<T> {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Optional(Box::new(builder.describe::<T>()?)))
    }
}

impl<T: Shape, E: Shape> Shape for std::result::Result<T, E> {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        builder.variant::<Self>(|alternatives| {
            alternatives.alternative("Ok", |fields| fields.field::<T>("0"))?;
            alternatives.alternative("Err", |fields| fields.field::<E>("0"))
        })
    }
}

macro_rules! impl_shape_sequence {
    ($kind:ident => $($ty:ty),+) => {
        $(
            impl<T: Shape> Shape for $ty {
                fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
                    Ok(Descriptor::$kind(Box::new(builder.describe::<T>()?)))
                }
            }
        )+
    };
}

impl_shape_sequence!(Sequence => [T], Vec<T>, VecDeque<T>, LinkedList<T>);
impl_shape_sequence!(Set => BTreeSet<T>);

impl<T: Shape, S: 'static> Shape for HashSet<T, S> {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Set(Box::new(builder.describe::<T>()?)))
    }
}

impl<T: Shape, const N: usize> Shape for [T; N] {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::Array(Box::new(builder.describe::<T>()?), N))
    }
}

impl<K: Shape, V: Shape, S: 'static> Shape for HashMap<K, V, S> {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let key = builder.describe::<K>()?;
        let value = builder.describe::<V>()?;
        Ok(Descriptor::Map(Box::new(key), Box::new(value)))
    }
}

impl<K: Shape, V: Shape> Shape for BTreeMap<K, V> {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let key = builder.describe::<K>()?;
        let value = builder.describe::<V>()?;
        Ok(Descriptor::Map(Box::new(key), Box::new(value)))
    }
}

impl Shape for Duration {
    fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        builder.sealed_aggregate::<Self>(|fields| {
            fields.mandatory_field::<u64>("secs")?;
            fields.mandatory_field::<u32>("nanos")
        })
    }
}

macro_rules! impl_shape_tuple {
    ($($name:ident $index:tt),+) => {
        impl<$($name: Shape),+> Shape for ($($name,)+) {
            fn describe(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
                builder.sealed_aggregate::<Self>(|fields| {
                    $(fields.mandatory_field::<$name>(stringify!($index))?;)+
                    Ok(())
                })
            }
        }
    };
}

impl_shape_tuple!(A 0);
impl_shape_tuple!(A 0, B 1);
impl_shape_tuple!(A 0, B 1, C 2);
impl_shape_tuple!(A 0, B 1, C 2, D 3);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_shape_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);
