//! Partial field extraction.
//!
//! [`deserialize_partial`](crate::deserialize_partial) validates a record's
//! header, then walks only as far as the selected fields require. Fields
//! before a selected field are stepped over by their fixed offset where the
//! layout has one, and by the skip rules otherwise. The selected fields are
//! kept as borrowed byte spans and decoded on demand by [`PartialRecord::get`].
//!
//! Text and byte-sequence fields can also be viewed in place with
//! [`PartialRecord::get_str`] and [`PartialRecord::get_bytes`], which borrow
//! from the input buffer instead of allocating.

use std::{fmt, sync::Arc};

use crate::{
    codec::read_header,
    decode::{Decode, Decoder},
    descriptor::{Descriptor, Scalar, Shape},
    error::{Error, Result},
    layout::{self, FieldLayout, Layout},
    options::Options,
    wire::SliceDecoder,
};

/// Picks a field by declaration index or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSelector<'s> {
    /// Zero-based position in declaration order, compatible fields
    /// included.
    Index(usize),

    /// The declared field name; `"0"`, `"1"`, ... for tuple structs.
    Name(&'s str),
}

impl From<usize> for FieldSelector<'_> {
    fn from(index: usize) -> Self { Self::Index(index) }
}

impl<'s> From<&'s str> for FieldSelector<'s> {
    fn from(name: &'s str) -> Self { Self::Name(name) }
}

impl fmt::Display for FieldSelector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => write!(f, "`{name}`"),
        }
    }
}

/// The selected fields of one record, borrowed from the input buffer.
#[derive(Debug, Clone)]
pub struct PartialRecord<'a> {
    layout: Arc<Layout>,
    spans: Vec<(usize, Option<&'a [u8]>)>,
    options: Options,
}

impl<'a> PartialRecord<'a> {
    /// The layout of the record's type.
    #[must_use]
    pub fn layout(&self) -> &Layout { &self.layout }

    /// Whether the selected field was written by the producer. Mandatory
    /// fields are always present.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownField`] if the field does not exist or was
    /// not selected.
    pub fn is_present<'s>(
        &self,
        selector: impl Into<FieldSelector<'s>>,
    ) -> Result<bool> {
        Ok(self.span(selector.into())?.1.is_some())
    }

    /// The encoded bytes of the selected field, or `None` for an absent
    /// compatible field.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownField`] if the field does not exist or was
    /// not selected.
    pub fn raw<'s>(
        &self,
        selector: impl Into<FieldSelector<'s>>,
    ) -> Result<Option<&'a [u8]>> {
        Ok(self.span(selector.into())?.1)
    }

    /// Decodes the selected field as `F`.
    ///
    /// For compatible fields `F` is the wrapped type.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownField`] if the field does not exist or was not
    ///   selected.
    /// - [`Error::FieldShapeMismatch`] if `F`'s shape differs from the
    ///   field's.
    /// - [`Error::FieldAbsent`] for an absent compatible field.
    /// - [`Error::InvalidData`] if the field's bytes do not decode to
    ///   exactly one `F`.
    pub fn get<'s, F: Shape + Decode>(
        &self,
        selector: impl Into<FieldSelector<'s>>,
    ) -> Result<F> {
        let selector = selector.into();
        let (field, span) = self.span(selector)?;

        let requested = Layout::of::<F>()?;
        if requested.descriptor().literal() != field.literal() {
            return Err(Error::FieldShapeMismatch { field: selector.to_string() });
        }

        let bytes =
            span.ok_or_else(|| Error::FieldAbsent { field: selector.to_string() })?;

        let mut decoder = SliceDecoder::new(bytes, &self.options);
        let value = F::decode(&mut decoder)?;

        if decoder.remaining() != 0 {
            return Err(Error::invalid_data(format!(
                "field {selector} left {} bytes undecoded",
                decoder.remaining()
            )));
        }

        Ok(value)
    }

    /// Borrows a text field from the input buffer without copying it.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), with [`Error::FieldShapeMismatch`] for
    /// any field that is not text.
    pub fn get_str<'s>(
        &self,
        selector: impl Into<FieldSelector<'s>>,
    ) -> Result<&'a str> {
        let selector = selector.into();
        let bytes = self.view(selector, &Descriptor::Text)?;

        std::str::from_utf8(bytes).map_err(|e| {
            Error::invalid_data(format!("invalid UTF-8 in field {selector}: {e}"))
        })
    }

    /// Borrows a byte sequence field, such as a `Vec<u8>`, from the input
    /// buffer without copying it.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), with [`Error::FieldShapeMismatch`] for
    /// any field that is not a sequence of `u8`.
    pub fn get_bytes<'s>(
        &self,
        selector: impl Into<FieldSelector<'s>>,
    ) -> Result<&'a [u8]> {
        let bytes = Descriptor::Sequence(Box::new(Descriptor::Scalar(Scalar::U8)));
        self.view(selector.into(), &bytes)
    }

    fn view(
        &self,
        selector: FieldSelector<'_>,
        expected: &Descriptor,
    ) -> Result<&'a [u8]> {
        let (field, span) = self.span(selector)?;

        if field.descriptor() != expected {
            return Err(Error::FieldShapeMismatch { field: selector.to_string() });
        }

        let bytes =
            span.ok_or_else(|| Error::FieldAbsent { field: selector.to_string() })?;

        let mut decoder = SliceDecoder::new(bytes, &self.options);
        let len = decoder.read_len()?;
        let contents = decoder.take(len)?;

        if decoder.remaining() != 0 {
            return Err(Error::invalid_data(format!(
                "field {selector} left {} bytes undecoded",
                decoder.remaining()
            )));
        }

        Ok(contents)
    }

    fn span(
        &self,
        selector: FieldSelector<'_>,
    ) -> Result<(&FieldLayout, Option<&'a [u8]>)> {
        let field = self
            .layout
            .field(selector)
            .ok_or_else(|| Error::UnknownField(selector.to_string()))?;

        self.spans
            .iter()
            .find(|(index, _)| *index == field.index())
            .map(|(_, span)| (field, *span))
            .ok_or_else(|| {
                Error::UnknownField(format!("{selector} (not selected)"))
            })
    }
}

#[tracing::instrument(
    name = "deserialize_partial",
    level = "trace",
    skip_all,
    fields(type_name = std::any::type_name::<T>(), selected = selectors.len())
)]
pub(crate) fn extract<'a, T: Shape + ?Sized>(
    bytes: &'a [u8],
    selectors: &[FieldSelector<'_>],
    options: &Options,
) -> Result<PartialRecord<'a>> {
    let layout = Layout::of::<T>()?;

    let mut wanted = vec![false; layout.fields().len()];
    for selector in selectors {
        let field = layout
            .field(*selector)
            .ok_or_else(|| Error::UnknownField(selector.to_string()))?;
        wanted[field.index()] = true;
    }

    let mut decoder = SliceDecoder::new(bytes, options);
    let compatible = read_header::<T, _>(&mut decoder)?;
    let body_start = decoder.position();

    let last_wanted_mandatory = layout
        .mandatory_fields()
        .filter(|field| wanted[field.index()])
        .map(FieldLayout::index)
        .last();
    let wants_compatible =
        layout.compatible_fields().any(|field| wanted[field.index()]);

    let mut spans = Vec::with_capacity(selectors.len());

    for field in layout.mandatory_fields() {
        let done = last_wanted_mandatory.is_none_or(|last| field.index() > last);
        if done && !wants_compatible {
            break;
        }

        let is_wanted = wanted[field.index()];

        if let Some(offset) = field.offset() {
            // located lazily; the next read seeks past it
            if !is_wanted && field.descriptor().fixed_width().is_some() {
                continue;
            }
            decoder.seek(body_start + offset)?;
        }

        let start = decoder.position();
        layout::skip(field.descriptor(), &mut decoder)?;

        if is_wanted {
            spans.push((field.index(), Some(&bytes[start..decoder.position()])));
        }
    }

    if wants_compatible {
        if let Some(last) = layout.mandatory_fields().last()
            && let (Some(offset), Some(width)) =
                (last.offset(), last.descriptor().fixed_width())
        {
            decoder.seek(body_start + offset + width)?;
        }

        let compatible_fields = layout.compatible_fields().collect::<Vec<_>>();
        let presence = *compatible.presence();

        for slot in 0..presence.len() {
            if !presence.is_present(slot) {
                continue;
            }

            let len = decoder.read_len()?;
            let start = decoder.position();
            decoder.take(len)?;

            if let Some(field) = compatible_fields.get(slot)
                && wanted[field.index()]
            {
                spans.push((field.index(), Some(&bytes[start..decoder.position()])));
            }
        }

        for field in compatible_fields {
            let recorded = spans.iter().any(|(index, _)| *index == field.index());
            if wanted[field.index()] && !recorded {
                spans.push((field.index(), None));
            }
        }
    }

    tracing::trace!(extracted = spans.len(), "located selected fields");

    Ok(PartialRecord { layout, spans, options: *options })
}
