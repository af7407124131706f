//! Derive macros for the `Shape`, `Encode` and `Decode` traits.
//!
//! This crate provides derive macros for the traits of the `wirepack` crate.
//! The three derives are meant to be used together: `Encode` and `Decode` lay
//! out fields exactly as `Shape` describes them.
//!
//! # Supported Types
//!
//! The derive macros support:
//! - Structs with named fields
//! - Tuple structs
//! - Unit structs
//! - Enums with any combination of unit, tuple, and struct variants
//!
//! Struct fields may be `Compatible<T, VERSION>`; they must follow every
//! mandatory field. Enum variants cannot hold compatible fields.
//!
//! # Examples
//!
//! ```ignore
//! use wirepack::{Compatible, Decode, Encode, Shape};
//!
//! #[derive(Shape, Encode, Decode)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: Compatible<String, 2>,
//! }
//!
//! #[derive(Shape, Encode, Decode)]
//! enum Message {
//!     Quit,
//!     Move { x: i32, y: i32 },
//!     Write(String),
//! }
//! ```
//!
//! # Field Attributes
//!
//! ## `#[wirepack(skip)]`
//!
//! Leave a field out of the shape and the encoding, and use
//! `Default::default()` when decoding.
//!
//! ```ignore
//! #[derive(Shape, Encode, Decode)]
//! struct Config {
//!     name: String,
//!     #[wirepack(skip)]
//!     cache: Vec<u8>, // Uses Default::default() when decoding
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Field, Fields, Generics, Ident,
    Index, Member, Type, WhereClause, ext::IdentExt, parse_macro_input,
    parse_quote,
};

/// Checks if a field has the `#[wirepack(skip)]` attribute.
fn should_skip(field: &Field) -> syn::Result<bool> {
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("wirepack") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown wirepack attribute"))
            }
        })?;
    }

    Ok(skip)
}

/// A field of a struct or variant, as seen by the generated code.
struct FieldInfo<'a> {
    member: Member,
    name: String,
    binding: Ident,
    ty: &'a Type,
    skip: bool,
}

fn field_infos(fields: &Fields) -> syn::Result<Vec<FieldInfo<'_>>> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let (member, name) = match &field.ident {
                Some(ident) => {
                    (Member::Named(ident.clone()), ident.unraw().to_string())
                }
                None => (Member::Unnamed(Index::from(i)), i.to_string()),
            };

            Ok(FieldInfo {
                member,
                name,
                binding: Ident::new(&format!("__field_{i}"), Span::call_site()),
                ty: &field.ty,
                skip: should_skip(field)?,
            })
        })
        .collect()
}

/// Builds a where clause requiring `bound` on every type parameter.
fn where_clause_with(generics: &Generics, bound: &syn::Path) -> WhereClause {
    let mut where_clause = generics
        .where_clause
        .clone()
        .unwrap_or_else(|| parse_quote!(where));

    for param in generics.type_params() {
        let ident = &param.ident;
        where_clause.predicates.push(parse_quote!(#ident: #bound));
    }

    where_clause
}

/// Builds the pattern that binds the non-skipped fields of a variant.
fn variant_pattern(
    variant: &Ident,
    fields: &Fields,
    infos: &[FieldInfo<'_>],
) -> proc_macro2::TokenStream {
    let bindings = infos.iter().map(|info| {
        let binding = &info.binding;
        match (&info.member, info.skip) {
            (Member::Named(name), true) => quote! { #name: _ },
            (Member::Named(name), false) => quote! { #name: #binding },
            (Member::Unnamed(_), true) => quote! { _ },
            (Member::Unnamed(_), false) => quote! { #binding },
        }
    });

    match fields {
        Fields::Named(_) => quote! { Self::#variant { #(#bindings),* } },
        Fields::Unnamed(_) => quote! { Self::#variant(#(#bindings),*) },
        Fields::Unit => quote! { Self::#variant },
    }
}

/// Builds a constructor whose fields are produced by `value`.
fn construct(
    path: &proc_macro2::TokenStream,
    fields: &Fields,
    infos: &[FieldInfo<'_>],
    value: impl Fn(&FieldInfo<'_>) -> proc_macro2::TokenStream,
) -> proc_macro2::TokenStream {
    let values = infos.iter().map(|info| {
        let ty = info.ty;
        let value = if info.skip {
            quote! { <#ty as ::std::default::Default>::default() }
        } else {
            value(info)
        };

        match &info.member {
            Member::Named(name) => quote! { #name: #value },
            Member::Unnamed(_) => value,
        }
    });

    match fields {
        Fields::Named(_) => quote! { #path { #(#values),* } },
        Fields::Unnamed(_) => quote! { #path(#(#values),*) },
        Fields::Unit => quote! { #path },
    }
}

/// Lists the non-skipped fields of a struct or variant on a
/// `FieldsBuilder` named `fields`.
fn describe_fields(infos: &[FieldInfo<'_>]) -> proc_macro2::TokenStream {
    let described = infos.iter().filter(|info| !info.skip).map(|info| {
        let ty = info.ty;
        let name = &info.name;
        quote! { fields.field::<#ty>(#name)?; }
    });

    quote! {
        let _ = &fields;
        #(#described)*
        ::std::result::Result::Ok(())
    }
}

fn into_token_stream(result: syn::Result<proc_macro2::TokenStream>) -> TokenStream {
    result.unwrap_or_else(syn::Error::into_compile_error).into()
}

// =============================================================================
// Shape
// =============================================================================

/// Derive macro for `Shape`.
///
/// Structs describe as aggregates whose fields are listed in declaration
/// order; enums describe as variants whose alternatives are listed in
/// declaration order. Skipped fields are left out.
#[proc_macro_derive(Shape, attributes(wirepack))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    into_token_stream(expand_shape(&input))
}

fn expand_shape(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause =
        where_clause_with(&input.generics, &parse_quote!(::wirepack::Shape));

    let describe = match &input.data {
        Data::Struct(data_struct) => shape_struct(data_struct)?,
        Data::Enum(data_enum) => shape_enum(data_enum)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Shape cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::wirepack::Shape for #name #ty_generics #where_clause {
            fn describe(
                builder: &mut ::wirepack::DescriptorBuilder,
            ) -> ::wirepack::Result<::wirepack::Descriptor> {
                #describe
            }
        }
    })
}

fn shape_struct(data_struct: &DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let fields = describe_fields(&field_infos(&data_struct.fields)?);

    Ok(quote! {
        builder.aggregate::<Self>(|fields| { #fields })
    })
}

fn shape_enum(data_enum: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let alternatives = data_enum
        .variants
        .iter()
        .map(|variant| {
            let name = variant.ident.unraw().to_string();
            let fields = describe_fields(&field_infos(&variant.fields)?);

            Ok(quote! {
                alternatives.alternative(#name, |fields| { #fields })?;
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        builder.variant::<Self>(|alternatives| {
            let _ = &alternatives;
            #(#alternatives)*
            ::std::result::Result::Ok(())
        })
    })
}

// =============================================================================
// Encode
// =============================================================================

/// Derive macro for `Encode`.
///
/// - For structs: the presence bitmap, then all non-skipped fields in
///   declaration order. As the outermost value of a record the bitmap is
///   written only if some field is compatible. Compatible payloads land after
///   the mandatory fields because compatible fields are declared last.
/// - For enums: the discriminant, then the active variant's fields.
#[proc_macro_derive(Encode, attributes(wirepack))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    into_token_stream(expand_encode(&input))
}

fn expand_encode(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause =
        where_clause_with(&input.generics, &parse_quote!(::wirepack::Encode));

    let encode_impl = match &input.data {
        Data::Struct(data_struct) => encode_struct(data_struct)?,
        Data::Enum(data_enum) => {
            let body = encode_enum(data_enum)?;
            quote! {
                fn encode<__E: ::wirepack::Encoder + ?Sized>(
                    &self,
                    encoder: &mut __E,
                ) -> ::wirepack::Result<()> {
                    #body
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Encode cannot be derived for unions due to memory safety \
                 concerns",
            ));
        }
    };

    Ok(quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::wirepack::Encode for #name #ty_generics #where_clause {
            #encode_impl
        }
    })
}

fn encode_struct(data_struct: &DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let infos = field_infos(&data_struct.fields)?;
    let members = infos
        .iter()
        .filter(|info| !info.skip)
        .map(|info| &info.member)
        .collect::<Vec<_>>();

    let fields = quote! {
        #(::wirepack::Encode::encode(&self.#members, encoder)?;)*
        ::std::result::Result::Ok(())
    };

    Ok(quote! {
        fn encode<__E: ::wirepack::Encoder + ?Sized>(
            &self,
            encoder: &mut __E,
        ) -> ::wirepack::Result<()> {
            #[allow(unused_mut)]
            let mut presence = ::wirepack::PresenceBitmap::new();
            #(::wirepack::Encode::mark_presence(&self.#members, &mut presence)?;)*
            presence.encode(encoder)?;

            #fields
        }

        fn encode_body<__E: ::wirepack::Encoder + ?Sized>(
            &self,
            encoder: &mut __E,
        ) -> ::wirepack::Result<()> {
            #[allow(unused_mut)]
            let mut presence = ::wirepack::PresenceBitmap::new();
            #(::wirepack::Encode::mark_presence(&self.#members, &mut presence)?;)*
            if !presence.is_empty() {
                presence.encode(encoder)?;
            }

            #fields
        }
    })
}

fn encode_enum(data_enum: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let count = data_enum.variants.len();
    if count == 0 {
        return Ok(quote! { match *self {} });
    }

    let arms = data_enum
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let infos = field_infos(&variant.fields)?;
            let pattern = variant_pattern(&variant.ident, &variant.fields, &infos);
            let bindings = infos
                .iter()
                .filter(|info| !info.skip)
                .map(|info| &info.binding);

            Ok(quote! {
                #pattern => {
                    encoder.emit_discriminant(#index, #count)?;
                    #(::wirepack::Encode::encode(#bindings, encoder)?;)*
                }
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        match self {
            #(#arms)*
        }
        ::std::result::Result::Ok(())
    })
}

// =============================================================================
// Decode
// =============================================================================

/// Derive macro for `Decode`.
///
/// - For structs: the presence bitmap, then the fields in declaration
///   order. Skipped fields use `Default::default()`.
///   In-place decoding overwrites mandatory fields and keeps compatible
///   fields the input does not carry.
/// - For enums: the discriminant, then the variant's fields. Out-of-range
///   discriminants are rejected.
#[proc_macro_derive(Decode, attributes(wirepack))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    into_token_stream(expand_decode(&input))
}

fn expand_decode(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause =
        where_clause_with(&input.generics, &parse_quote!(::wirepack::Decode));

    let decode_impl = match &input.data {
        Data::Struct(data_struct) => decode_struct(data_struct)?,
        Data::Enum(data_enum) => decode_enum(name, data_enum)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Decode cannot be derived for unions due to memory safety \
                 concerns",
            ));
        }
    };

    Ok(quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::wirepack::Decode for #name #ty_generics #where_clause {
            #decode_impl
        }
    })
}

fn decode_struct(data_struct: &DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let infos = field_infos(&data_struct.fields)?;

    let construct = construct(&quote!(Self), &data_struct.fields, &infos, |info| {
        let ty = info.ty;
        quote! {
            <#ty as ::wirepack::Decode>::decode_field(decoder, &mut compatible)?
        }
    });

    let members = infos
        .iter()
        .filter(|info| !info.skip)
        .map(|info| &info.member);

    Ok(quote! {
        fn decode<__D: ::wirepack::Decoder + ?Sized>(
            decoder: &mut __D,
        ) -> ::wirepack::Result<Self> {
            let compatible =
                ::wirepack::compatible::CompatibleFields::begin(decoder, true)?;
            <Self as ::wirepack::Decode>::decode_body(decoder, compatible)
        }

        fn decode_into<__D: ::wirepack::Decoder + ?Sized>(
            &mut self,
            decoder: &mut __D,
        ) -> ::wirepack::Result<()> {
            let compatible =
                ::wirepack::compatible::CompatibleFields::begin(decoder, true)?;
            <Self as ::wirepack::Decode>::decode_body_into(self, decoder, compatible)
        }

        fn decode_body<__D: ::wirepack::Decoder + ?Sized>(
            decoder: &mut __D,
            mut compatible: ::wirepack::compatible::CompatibleFields,
        ) -> ::wirepack::Result<Self> {
            let value = #construct;
            compatible.finish(decoder)?;
            ::std::result::Result::Ok(value)
        }

        fn decode_body_into<__D: ::wirepack::Decoder + ?Sized>(
            &mut self,
            decoder: &mut __D,
            mut compatible: ::wirepack::compatible::CompatibleFields,
        ) -> ::wirepack::Result<()> {
            #(
                ::wirepack::Decode::decode_field_into(
                    &mut self.#members,
                    decoder,
                    &mut compatible,
                )?;
            )*
            compatible.finish(decoder)
        }
    })
}

fn decode_enum(
    name: &Ident,
    data_enum: &DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let count = data_enum.variants.len();
    let arms = data_enum
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let infos = field_infos(&variant.fields)?;
            let ident = &variant.ident;
            let construct =
                construct(&quote!(Self::#ident), &variant.fields, &infos, |info| {
                    let ty = info.ty;
                    quote! { <#ty as ::wirepack::Decode>::decode(decoder)? }
                });

            Ok(quote! {
                #index => ::std::result::Result::Ok(#construct),
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let name_str = name.to_string();

    Ok(quote! {
        fn decode<__D: ::wirepack::Decoder + ?Sized>(
            decoder: &mut __D,
        ) -> ::wirepack::Result<Self> {
            let index = decoder.read_discriminant(#count)?;
            match index {
                #(#arms)*
                _ => ::std::result::Result::Err(
                    ::wirepack::Error::invalid_discriminant(index, #count, #name_str),
                ),
            }
        }
    })
}
