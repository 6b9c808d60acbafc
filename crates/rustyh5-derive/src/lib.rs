//! Derive macros for rustyh5.
//!
//! - `#[derive(H5Group)]` stores a struct with named fields as a group
//!   tagged with a format string, one child per field.
//! - `#[derive(H5Variant)]` stores an enum whose variants each hold one
//!   leaf value (number, bool, string) as that value, and picks the variant
//!   from the stored datatype when reading.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derive `H5Write`, `H5Construct`, `H5Format` and `H5Element` for a struct
/// with named fields.
///
/// Container attribute:
/// - `#[h5(format = "Tag")]` sets the format tag (default: the struct name)
///
/// Field attributes:
/// - `#[h5(rename = "key")]` stores the field under another key
/// - `#[h5(default)]` reads a missing key as `Default::default()`
///
/// Reading checks the tag of the group, but accepts untagged groups.
#[proc_macro_derive(H5Group, attributes(h5))]
pub fn derive_h5_group(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match impl_h5_group(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derive `H5Write`, `H5Construct` and `H5Element` for an enum of
/// single-field tuple variants. Each field type must implement `H5Type`.
#[proc_macro_derive(H5Variant)]
pub fn derive_h5_variant(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match impl_h5_variant(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct FieldOpts {
    rename: Option<String>,
    default: bool,
}

fn container_format(input: &DeriveInput) -> syn::Result<String> {
    let mut format = input.ident.to_string();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("h5")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("format") {
                let s: LitStr = meta.value()?.parse()?;
                format = s.value();
                Ok(())
            } else {
                Err(meta.error("unsupported h5 attribute, expected `format`"))
            }
        })?;
    }
    Ok(format)
}

fn field_opts(field: &syn::Field) -> syn::Result<FieldOpts> {
    let mut opts = FieldOpts {
        rename: None,
        default: false,
    };
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("h5")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let s: LitStr = meta.value()?.parse()?;
                opts.rename = Some(s.value());
                Ok(())
            } else if meta.path.is_ident("default") {
                opts.default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported h5 attribute, expected `rename` or `default`"))
            }
        })?;
    }
    Ok(opts)
}

fn impl_h5_group(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "H5Group can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "H5Group can only be derived for structs",
            ));
        }
    };
    let format = container_format(input)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut write_stmts = Vec::new();
    let mut read_fields = Vec::new();
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let ty = &field.ty;
        let opts = field_opts(field)?;
        let key = opts.rename.unwrap_or_else(|| ident.to_string());

        write_stmts.push(quote! {
            ::rustyh5::H5Write::h5_write(&self.#ident, &gr, #key)?;
        });
        if opts.default {
            read_fields.push(quote! {
                #ident: {
                    let mut x = <#ty as ::core::default::Default>::default();
                    ::rustyh5::try_read(&gr, #key, &mut x)?;
                    x
                }
            });
        } else {
            read_fields.push(quote! {
                #ident: <#ty as ::rustyh5::H5Construct>::h5_construct(&gr, #key)?
            });
        }
    }

    Ok(quote! {
        impl #impl_generics ::rustyh5::H5Format for #name #ty_generics #where_clause {
            fn hdf5_format() -> ::std::string::String {
                #format.to_string()
            }
        }

        impl #impl_generics ::rustyh5::H5Write for #name #ty_generics #where_clause {
            fn h5_write(&self, g: &::rustyh5::Group, name: &str) -> ::rustyh5::Result<()> {
                let gr = g.create_group(name, true)?;
                ::rustyh5::write_hdf5_format_as_string(
                    &gr,
                    &<Self as ::rustyh5::H5Format>::hdf5_format(),
                )?;
                #(#write_stmts)*
                Ok(())
            }
        }

        impl #impl_generics ::rustyh5::H5Construct for #name #ty_generics #where_clause {
            fn h5_construct(g: &::rustyh5::Group, name: &str) -> ::rustyh5::Result<Self> {
                let gr = g.open_group(name)?;
                ::rustyh5::assert_hdf5_format_as_string(
                    &gr,
                    &<Self as ::rustyh5::H5Format>::hdf5_format(),
                    true,
                )?;
                Ok(Self {
                    #(#read_fields),*
                })
            }
        }

        impl #impl_generics ::rustyh5::H5Element for #name #ty_generics #where_clause {}
    })
}

fn impl_h5_variant(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let name_str = name.to_string();
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "H5Variant can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "H5Variant needs at least one variant",
        ));
    }

    let mut write_arms = Vec::new();
    let mut read_tries = Vec::new();
    for variant in &data.variants {
        let v = &variant.ident;
        let ty = match &variant.fields {
            Fields::Unnamed(f) if f.unnamed.len() == 1 => &f.unnamed[0].ty,
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "H5Variant variants must hold exactly one unnamed field",
                ));
            }
        };
        write_arms.push(quote! {
            Self::#v(x) => ::rustyh5::H5Write::h5_write(x, g, name),
        });
        read_tries.push(quote! {
            if ::rustyh5::variant::matches::<#ty>(&dt) {
                return Ok(Self::#v(<#ty as ::rustyh5::H5Construct>::h5_construct(g, name)?));
            }
        });
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::rustyh5::H5Write for #name #ty_generics #where_clause {
            fn h5_write(&self, g: &::rustyh5::Group, name: &str) -> ::rustyh5::Result<()> {
                match self {
                    #(#write_arms)*
                }
            }
        }

        impl #impl_generics ::rustyh5::H5Construct for #name #ty_generics #where_clause {
            fn h5_construct(g: &::rustyh5::Group, name: &str) -> ::rustyh5::Result<Self> {
                let dt = ::rustyh5::variant::stored_datatype(g, name)?;
                #(#read_tries)*
                Err(::rustyh5::variant::no_matching_alternative(g, name, &dt, #name_str))
            }
        }

        impl #impl_generics ::rustyh5::H5Element for #name #ty_generics #where_clause {}
    })
}
