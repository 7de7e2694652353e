use std::collections::HashSet;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for the `Document` trait.
///
/// Generates `Document::field_mut`, which maps each field name to the field's
/// `Field::slot`, and a `Field` impl so the struct can itself be nested inside
/// other documents.
///
/// # Example
///
/// ```ignore
/// use fieldcrypt::{Document, EncryptedValue};
///
/// #[derive(Document)]
/// struct Company {
///     name: String,
///     position: EncryptedValue<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[document(skip)]` - Hide this field from path resolution
/// - `#[document(rename = "name")]` - Resolve this field under a different name
///
/// Tuple struct fields are named by position: `"0"`, `"1"`, ...
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_document_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_document_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Every type parameter must itself be a field type
    let where_clause = build_where_clause(generics, where_clause);

    let data = match &input.data {
        syn::Data::Struct(data) => data,
        syn::Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Document can only be derived for structs",
            ))
        }
        syn::Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Document cannot be derived for unions",
            ))
        }
    };

    let arms = generate_field_arms(&data.fields)?;

    Ok(quote! {
        impl #impl_generics ::fieldcrypt::Document for #name #ty_generics #where_clause {
            fn field_mut(&mut self, name: &str) -> ::std::option::Option<::fieldcrypt::Slot<'_>> {
                match name {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl #impl_generics ::fieldcrypt::Field for #name #ty_generics #where_clause {
            fn slot(&mut self) -> ::fieldcrypt::Slot<'_> {
                ::fieldcrypt::Slot::Nested(self)
            }
        }
    })
}

fn build_where_clause(
    generics: &syn::Generics,
    existing: Option<&syn::WhereClause>,
) -> proc_macro2::TokenStream {
    let type_params: Vec<_> = generics.type_params().map(|p| &p.ident).collect();

    if type_params.is_empty() && existing.is_none() {
        return quote! {};
    }

    let field_bounds = type_params.iter().map(|p| {
        quote! { #p: ::fieldcrypt::Field }
    });

    let existing_predicates = existing
        .map(|w| {
            let predicates = &w.predicates;
            quote! { #predicates, }
        })
        .unwrap_or_default();

    quote! {
        where
            #existing_predicates
            #(#field_bounds),*
    }
}

fn generate_field_arms(fields: &syn::Fields) -> syn::Result<Vec<proc_macro2::TokenStream>> {
    let mut seen = HashSet::new();
    let mut arms = Vec::new();

    for (i, field) in fields.iter().enumerate() {
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let (access, default_name) = match &field.ident {
            Some(ident) => (quote! { #ident }, ident.to_string()),
            None => {
                let idx = syn::Index::from(i);
                (quote! { #idx }, i.to_string())
            }
        };
        let path_name = attrs.rename.unwrap_or(default_name);

        if path_name.is_empty() || path_name.contains('.') {
            return Err(syn::Error::new_spanned(
                field,
                format!("invalid document field name {path_name:?}"),
            ));
        }
        if !seen.insert(path_name.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate document field name {path_name:?}"),
            ));
        }

        arms.push(quote! {
            #path_name => ::std::option::Option::Some(::fieldcrypt::Field::slot(&mut self.#access)),
        });
    }

    Ok(arms)
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    rename: Option<String>,
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                result.skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `skip` or `rename = \"...\"`"))
            }
        })?;
    }

    Ok(result)
}
