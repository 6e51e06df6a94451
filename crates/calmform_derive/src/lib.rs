use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FromFormValues, attributes(form))]
pub fn derive_from_form_values(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FromFormValues derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FromFormValues derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FromFormValues derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut initializers = Vec::new();

    for field in named_fields {
        let key = match submitted_key(&field) {
            Ok(key) => key,
            Err(error) => return error.to_compile_error().into(),
        };
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;

        initializers.push(quote! {
            #field_ident: <#field_ty as #calmform::form::FromFieldValue>::from_field_value(
                &#calmform::form::FieldKey::from(#key),
                values.get(#key),
            )?
        });
    }

    quote! {
        impl #calmform::form::FromFormValues for #model_ident {
            fn from_form_values(
                values: &#calmform::form::FormValues,
            ) -> #calmform::form::FormResult<Self> {
                Ok(Self {
                    #(#initializers,)*
                })
            }
        }
    }
    .into()
}

/// Field name in the submitted values: `#[form(rename = "...")]` or the Rust identifier.
fn submitted_key(field: &Field) -> syn::Result<String> {
    let mut key = field.ident.as_ref().map(ToString::to_string);
    for attr in &field.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                key = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `rename`"))
            }
        })?;
    }
    key.ok_or_else(|| syn::Error::new_spanned(&field.ty, "field must be named"))
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::calmform),
    }
}
