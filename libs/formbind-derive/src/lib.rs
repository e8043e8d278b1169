use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Visibility, parse_macro_input};

/// Derive macro for form-bindable records.
///
/// Generates `formbind::Record` (a static field descriptor table plus indexed
/// field access) and `formbind::Bind` for the annotated struct.
///
/// Only `pub` fields are bound. A field binds under its own name unless
/// renamed; `#[form(skip)]` keeps a `pub` field out of binding.
///
/// # Example
///
/// ```ignore
/// #[derive(Bind, Default)]
/// pub struct User {
///     #[form(rename = "Id")]
///     pub id: u32,
///
///     pub phones: Vec<Phone>,
///
///     #[form(skip)]
///     pub cached: String,
///
///     password_hash: String,
/// }
/// ```
///
/// Every bound field type must implement `formbind::Bind` and the struct
/// must implement `Default` when it sits behind a pointer or in a `Vec`.
#[proc_macro_derive(Bind, attributes(form))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Bind cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Bind only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Bind only supports structs",
            ))
        }
    };

    let mut descriptor_tokens = Vec::new();
    let mut accessor_tokens = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[form(...)] attribute.
        let mut rename: Option<String> = None;
        let mut skip = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("form") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else {
                    return Err(meta.error("unknown form attribute (expected `rename` or `skip`)"));
                }
                Ok(())
            })?;
        }

        let key = rename.unwrap_or_else(|| {
            let ident = field_name.to_string();
            ident.strip_prefix("r#").map(str::to_string).unwrap_or(ident)
        });
        let exported = !skip && !matches!(field.vis, Visibility::Inherited);

        if exported {
            descriptor_tokens.push(quote! {
                ::formbind::FieldDescriptor::exported(
                    #key,
                    <#field_ty as ::formbind::Bind>::shape,
                )
            });
            accessor_tokens.push(quote! {
                #index => ::core::option::Option::Some(&mut self.#field_name as &mut dyn ::formbind::Bind),
            });
        } else {
            descriptor_tokens.push(quote! {
                ::formbind::FieldDescriptor::unexported(#key)
            });
        }
    }

    let expanded = quote! {
        impl ::formbind::Record for #name {
            fn fields(&self) -> &'static [::formbind::FieldDescriptor] {
                const FIELDS: &[::formbind::FieldDescriptor] = &[
                    #(#descriptor_tokens),*
                ];
                FIELDS
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::formbind::Bind> {
                match index {
                    #(#accessor_tokens)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::formbind::Bind for #name {
            fn shape() -> ::formbind::Shape {
                ::formbind::Shape::Record
            }

            fn slot(&mut self) -> ::formbind::Slot<'_> {
                ::formbind::Slot::Record(self)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}
