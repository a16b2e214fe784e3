use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error};

/// Add the derives every entity needs: `Debug`, `Clone`, serde and `Entity`
pub fn model_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return Error::new(proc_macro2::Span::call_site(), "model takes no arguments")
            .to_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as DeriveInput);

    if !matches!(input.data, Data::Struct(_)) {
        return Error::new_spanned(&input.ident, "model can only be used on structs")
            .to_compile_error()
            .into();
    }

    let expanded = quote! {
        #[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize, ::entity_derive::Entity)]
        #input
    };

    TokenStream::from(expanded)
}
