use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream, Result};
use syn::{Expr, Ident, LitStr, Token};

struct TrArg {
    key: Ident,
    value: Expr,
}

impl Parse for TrArg {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let value: Expr = input.parse()?;
        Ok(TrArg { key, value })
    }
}

struct TrMacroInput {
    key: LitStr,
    args: Vec<TrArg>,
}

impl Parse for TrMacroInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: LitStr = input.parse()?;
        let mut args = Vec::new();

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            args.push(input.parse::<TrArg>()?);
        }

        Ok(TrMacroInput { key, args })
    }
}

pub fn tr_impl(input: TokenStream) -> TokenStream {
    let TrMacroInput { key, args } = match syn::parse(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error().into(),
    };

    let arg_tokens: Vec<_> = args
        .into_iter()
        .map(|TrArg { key, value }| {
            quote! { (stringify!(#key), ::std::string::ToString::to_string(&(#value))) }
        })
        .collect();

    let expansion = quote! {
        ::leptos::prelude::Signal::derive(move || {
            ::prefs_leptos::expect_prefs()
                .translator
                .translate_with(#key, &[ #( #arg_tokens ),* ])
        })
    };
    TokenStream::from(expansion)
}
