use crate::component::{
    expand_injectable, expand_injectable_alias, expand_injectable_trait, no_arguments,
};
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error, Item};

mod attributes;
mod component;

/// Generates and registers a type descriptor. Configured with `#[scenewire(...)]` on the type and
/// `#[inject(...)]` on fields - see `scenewire_di::component` for details.
#[proc_macro_derive(Injectable, attributes(scenewire, inject))]
pub fn generate_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_injectable(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Makes `dyn Trait` injectable, so it can be used as a target type.
#[proc_macro_attribute]
pub fn injectable(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as Item);
    no_arguments(args.into(), "injectable")
        .and_then(|_| expand_injectable_trait(&item))
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Registers a trait implementation as an alias, allowing the implementing type to be viewed as
/// `dyn Trait` by hierarchy strategies and creation rules.
#[proc_macro_attribute]
pub fn injectable_alias(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as Item);
    no_arguments(args.into(), "injectable_alias")
        .and_then(|_| expand_injectable_alias(&item))
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
