use crate::attributes::{
    ConstructorDefinition, FieldAttributes, GlobalDefinition, StrategyDefinition, TypeAttributes,
    FIELD_ATTRIBUTE, TYPE_ATTRIBUTE,
};
use itertools::Itertools;
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use std::ops::Deref;
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DataStruct, DeriveInput, Error, Field, Fields, Index, Item, Member, Result,
    Type,
};

struct InjectedField<'a> {
    member: Member,
    name: String,
    ty: &'a Type,
    attributes: FieldAttributes,
}

fn extract_type_attributes(attributes: &[Attribute]) -> Result<TypeAttributes> {
    attributes
        .iter()
        .filter(|attribute| attribute.path().is_ident(TYPE_ATTRIBUTE))
        .map(TypeAttributes::try_from)
        .next()
        .transpose()
        .map(Option::unwrap_or_default)
}

fn extract_field_attributes(field: &Field) -> Result<Option<FieldAttributes>> {
    field
        .attrs
        .iter()
        .filter(|attribute| attribute.path().is_ident(FIELD_ATTRIBUTE))
        .map(FieldAttributes::try_from)
        .next()
        .transpose()
}

fn collect_injected_fields(fields: &Fields) -> Result<Vec<InjectedField>> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(index, field)| {
            extract_field_attributes(field)
                .map(|attributes| {
                    attributes.map(|attributes| {
                        let (member, name) = match &field.ident {
                            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                            None => (
                                Member::Unnamed(Index {
                                    index: index as u32,
                                    span: field.span(),
                                }),
                                index.to_string(),
                            ),
                        };

                        InjectedField {
                            member,
                            name,
                            ty: &field.ty,
                            attributes,
                        }
                    })
                })
                .transpose()
        })
        .try_collect()
}

fn generate_strategy(strategy: StrategyDefinition) -> TokenStream {
    match strategy {
        StrategyDefinition::Global => {
            quote!(::scenewire_di::component::InjectionStrategy::Global)
        }
        StrategyDefinition::Unique => {
            quote!(::scenewire_di::component::InjectionStrategy::Unique)
        }
        StrategyDefinition::DownInHierarchy => {
            quote!(::scenewire_di::component::InjectionStrategy::DownInHierarchy)
        }
        StrategyDefinition::UpInHierarchy => {
            quote!(::scenewire_di::component::InjectionStrategy::UpInHierarchy)
        }
    }
}

fn generate_constructor(
    ident: &Ident,
    constructor: &Option<ConstructorDefinition>,
) -> (TokenStream, TokenStream) {
    let instance = match constructor {
        Some(ConstructorDefinition::Default) => {
            quote!(<#ident as ::std::default::Default>::default())
        }
        Some(ConstructorDefinition::Expr(path)) => quote!(#path()),
        None => return (quote!(), quote!(None)),
    };

    (
        quote! {
            fn construct() -> ::scenewire_di::instance_provider::InstanceAnyPtr {
                ::scenewire_di::instance_provider::InstancePtr::new(#instance)
                    as ::scenewire_di::instance_provider::InstanceAnyPtr
            }
        },
        quote!(Some(construct)),
    )
}

fn generate_injectable(
    ident: &Ident,
    global: &Option<GlobalDefinition>,
    is_persistent: bool,
) -> (TokenStream, TokenStream) {
    let targets = match global {
        Some(GlobalDefinition::SelfType) => vec![quote!(#ident)],
        Some(GlobalDefinition::Types(types)) => types.iter().map(|ty| quote!(#ty)).collect(),
        None => return (quote!(), quote!(None)),
    };

    let casts = targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            let cast = format_ident!("cast_{}", index);
            quote! {
                fn #cast(
                    instance: ::scenewire_di::instance_provider::InstanceAnyPtr,
                ) -> ::std::result::Result<
                    ::std::boxed::Box<dyn ::std::any::Any>,
                    ::scenewire_di::instance_provider::InstanceAnyPtr,
                > {
                    instance.downcast::<#ident>().map(|p| {
                        ::std::boxed::Box::new(
                            p as ::scenewire_di::instance_provider::InstancePtr<#target>,
                        ) as ::std::boxed::Box<dyn ::std::any::Any>
                    })
                }
            }
        })
        .collect_vec();

    let definitions = targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            let cast = format_ident!("cast_{}", index);
            quote! {
                ::scenewire_di::component_registry::TargetDefinition {
                    type_id: ::std::any::TypeId::of::<#target>(),
                    type_name: ::std::any::type_name::<#target>(),
                    cast: #cast,
                }
            }
        })
        .collect_vec();

    (
        quote!(#(#casts)*),
        quote! {
            Some(::scenewire_di::component_registry::InjectableDescriptor {
                targets: ::std::vec![#(#definitions),*],
                is_persistent: #is_persistent,
            })
        },
    )
}

fn generate_receiver(
    ident: &Ident,
    is_receiver: bool,
    fields: &[InjectedField],
) -> Result<(TokenStream, TokenStream)> {
    if !is_receiver {
        return match fields.first() {
            Some(field) => Err(Error::new(
                field.ty.span(),
                "Injected fields require the type to be marked as a receiver!",
            )),
            None => Ok((quote!(), quote!(None))),
        };
    }

    let mut accessors = vec![];
    let mut descriptors = vec![];
    let mut base = None;

    for (index, field) in fields.iter().enumerate() {
        let accessor = format_ident!("field_{}", index);
        let member = &field.member;
        let name = &field.name;
        let ty = field.ty;

        match field.attributes {
            FieldAttributes::Inject(strategy) => {
                let strategy = generate_strategy(strategy);
                accessors.push(quote! {
                    fn #accessor(
                        receiver: &dyn ::std::any::Any,
                    ) -> ::std::option::Option<&dyn ::scenewire_di::component::InjectSlot> {
                        receiver
                            .downcast_ref::<#ident>()
                            .map(|receiver| &receiver.#member as &dyn ::scenewire_di::component::InjectSlot)
                    }
                });
                descriptors.push(quote! {
                    ::scenewire_di::component_registry::FieldDescriptor {
                        name: #name,
                        strategy: #strategy,
                        target_type: ::std::any::TypeId::of::<
                            <#ty as ::scenewire_di::component::InjectField>::Target,
                        >(),
                        target_name: ::std::any::type_name::<
                            <#ty as ::scenewire_di::component::InjectField>::Target,
                        >(),
                        accessor: #accessor,
                    }
                });
            }
            FieldAttributes::Base => {
                if base.is_some() {
                    return Err(Error::new(
                        ty.span(),
                        "Only one base can be embedded in a receiver!",
                    ));
                }

                accessors.push(quote! {
                    fn #accessor(
                        receiver: &dyn ::std::any::Any,
                    ) -> ::std::option::Option<&dyn ::std::any::Any> {
                        receiver
                            .downcast_ref::<#ident>()
                            .map(|receiver| &receiver.#member as &dyn ::std::any::Any)
                    }
                });
                base = Some(quote! {
                    ::scenewire_di::component_registry::BaseDescriptor {
                        type_id: ::std::any::TypeId::of::<#ty>(),
                        type_name: ::std::any::type_name::<#ty>(),
                        accessor: #accessor,
                    }
                });
            }
        }
    }

    let base = base
        .map(|base| quote!(Some(#base)))
        .unwrap_or_else(|| quote!(None));

    Ok((
        quote!(#(#accessors)*),
        quote! {
            Some(::scenewire_di::component_registry::ReceiverDescriptor {
                fields: ::std::vec![#(#descriptors),*],
                base: #base,
            })
        },
    ))
}

pub fn expand_injectable(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Can only derive Injectable on structs!",
        ));
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Injectable types cannot be generic!",
        ));
    }

    let ident = &input.ident;
    let attributes = extract_type_attributes(&input.attrs)?;
    let fields = collect_injected_fields(fields)?;

    let (constructor_fn, constructor) = generate_constructor(ident, &attributes.constructor);
    let (cast_fns, injectable) =
        generate_injectable(ident, &attributes.global, attributes.is_persistent);
    let (accessor_fns, receiver) = generate_receiver(ident, attributes.is_receiver, &fields)?;

    let kind = if attributes.is_component {
        quote!(::scenewire_di::component::ObjectKind::Component)
    } else {
        quote!(::scenewire_di::component::ObjectKind::Object)
    };

    Ok(quote! {
        #[automatically_derived]
        impl ::scenewire_di::component::Injectable for #ident {}

        const _: () = {
            #constructor_fn
            #cast_fns
            #accessor_fns

            fn register() -> ::scenewire_di::component_registry::TypeDescriptor {
                ::scenewire_di::component_registry::TypeDescriptor {
                    type_id: ::std::any::TypeId::of::<#ident>(),
                    type_name: ::std::any::type_name::<#ident>(),
                    kind: #kind,
                    constructor: #constructor,
                    cast: ::scenewire_di::component::cast_self::<#ident>,
                    injectable: #injectable,
                    receiver: #receiver,
                }
            }

            ::scenewire_di::component_registry::internal::submit! {
                ::scenewire_di::component_registry::internal::TypeRegisterer {
                    register
                }
            };
        };
    })
}

pub fn expand_injectable_trait(item: &Item) -> Result<TokenStream> {
    let Item::Trait(item_trait) = item else {
        return Err(Error::new(
            item.span(),
            "Only traits can be marked as injectable!",
        ));
    };

    if !item_trait.generics.params.is_empty() {
        return Err(Error::new(
            item_trait.generics.span(),
            "Injectable traits cannot be generic!",
        ));
    }

    let ident = &item_trait.ident;
    Ok(quote! {
        #item

        #[automatically_derived]
        impl ::scenewire_di::component::Injectable for dyn #ident {}
    })
}

pub fn expand_injectable_alias(item: &Item) -> Result<TokenStream> {
    let Item::Impl(item_impl) = item else {
        return Err(Error::new(
            item.span(),
            "Registering aliases is possible only on trait implementations!",
        ));
    };

    let trait_type = item_impl
        .trait_
        .as_ref()
        .map(|(_, path, ..)| path)
        .ok_or_else(|| Error::new(item.span(), "Missing trait identifier!"))?;

    let target_type = if let Type::Path(path) = item_impl.self_ty.deref() {
        &path.path
    } else {
        return Err(Error::new(
            item_impl.self_ty.span(),
            "Registering aliases is only available for named types!",
        ));
    };

    Ok(quote! {
        #item

        #[automatically_derived]
        impl ::scenewire_di::component::ComponentDowncast<#target_type> for dyn #trait_type {
            fn downcast(
                source: ::scenewire_di::instance_provider::InstanceAnyPtr,
            ) -> ::std::result::Result<
                ::scenewire_di::instance_provider::InstancePtr<Self>,
                ::scenewire_di::instance_provider::InstanceAnyPtr,
            > {
                source
                    .downcast::<#target_type>()
                    .map(|p| p as ::scenewire_di::instance_provider::InstancePtr<Self>)
            }
        }

        const _: () = {
            fn register() -> ::scenewire_di::component_registry::AliasDefinition {
                ::scenewire_di::component_registry::AliasDefinition::new::<dyn #trait_type, #target_type>()
            }

            ::scenewire_di::component_registry::internal::submit! {
                ::scenewire_di::component_registry::internal::AliasRegisterer {
                    register
                }
            };
        };
    })
}

pub fn no_arguments(args: TokenStream, name: &str) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(Error::new(
            Span::call_site(),
            format!("#[{name}] doesn't take any arguments!"),
        ))
    }
}
