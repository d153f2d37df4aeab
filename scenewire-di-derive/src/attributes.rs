use syn::punctuated::Punctuated;
use syn::{bracketed, Attribute, Error, ExprPath, LitStr, Meta, Token, Type};

pub const TYPE_ATTRIBUTE: &str = "scenewire";
pub const FIELD_ATTRIBUTE: &str = "inject";

pub enum ConstructorDefinition {
    Default,
    Expr(ExprPath),
}

pub enum GlobalDefinition {
    /// Only the type itself.
    SelfType,
    Types(Vec<Type>),
}

#[derive(Default)]
pub struct TypeAttributes {
    pub is_component: bool,
    pub is_receiver: bool,
    pub is_persistent: bool,
    pub constructor: Option<ConstructorDefinition>,
    pub global: Option<GlobalDefinition>,
}

impl TryFrom<&Attribute> for TypeAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut result = TypeAttributes::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("component") {
                result.is_component = true;
            } else if meta.path.is_ident("receiver") {
                result.is_receiver = true;
            } else if meta.path.is_ident("persistent") {
                result.is_persistent = true;
            } else if meta.path.is_ident("default") {
                result.constructor = Some(ConstructorDefinition::Default);
            } else if meta.path.is_ident("constructor") {
                let expr: LitStr = meta.value()?.parse()?;
                result.constructor = Some(ConstructorDefinition::Expr(expr.parse()?));
            } else if meta.path.is_ident("global") {
                if meta.input.peek(Token![=]) {
                    let value = meta.value()?;
                    let content;
                    bracketed!(content in value);

                    let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                    result.global = Some(GlobalDefinition::Types(types.into_iter().collect()));
                } else {
                    result.global = Some(GlobalDefinition::SelfType);
                }
            } else {
                return Err(meta.error("Unsupported injectable attribute!"));
            }

            Ok(())
        })?;

        if result.is_persistent && result.global.is_none() {
            return Err(Error::new_spanned(
                value,
                "Only globally injectable types can be persistent!",
            ));
        }

        Ok(result)
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum StrategyDefinition {
    Global,
    Unique,
    DownInHierarchy,
    UpInHierarchy,
}

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum FieldAttributes {
    Inject(StrategyDefinition),
    Base,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        if let Meta::Path(_) = value.meta {
            return Ok(Self::Inject(StrategyDefinition::Global));
        }

        let mut result = None;
        value.parse_nested_meta(|meta| {
            let parsed = if meta.path.is_ident("global") {
                Self::Inject(StrategyDefinition::Global)
            } else if meta.path.is_ident("unique") {
                Self::Inject(StrategyDefinition::Unique)
            } else if meta.path.is_ident("down_in_hierarchy") {
                Self::Inject(StrategyDefinition::DownInHierarchy)
            } else if meta.path.is_ident("up_in_hierarchy") {
                Self::Inject(StrategyDefinition::UpInHierarchy)
            } else if meta.path.is_ident("base") {
                Self::Base
            } else {
                return Err(meta.error("Unsupported injection strategy!"));
            };

            if result.replace(parsed).is_some() {
                return Err(meta.error("Only one injection strategy can be given!"));
            }

            Ok(())
        })?;

        Ok(result.unwrap_or(Self::Inject(StrategyDefinition::Global)))
    }
}
