//! Creation rules map abstract types (usually `dyn Trait`) to concrete types, which get
//! default-constructed when nothing registered can provide the abstract one. Rules come from
//! [RuleProvider]s at container initialization, or are added at any time with
//! [Container::register_rule](crate::factory::Container::register_rule).

use crate::component::{cast_to, ComponentDowncast, Injectable};
use crate::error::RegistryError;
use crate::instance_provider::{CastFunction, ErrorPtr};
use crate::policy::DuplicatePolicy;
use derivative::Derivative;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;
use std::any::{type_name, TypeId};
use tracing::warn;

/// Maps an abstract type to the concrete type constructed in its place.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct CreationRule {
    pub abstract_type: TypeId,
    pub abstract_name: &'static str,
    pub concrete_type: TypeId,
    pub concrete_name: &'static str,
    /// Views the concrete instance as the abstract type.
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

impl CreationRule {
    /// Creates a rule constructing `C` whenever `A` is requested.
    pub fn new<A: ComponentDowncast<C> + ?Sized, C: Injectable>() -> Self {
        Self {
            abstract_type: TypeId::of::<A>(),
            abstract_name: type_name::<A>(),
            concrete_type: TypeId::of::<C>(),
            concrete_name: type_name::<C>(),
            cast: cast_to::<A, C>,
        }
    }
}

/// Source of creation rules, consulted once during container initialization.
#[cfg_attr(test, automock)]
pub trait RuleProvider {
    fn rules(&self) -> Result<Vec<CreationRule>, ErrorPtr>;
}

pub type RuleProviderPtr = Box<dyn RuleProvider>;

/// Provider without any rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRuleProvider;

impl RuleProvider for DefaultRuleProvider {
    fn rules(&self) -> Result<Vec<CreationRule>, ErrorPtr> {
        Ok(vec![])
    }
}

impl RuleProvider for Vec<CreationRule> {
    fn rules(&self) -> Result<Vec<CreationRule>, ErrorPtr> {
        Ok(self.clone())
    }
}

/// Abstract type to rule mapping.
#[derive(Debug, Default)]
pub struct CreationRuleMap {
    rules: FxHashMap<TypeId, CreationRule>,
    duplicate_policy: DuplicatePolicy,
}

impl CreationRuleMap {
    pub fn new(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            rules: Default::default(),
            duplicate_policy,
        }
    }

    /// Adds a new rule. Adding an identical rule again is a no-op; a different rule for the same
    /// abstract type is handled according to the duplicate policy.
    pub fn add_rule(&mut self, rule: CreationRule) -> Result<(), RegistryError> {
        if let Some(existing) = self.rules.get(&rule.abstract_type) {
            if existing.concrete_type == rule.concrete_type {
                return Ok(());
            }

            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicateRule(rule.abstract_name.to_string()))
                }
                DuplicatePolicy::Overwrite => warn!(
                    abstract_type = rule.abstract_name,
                    previous = existing.concrete_name,
                    concrete_type = rule.concrete_name,
                    "Overwriting creation rule."
                ),
            }
        }

        self.rules.insert(rule.abstract_type, rule);
        Ok(())
    }

    #[inline]
    pub fn resolve_rule(&self, abstract_type: TypeId) -> Option<&CreationRule> {
        self.rules.get(&abstract_type)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
