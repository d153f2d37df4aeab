//! Functionality related to registering type descriptors. The container has no runtime
//! reflection, so every type taking part in injection describes itself up front with a
//! [TypeDescriptor]: how to construct it, which target types it is injectable as, and which of its
//! fields should be injected. Descriptors are registered statically (usually by
//! `#[derive(Injectable)]`) and collected by [StaticDescriptorRegistry::new], or added manually.

use crate::component::{
    cast_to, ComponentDowncast, InjectSlot, InjectionStrategy, Injectable, ObjectKind,
};
use crate::error::RegistryError;
use crate::instance_provider::{CastFunction, Constructor, InstanceAnyPtr};
use derivative::Derivative;
use fxhash::FxHashMap;
use itertools::Itertools;
use std::any::{type_name, Any, TypeId};
use tracing::debug;

/// Returns a field of a receiver. The receiver is passed erased and the accessor returns `None` if
/// it's not of the expected type.
pub type FieldAccessor = fn(receiver: &dyn Any) -> Option<&dyn InjectSlot>;

/// Returns the embedded base of a receiver.
pub type BaseAccessor = fn(receiver: &dyn Any) -> Option<&dyn Any>;

/// Type under which an instance can be registered or viewed, along with the cast to it.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct TargetDefinition {
    pub type_id: TypeId,
    pub type_name: &'static str,
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

impl TargetDefinition {
    /// Creates a target for viewing `C` as `T`.
    pub fn new<T: ComponentDowncast<C> + ?Sized, C: Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            cast: cast_to::<T, C>,
        }
    }
}

/// Marks a type as globally injectable: its instances get registered under every target type.
#[derive(Clone, Debug, Default)]
pub struct InjectableDescriptor {
    pub targets: Vec<TargetDefinition>,
    /// Persistent instances survive clearing the scene partition.
    pub is_persistent: bool,
}

/// Field marked for injection.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub strategy: InjectionStrategy,
    pub target_type: TypeId,
    pub target_name: &'static str,
    #[derivative(Debug = "ignore")]
    pub accessor: FieldAccessor,
}

/// Embedded base receiver, which plays the role of a base class: its fields are injected after the
/// fields of the embedding type, as long as the base type itself is a registered receiver.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct BaseDescriptor {
    pub type_id: TypeId,
    pub type_name: &'static str,
    #[derivative(Debug = "ignore")]
    pub accessor: BaseAccessor,
}

/// Marks a type as a receiver of injection.
#[derive(Clone, Debug, Default)]
pub struct ReceiverDescriptor {
    /// Fields declared directly on this type.
    pub fields: Vec<FieldDescriptor>,
    pub base: Option<BaseDescriptor>,
}

/// Everything the container knows about a concrete type.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct TypeDescriptor {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub kind: ObjectKind,
    /// Default constructor; types without one can't be created by the container.
    #[derivative(Debug = "ignore")]
    pub constructor: Option<Constructor>,
    /// Identity cast.
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
    pub injectable: Option<InjectableDescriptor>,
    pub receiver: Option<ReceiverDescriptor>,
}

impl TypeDescriptor {
    #[inline]
    pub fn is_component(&self) -> bool {
        self.kind == ObjectKind::Component
    }

    /// Returns the cast viewing this type as the target, if possible.
    pub fn cast_to(&self, target: TypeId) -> Option<CastFunction> {
        if target == self.type_id {
            return Some(self.cast);
        }

        self.injectable.as_ref().and_then(|injectable| {
            injectable
                .targets
                .iter()
                .find(|definition| definition.type_id == target)
                .map(|definition| definition.cast)
        })
    }
}

/// Additional way to view a concrete type, e.g. as a `dyn Trait` it implements.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct AliasDefinition {
    pub alias_type: TypeId,
    pub alias_name: &'static str,
    pub target_type: TypeId,
    pub target_name: &'static str,
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

impl AliasDefinition {
    /// Creates an alias viewing `C` as `A`.
    pub fn new<A: ComponentDowncast<C> + ?Sized, C: Injectable>() -> Self {
        Self {
            alias_type: TypeId::of::<A>(),
            alias_name: type_name::<A>(),
            target_type: TypeId::of::<C>(),
            target_name: type_name::<C>(),
            cast: cast_to::<A, C>,
        }
    }
}

/// A registry of type descriptors, consulted by the container whenever it needs to know something
/// about a type.
pub trait DescriptorRegistry {
    /// Adds a new type descriptor. Re-registering a type is an error.
    fn register_type(&mut self, descriptor: TypeDescriptor) -> Result<(), RegistryError>;

    /// Adds an alias for a concrete type. Duplicate aliases are ignored.
    fn register_alias(&mut self, alias: AliasDefinition);

    fn descriptor(&self, type_id: TypeId) -> Option<&TypeDescriptor>;

    /// Returns the cast viewing the concrete type as the target type, if any.
    fn find_cast(&self, concrete_type: TypeId, target_type: TypeId) -> Option<CastFunction>;

    /// Returns the number of registered types.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the receiver descriptor of the given type, if it is a receiver.
    fn receiver(&self, type_id: TypeId) -> Option<&ReceiverDescriptor> {
        self.descriptor(type_id)
            .and_then(|descriptor| descriptor.receiver.as_ref())
    }

    /// Returns the injectable descriptor of the given type, if it is globally injectable.
    fn injectable(&self, type_id: TypeId) -> Option<&InjectableDescriptor> {
        self.descriptor(type_id)
            .and_then(|descriptor| descriptor.injectable.as_ref())
    }

    /// Casts the instance to the target type. The result contains an `InstancePtr<Target>`.
    fn cast(&self, instance: &InstanceAnyPtr, target_type: TypeId) -> Option<Box<dyn Any>> {
        self.find_cast(concrete_type_id(instance), target_type)
            .and_then(|cast| cast(instance.clone()).ok())
    }

    /// Checks if the instance can be viewed as the target type.
    fn can_cast(&self, instance: &InstanceAnyPtr, target_type: TypeId) -> bool {
        self.find_cast(concrete_type_id(instance), target_type)
            .is_some()
    }
}

/// Returns the type id of the concrete type behind the pointer.
#[inline]
pub fn concrete_type_id(instance: &InstanceAnyPtr) -> TypeId {
    (**instance).type_id()
}

/// Registry of type descriptors initialized from statically registered descriptors.
#[derive(Clone, Debug, Default)]
pub struct StaticDescriptorRegistry {
    types: FxHashMap<TypeId, TypeDescriptor>,
    aliases: FxHashMap<TypeId, Vec<AliasDefinition>>,
}

impl StaticDescriptorRegistry {
    /// Collects all statically registered descriptors and aliases.
    pub fn new() -> Result<Self, RegistryError> {
        let type_descriptors = inventory::iter::<internal::TypeRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
            .collect_vec();

        let mut registry = Self::empty();
        for descriptor in type_descriptors {
            registry.register_type(descriptor)?;
        }

        for registerer in inventory::iter::<internal::AliasRegisterer> {
            registry.register_alias((registerer.register)());
        }

        debug!(
            types = registry.types.len(),
            aliases = registry.aliases.values().map(Vec::len).sum::<usize>(),
            "Collected type descriptors."
        );

        Ok(registry)
    }

    /// Creates a registry without any descriptors.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl DescriptorRegistry for StaticDescriptorRegistry {
    fn register_type(&mut self, descriptor: TypeDescriptor) -> Result<(), RegistryError> {
        if self.types.contains_key(&descriptor.type_id) {
            return Err(RegistryError::DuplicateDescriptor(
                descriptor.type_name.to_string(),
            ));
        }

        self.types.insert(descriptor.type_id, descriptor);
        Ok(())
    }

    fn register_alias(&mut self, alias: AliasDefinition) {
        let aliases = self.aliases.entry(alias.target_type).or_default();
        if aliases
            .iter()
            .all(|existing| existing.alias_type != alias.alias_type)
        {
            aliases.push(alias);
        }
    }

    #[inline]
    fn descriptor(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(&type_id)
    }

    fn find_cast(&self, concrete_type: TypeId, target_type: TypeId) -> Option<CastFunction> {
        self.types
            .get(&concrete_type)
            .and_then(|descriptor| descriptor.cast_to(target_type))
            .or_else(|| {
                self.aliases.get(&concrete_type).and_then(|aliases| {
                    aliases
                        .iter()
                        .find(|alias| alias.alias_type == target_type)
                        .map(|alias| alias.cast)
                })
            })
    }

    #[inline]
    fn len(&self) -> usize {
        self.types.len()
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::component_registry::{AliasDefinition, TypeDescriptor};
    use inventory::collect;
    pub use inventory::submit;

    pub struct TypeRegisterer {
        pub register: fn() -> TypeDescriptor,
    }

    pub struct AliasRegisterer {
        pub register: fn() -> AliasDefinition,
    }

    collect!(TypeRegisterer);
    collect!(AliasRegisterer);
}
