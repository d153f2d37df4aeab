//! Registered instances are kept in two partitions: the *scene* partition, holding objects found
//! in or created for the currently loaded scenes, and the *persistent* partition, holding objects
//! which outlive scene transitions (typically resources). Clearing the container only drops the
//! scene partition.
//!
//! Each partition maps a target type to at most one instance. Besides instances, the registry
//! records prototypes - templates which get instantiated on the first `Global` request for one of
//! their target types.

use crate::component_registry::TargetDefinition;
use crate::error::RegistryError;
use crate::instance_provider::{CastFunction, InstanceAnyPtr};
use crate::policy::{DuplicatePolicy, LookupOrder};
use crate::scene::PrototypeId;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt::{Display, Formatter};
use tracing::{debug, warn};

/// Registry partition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Partition {
    Scene,
    Persistent,
}

impl Partition {
    #[inline]
    pub fn from_persistence(is_persistent: bool) -> Self {
        if is_persistent {
            Partition::Persistent
        } else {
            Partition::Scene
        }
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Scene => write!(f, "scene"),
            Partition::Persistent => write!(f, "persistent"),
        }
    }
}

/// An instance registered for a given target type, along with the function casting it to that
/// type.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct RegisteredInstance {
    #[derivative(Debug = "ignore")]
    pub instance: InstanceAnyPtr,
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

impl RegisteredInstance {
    /// Returns the instance cast to the registered target type, i.e. a boxed
    /// `InstancePtr<Target>`.
    #[inline]
    pub fn cast(&self) -> Result<Box<dyn Any>, InstanceAnyPtr> {
        (self.cast)(self.instance.clone())
    }
}

/// Single registry partition.
#[derive(Default, Debug)]
pub struct InstanceScope {
    instances: FxHashMap<TypeId, RegisteredInstance>,
}

impl InstanceScope {
    #[inline]
    pub fn instance(&self, type_id: TypeId) -> Option<&RegisteredInstance> {
        self.instances.get(&type_id)
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.instances.contains_key(&type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    fn store_instance(
        &mut self,
        target: &TargetDefinition,
        instance: InstanceAnyPtr,
        partition: Partition,
        duplicate_policy: DuplicatePolicy,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.instances.get(&target.type_id) {
            if InstanceAnyPtr::ptr_eq(&existing.instance, &instance) {
                return Ok(());
            }

            match duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicateRegistration {
                        type_name: target.type_name.to_string(),
                        partition,
                    })
                }
                DuplicatePolicy::Overwrite => warn!(
                    target_type = target.type_name,
                    %partition,
                    "Overwriting registered instance."
                ),
            }
        }

        self.instances.insert(
            target.type_id,
            RegisteredInstance {
                instance,
                cast: target.cast,
            },
        );

        Ok(())
    }
}

/// Two-partition instance registry with the prototype map.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    scene: InstanceScope,
    persistent: InstanceScope,
    prototypes: FxHashMap<TypeId, PrototypeId>,
    lookup_order: LookupOrder,
    duplicate_policy: DuplicatePolicy,
}

impl InstanceRegistry {
    pub fn new(lookup_order: LookupOrder, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            lookup_order,
            duplicate_policy,
            ..Default::default()
        }
    }

    /// Registers the instance under every target type in the given partition. Registering the
    /// same instance again is a no-op. Targets preceding a rejected duplicate stay registered.
    pub fn register(
        &mut self,
        instance: &InstanceAnyPtr,
        targets: &[TargetDefinition],
        partition: Partition,
    ) -> Result<(), RegistryError> {
        let duplicate_policy = self.duplicate_policy;
        let scope = self.scope_mut(partition);

        for target in targets {
            scope.store_instance(target, instance.clone(), partition, duplicate_policy)?;
            debug!(target_type = target.type_name, %partition, "Registered instance.");
        }

        Ok(())
    }

    /// Looks up an instance for the given target type, consulting partitions in the configured
    /// order.
    pub fn lookup(&self, type_id: TypeId) -> Option<&RegisteredInstance> {
        let (first, second) = match self.lookup_order {
            LookupOrder::SceneFirst => (&self.scene, &self.persistent),
            LookupOrder::PersistentFirst => (&self.persistent, &self.scene),
        };

        first
            .instance(type_id)
            .or_else(|| second.instance(type_id))
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.lookup(type_id).is_some()
    }

    pub fn register_prototype(
        &mut self,
        type_id: TypeId,
        type_name: &str,
        prototype: PrototypeId,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.prototypes.get(&type_id) {
            if *existing == prototype {
                return Ok(());
            }

            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicatePrototype(type_name.to_string()))
                }
                DuplicatePolicy::Overwrite => {
                    warn!(target_type = type_name, %prototype, "Overwriting registered prototype.")
                }
            }
        }

        self.prototypes.insert(type_id, prototype);
        Ok(())
    }

    #[inline]
    pub fn lookup_prototype(&self, type_id: TypeId) -> Option<PrototypeId> {
        self.prototypes.get(&type_id).copied()
    }

    /// Drops all scene-scoped instances. Persistent instances and prototypes are kept.
    pub fn clear_scene_partition(&mut self) {
        debug!(count = self.scene.len(), "Clearing scene partition.");
        self.scene.clear();
    }

    #[inline]
    pub fn partition(&self, partition: Partition) -> &InstanceScope {
        match partition {
            Partition::Scene => &self.scene,
            Partition::Persistent => &self.persistent,
        }
    }

    #[inline]
    pub fn lookup_order(&self) -> LookupOrder {
        self.lookup_order
    }

    #[inline]
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    fn scope_mut(&mut self, partition: Partition) -> &mut InstanceScope {
        match partition {
            Partition::Scene => &mut self.scene,
            Partition::Persistent => &mut self.persistent,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::component::{cast_self, Injectable};
    use crate::component_registry::TargetDefinition;
    use crate::error::RegistryError;
    use crate::instance_provider::{InstanceAnyPtr, InstancePtr};
    use crate::policy::{DuplicatePolicy, LookupOrder};
    use crate::scene::PrototypeId;
    use crate::scope::{InstanceRegistry, Partition};
    use std::any::{type_name, TypeId};

    struct TestInstance(i8);

    impl Injectable for TestInstance {}

    fn target() -> TargetDefinition {
        TargetDefinition {
            type_id: TypeId::of::<TestInstance>(),
            type_name: type_name::<TestInstance>(),
            cast: cast_self::<TestInstance>,
        }
    }

    fn instance(value: i8) -> InstanceAnyPtr {
        InstancePtr::new(TestInstance(value)) as InstanceAnyPtr
    }

    fn lookup_value(registry: &InstanceRegistry) -> Option<i8> {
        registry
            .lookup(TypeId::of::<TestInstance>())
            .and_then(|registered| registered.cast().ok())
            .and_then(|value| value.downcast::<InstancePtr<TestInstance>>().ok())
            .map(|value| value.0)
    }

    #[test]
    fn should_register_and_lookup_instance() {
        let mut registry = InstanceRegistry::default();
        registry
            .register(&instance(1), &[target()], Partition::Scene)
            .unwrap();

        assert_eq!(lookup_value(&registry), Some(1));
        assert_eq!(registry.partition(Partition::Scene).len(), 1);
        assert!(registry.partition(Partition::Persistent).is_empty());
    }

    #[test]
    fn should_reject_duplicate_registration() {
        let mut registry = InstanceRegistry::new(LookupOrder::SceneFirst, DuplicatePolicy::Reject);
        registry
            .register(&instance(1), &[target()], Partition::Scene)
            .unwrap();

        assert!(matches!(
            registry
                .register(&instance(2), &[target()], Partition::Scene)
                .unwrap_err(),
            RegistryError::DuplicateRegistration {
                partition: Partition::Scene,
                ..
            }
        ));
        assert_eq!(lookup_value(&registry), Some(1));
    }

    #[test]
    fn should_overwrite_duplicate_registration() {
        let mut registry =
            InstanceRegistry::new(LookupOrder::SceneFirst, DuplicatePolicy::Overwrite);
        registry
            .register(&instance(1), &[target()], Partition::Scene)
            .unwrap();
        registry
            .register(&instance(2), &[target()], Partition::Scene)
            .unwrap();

        assert_eq!(lookup_value(&registry), Some(2));
    }

    #[test]
    fn should_ignore_reregistering_same_instance() {
        let mut registry = InstanceRegistry::default();
        let instance = instance(1);
        registry
            .register(&instance, &[target()], Partition::Scene)
            .unwrap();
        registry
            .register(&instance, &[target()], Partition::Scene)
            .unwrap();
    }

    #[test]
    fn should_allow_same_type_in_both_partitions() {
        let mut registry = InstanceRegistry::default();
        registry
            .register(&instance(1), &[target()], Partition::Scene)
            .unwrap();
        registry
            .register(&instance(2), &[target()], Partition::Persistent)
            .unwrap();

        assert_eq!(lookup_value(&registry), Some(1));
    }

    #[test]
    fn should_respect_lookup_order() {
        let mut registry =
            InstanceRegistry::new(LookupOrder::PersistentFirst, DuplicatePolicy::Reject);
        registry
            .register(&instance(1), &[target()], Partition::Scene)
            .unwrap();
        registry
            .register(&instance(2), &[target()], Partition::Persistent)
            .unwrap();

        assert_eq!(lookup_value(&registry), Some(2));
    }

    #[test]
    fn should_keep_persistent_partition_on_clear() {
        let mut registry = InstanceRegistry::default();
        registry
            .register(&instance(2), &[target()], Partition::Persistent)
            .unwrap();
        registry.clear_scene_partition();

        assert_eq!(lookup_value(&registry), Some(2));
    }

    #[test]
    fn should_drop_scene_partition_on_clear() {
        let mut registry = InstanceRegistry::default();
        registry
            .register(&instance(1), &[target()], Partition::Scene)
            .unwrap();
        registry.clear_scene_partition();

        assert_eq!(lookup_value(&registry), None);
    }

    #[test]
    fn should_register_prototypes() {
        let mut registry = InstanceRegistry::default();
        let id = TypeId::of::<TestInstance>();
        registry
            .register_prototype(id, "TestInstance", PrototypeId(0))
            .unwrap();
        registry
            .register_prototype(id, "TestInstance", PrototypeId(0))
            .unwrap();

        assert_eq!(registry.lookup_prototype(id), Some(PrototypeId(0)));
        assert_eq!(
            registry
                .register_prototype(id, "TestInstance", PrototypeId(1))
                .unwrap_err(),
            RegistryError::DuplicatePrototype("TestInstance".to_string())
        );
    }
}
