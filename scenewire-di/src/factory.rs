//! Core functionality for wiring instances together: the [Container] with its lifecycle and the
//! public resolution surface, and the [ContainerBuilder] used to set it up.
//!
//! A container goes through [ContainerState::Uninitialized], [ContainerState::Initializing] and
//! [ContainerState::Ready]. Initialization loads persistent resources, records prototypes and
//! collects creation rules; afterwards the container sweeps all loaded scenes, registering
//! globally injectable objects and injecting every receiver found.

use crate::component::{ComponentDowncast, Injectable};
use crate::component_registry::{concrete_type_id, DescriptorRegistry, StaticDescriptorRegistry};
use crate::error::{ContainerError, RegistryError, ResolutionError};
use crate::instance_provider::{
    InstanceAnyPtr, InstanceProvider, InstancePtr, TypedInstanceProvider,
};
use crate::policy::ResolutionPolicy;
use crate::rules::{CreationRule, CreationRuleMap, DefaultRuleProvider, RuleProviderPtr};
use crate::scene::memory::MemorySceneGraph;
use crate::scene::traversal::{component_in_children, components_in_subtree};
use crate::scene::{NodeId, PrototypeId, SceneHost, SceneHostPtr};
use crate::scope::{InstanceRegistry, Partition};
use fxhash::FxHashSet;
use std::any::{type_name, Any, TypeId};
use tracing::{debug, info, warn};

pub type DescriptorRegistryPtr = Box<dyn DescriptorRegistry>;

/// Lifecycle state of a [Container].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ContainerState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Field which couldn't be injected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InjectionFailure {
    pub receiver: &'static str,
    pub field: &'static str,
    pub error: ResolutionError,
}

/// Outcome of injecting one or more receivers. Failures never stop injection of other fields or
/// receivers, so the report is the place to look for what went wrong.
#[derive(Clone, Debug, Default)]
pub struct InjectionReport {
    pub receivers: usize,
    pub bound_fields: usize,
    pub failures: Vec<InjectionFailure>,
    /// Globally injectable objects found in scenes, which couldn't be registered.
    pub rejected_registrations: Vec<RegistryError>,
}

impl InjectionReport {
    /// Checks if every field got bound and every found object got registered.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.rejected_registrations.is_empty()
    }

    pub fn merge(&mut self, other: InjectionReport) {
        self.receivers += other.receivers;
        self.bound_fields += other.bound_fields;
        self.failures.extend(other.failures);
        self.rejected_registrations
            .extend(other.rejected_registrations);
    }
}

/// Builder for [Container] with sensible defaults, for easy construction.
pub struct ContainerBuilder {
    host: SceneHostPtr,
    descriptor_registry: DescriptorRegistryPtr,
    policy: ResolutionPolicy,
    prototypes: Vec<PrototypeId>,
    resources: Vec<InstanceAnyPtr>,
    rule_providers: Vec<RuleProviderPtr>,
}

impl ContainerBuilder {
    /// Creates a new builder with a default configuration: an empty [MemorySceneGraph], all
    /// statically registered descriptors and the [DefaultRuleProvider].
    pub fn new() -> Result<Self, RegistryError> {
        Ok(Self {
            host: Box::<MemorySceneGraph>::default(),
            descriptor_registry: Box::new(StaticDescriptorRegistry::new()?),
            policy: Default::default(),
            prototypes: vec![],
            resources: vec![],
            rule_providers: vec![Box::new(DefaultRuleProvider)],
        })
    }

    /// Sets the live scene graph.
    pub fn with_host(mut self, host: SceneHostPtr) -> Self {
        self.host = host;
        self
    }

    /// Sets new [DescriptorRegistry].
    pub fn with_descriptor_registry(mut self, descriptor_registry: DescriptorRegistryPtr) -> Self {
        self.descriptor_registry = descriptor_registry;
        self
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Adds a prototype, which will be realized on the first `Global` request for any target type
    /// of its injectable components.
    pub fn with_prototype(mut self, prototype: PrototypeId) -> Self {
        self.prototypes.push(prototype);
        self
    }

    pub fn with_prototypes<I: IntoIterator<Item = PrototypeId>>(mut self, prototypes: I) -> Self {
        self.prototypes.extend(prototypes);
        self
    }

    /// Adds a resource - a globally injectable object registered in the persistent partition.
    pub fn with_resource(mut self, resource: InstanceAnyPtr) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_resources<I: IntoIterator<Item = InstanceAnyPtr>>(mut self, resources: I) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Adds a creation rule provider.
    pub fn with_rule_provider(mut self, provider: RuleProviderPtr) -> Self {
        self.rule_providers.push(provider);
        self
    }

    /// Replaces all creation rule providers.
    pub fn with_rule_providers(mut self, providers: Vec<RuleProviderPtr>) -> Self {
        self.rule_providers = providers;
        self
    }

    /// Builds resulting [Container].
    pub fn build(self) -> Container {
        Container {
            registry: InstanceRegistry::new(
                self.policy.lookup_order,
                self.policy.duplicate_policy,
            ),
            rules: CreationRuleMap::new(self.policy.duplicate_policy),
            host: self.host,
            descriptors: self.descriptor_registry,
            policy: self.policy,
            prototypes: self.prototypes,
            resources: self.resources,
            rule_providers: self.rule_providers,
            state: ContainerState::Uninitialized,
            types_under_construction: Default::default(),
        }
    }
}

/// Dependency injection container over a live scene graph. Holds the instance registry and the
/// creation rules, and resolves [Inject](crate::component::Inject) fields of receivers.
pub struct Container {
    pub(crate) host: SceneHostPtr,
    pub(crate) descriptors: DescriptorRegistryPtr,
    pub(crate) policy: ResolutionPolicy,
    pub(crate) registry: InstanceRegistry,
    pub(crate) rules: CreationRuleMap,
    prototypes: Vec<PrototypeId>,
    resources: Vec<InstanceAnyPtr>,
    rule_providers: Vec<RuleProviderPtr>,
    state: ContainerState,
    pub(crate) types_under_construction: FxHashSet<TypeId>,
}

impl Container {
    /// Loads resources, prototypes and creation rules. Configuration errors are propagated and
    /// leave the container uninitialized.
    pub fn initialize(&mut self) -> Result<(), ContainerError> {
        self.expect_state(ContainerState::Uninitialized)?;
        self.state = ContainerState::Initializing;
        debug!("Initializing container.");

        if let Err(error) = self.load_configuration() {
            self.state = ContainerState::Uninitialized;
            return Err(error);
        }

        self.state = ContainerState::Ready;
        info!(
            resources = self.resources.len(),
            prototypes = self.prototypes.len(),
            rules = self.rules.len(),
            "Container initialized."
        );

        Ok(())
    }

    /// Sweeps all loaded scenes: registers every globally injectable object found and injects
    /// every receiver. Receivers are collected before injecting, so objects created during
    /// injection don't get injected twice.
    pub fn inject_dependencies_at_scenes(&mut self) -> Result<InjectionReport, ContainerError> {
        self.expect_state(ContainerState::Ready)?;

        let mut report = InjectionReport::default();
        let mut receivers = vec![];

        for scene in self.host.scenes() {
            let roots = self.host.root_nodes(scene);
            if roots.is_empty() {
                warn!(%scene, "Passed an empty scene to dependency injection.");
            }

            for root in roots {
                for (_, component) in components_in_subtree(self.host.as_ref(), root) {
                    if self
                        .descriptors
                        .receiver(concrete_type_id(&component))
                        .is_some()
                    {
                        receivers.push(component.clone());
                    }

                    if let Err(error) = self.register_injectable_instance(&component) {
                        warn!(%error, "Cannot register injectable found in scene.");
                        report.rejected_registrations.push(error);
                    }
                }
            }
        }

        debug!(receivers = receivers.len(), "Injecting scene receivers.");

        for receiver in &receivers {
            self.inject_receiver(receiver, &mut report);
        }

        info!(
            receivers = report.receivers,
            bound_fields = report.bound_fields,
            failures = report.failures.len(),
            "Injected dependencies at scenes."
        );

        Ok(report)
    }

    /// Initializes the container and runs the first scene sweep.
    pub fn start(&mut self) -> Result<InjectionReport, ContainerError> {
        self.initialize()?;
        self.inject_dependencies_at_scenes()
    }

    /// Returns a shared instance of `T`, resolved like a `Global` field: from the registry, a
    /// prototype, a creation rule, or by default construction.
    pub fn get_or_create_instance<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<InstancePtr<T>, ContainerError> {
        self.expect_state(ContainerState::Ready)?;
        self.global_instance_typed::<T>()
            .map_err(ContainerError::from)
    }

    /// Creates a new, injected instance of `T`, resolved like a `Unique` field. The instance is not
    /// registered.
    pub fn create_instance<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<InstancePtr<T>, ContainerError> {
        self.expect_state(ContainerState::Ready)?;

        let mut report = InjectionReport::default();
        let instance =
            self.resolve_unique(TypeId::of::<T>(), type_name::<T>(), &mut report)?;

        downcast_instance::<T>(instance).map_err(ContainerError::from)
    }

    /// Returns the registered instance of `T`, without creating anything.
    pub fn resolve<T: Injectable + ?Sized>(&self) -> Option<InstancePtr<T>> {
        self.registry
            .lookup(TypeId::of::<T>())
            .and_then(|registered| registered.cast().ok())
            .and_then(|instance| downcast_instance::<T>(instance).ok())
    }

    /// Realizes the prototype in the scene graph and injects all receivers in the new subtree.
    pub fn instantiate(&mut self, prototype: PrototypeId) -> Result<NodeId, ContainerError> {
        self.expect_state(ContainerState::Ready)?;

        let root = self.host.instantiate(prototype)?;
        let report = self.inject_subtree(root);

        debug!(
            %prototype,
            %root,
            bound_fields = report.bound_fields,
            failures = report.failures.len(),
            "Instantiated prototype."
        );

        Ok(root)
    }

    /// Same as [Container::instantiate], but returns the first component in the new subtree
    /// which can be viewed as `T`.
    pub fn instantiate_typed<T: Injectable + ?Sized>(
        &mut self,
        prototype: PrototypeId,
    ) -> Result<InstancePtr<T>, ContainerError> {
        let root = self.instantiate(prototype)?;

        let component = component_in_children(
            self.host.as_ref(),
            self.descriptors.as_ref(),
            root,
            TypeId::of::<T>(),
        )
        .ok_or_else(|| ResolutionError::ComponentNotFound {
            type_name: type_name::<T>().to_string(),
            node: root,
        })?;

        downcast_instance::<T>(component).map_err(ContainerError::from)
    }

    /// Injects fields of an existing receiver.
    pub fn inject_dependencies(
        &mut self,
        instance: &InstanceAnyPtr,
    ) -> Result<InjectionReport, ContainerError> {
        self.expect_state(ContainerState::Ready)?;

        let mut report = InjectionReport::default();
        self.inject_receiver(instance, &mut report);
        Ok(report)
    }

    /// Injects all receivers attached to the node or its descendants.
    pub fn inject_dependencies_at_node(
        &mut self,
        node: NodeId,
    ) -> Result<InjectionReport, ContainerError> {
        self.expect_state(ContainerState::Ready)?;
        Ok(self.inject_subtree(node))
    }

    /// Adds a creation rule constructing `C` whenever `A` can't be found.
    pub fn register_rule<A: ComponentDowncast<C> + ?Sized, C: Injectable>(
        &mut self,
    ) -> Result<(), RegistryError> {
        self.rules.add_rule(CreationRule::new::<A, C>())
    }

    /// Registers a globally injectable instance under all its target types, in the partition
    /// declared by its descriptor. Returns `false` if the instance is not globally injectable.
    pub fn register_injectable(&mut self, instance: &InstanceAnyPtr) -> Result<bool, RegistryError> {
        self.register_injectable_instance(instance)
    }

    /// Drops all scene-scoped instances, e.g. before loading new scenes.
    pub fn clear(&mut self) {
        self.registry.clear_scene_partition();
    }

    #[inline]
    pub fn state(&self) -> ContainerState {
        self.state
    }

    #[inline]
    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    #[inline]
    pub fn host(&self) -> &dyn SceneHost {
        self.host.as_ref()
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut dyn SceneHost {
        self.host.as_mut()
    }

    #[inline]
    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    #[inline]
    pub fn descriptors(&self) -> &dyn DescriptorRegistry {
        self.descriptors.as_ref()
    }

    #[inline]
    pub fn rules(&self) -> &CreationRuleMap {
        &self.rules
    }

    pub(crate) fn register_injectable_instance(
        &mut self,
        instance: &InstanceAnyPtr,
    ) -> Result<bool, RegistryError> {
        let Some(injectable) = self.descriptors.injectable(concrete_type_id(instance)) else {
            return Ok(false);
        };

        self.registry.register(
            instance,
            &injectable.targets,
            Partition::from_persistence(injectable.is_persistent),
        )?;

        Ok(true)
    }

    pub(crate) fn inject_subtree(&mut self, node: NodeId) -> InjectionReport {
        let mut report = InjectionReport::default();
        let receivers = components_in_subtree(self.host.as_ref(), node)
            .into_iter()
            .map(|(_, component)| component)
            .filter(|component| {
                self.descriptors
                    .receiver(concrete_type_id(component))
                    .is_some()
            })
            .collect::<Vec<_>>();

        for receiver in &receivers {
            self.inject_receiver(receiver, &mut report);
        }

        report
    }

    fn load_configuration(&mut self) -> Result<(), ContainerError> {
        for resource in &self.resources {
            match self.descriptors.injectable(concrete_type_id(resource)) {
                Some(injectable) => {
                    self.registry
                        .register(resource, &injectable.targets, Partition::Persistent)?
                }
                None => warn!("Skipping resource which is not globally injectable."),
            }
        }

        for prototype in &self.prototypes {
            for type_id in self.host.prototype_component_types(*prototype)? {
                if let Some(injectable) = self.descriptors.injectable(type_id) {
                    for target in &injectable.targets {
                        self.registry
                            .register_prototype(target.type_id, target.type_name, *prototype)?;
                    }
                }
            }
        }

        for provider in &self.rule_providers {
            for rule in provider.rules().map_err(ContainerError::RuleProvider)? {
                self.rules.add_rule(rule)?;
            }
        }

        Ok(())
    }

    fn expect_state(&self, expected: ContainerState) -> Result<(), ContainerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ContainerError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}

impl InstanceProvider for Container {
    /// Resolves like a `Global` field. Unlike [Container::get_or_create_instance], doesn't check
    /// the lifecycle state.
    fn global_instance(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Box<dyn Any>, ResolutionError> {
        let mut report = InjectionReport::default();
        self.resolve_global(type_id, type_name, &mut report)
    }
}

/// Unboxes a cast instance into a typed pointer.
pub(crate) fn downcast_instance<T: Injectable + ?Sized>(
    instance: Box<dyn Any>,
) -> Result<InstancePtr<T>, ResolutionError> {
    instance
        .downcast::<InstancePtr<T>>()
        .map(|instance| *instance)
        .map_err(|_| ResolutionError::IncompatibleInstance {
            type_name: type_name::<T>().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::component::{
        cast_self, construct_default, ComponentDowncast, Inject, InjectSlot, Injectable,
        InjectionStrategy, ObjectKind,
    };
    use crate::component_registry::{
        DescriptorRegistry, FieldDescriptor, InjectableDescriptor, ReceiverDescriptor,
        StaticDescriptorRegistry, TargetDefinition, TypeDescriptor,
    };
    use crate::error::{ContainerError, HostError, RegistryError, ResolutionError};
    use crate::factory::{Container, ContainerBuilder, ContainerState, DescriptorRegistryPtr};
    use crate::instance_provider::{ErrorPtr, InstanceAnyPtr, InstancePtr, TypedInstanceProvider};
    use crate::rules::{CreationRule, MockRuleProvider, RuleProviderPtr};
    use crate::scene::memory::{MemorySceneGraph, PrototypeTemplate};
    use crate::scene::{MockSceneHost, PrototypeId, SceneHost, SceneId};
    use mockall::predicate::*;
    use std::any::{type_name, Any, TypeId};
    use std::io::{Error as IoError, ErrorKind};

    #[derive(Default, Debug)]
    struct Settings;

    impl Injectable for Settings {}

    trait Source {}

    impl Injectable for dyn Source {}

    impl Source for Settings {}

    impl ComponentDowncast<Settings> for dyn Source {
        fn downcast(source: InstanceAnyPtr) -> Result<InstancePtr<Self>, InstanceAnyPtr> {
            source
                .downcast::<Settings>()
                .map(|p| p as InstancePtr<Self>)
        }
    }

    #[derive(Default)]
    struct Consumer {
        settings: Inject<Settings>,
    }

    impl Injectable for Consumer {}

    fn consumer_settings(receiver: &dyn Any) -> Option<&dyn InjectSlot> {
        receiver
            .downcast_ref::<Consumer>()
            .map(|consumer| &consumer.settings as &dyn InjectSlot)
    }

    fn create_descriptors(persistent_settings: bool) -> DescriptorRegistryPtr {
        let mut registry = StaticDescriptorRegistry::empty();
        registry
            .register_type(TypeDescriptor {
                type_id: TypeId::of::<Settings>(),
                type_name: type_name::<Settings>(),
                kind: ObjectKind::Object,
                constructor: Some(construct_default::<Settings>),
                cast: cast_self::<Settings>,
                injectable: Some(InjectableDescriptor {
                    targets: vec![TargetDefinition {
                        type_id: TypeId::of::<Settings>(),
                        type_name: type_name::<Settings>(),
                        cast: cast_self::<Settings>,
                    }],
                    is_persistent: persistent_settings,
                }),
                receiver: None,
            })
            .unwrap();
        registry
            .register_type(TypeDescriptor {
                type_id: TypeId::of::<Consumer>(),
                type_name: type_name::<Consumer>(),
                kind: ObjectKind::Component,
                constructor: Some(construct_default::<Consumer>),
                cast: cast_self::<Consumer>,
                injectable: None,
                receiver: Some(ReceiverDescriptor {
                    fields: vec![FieldDescriptor {
                        name: "settings",
                        strategy: InjectionStrategy::Global,
                        target_type: TypeId::of::<Settings>(),
                        target_name: type_name::<Settings>(),
                        accessor: consumer_settings,
                    }],
                    base: None,
                }),
            })
            .unwrap();

        Box::new(registry)
    }

    fn create_builder(host: impl SceneHost + 'static) -> ContainerBuilder {
        ContainerBuilder::new()
            .unwrap()
            .with_host(Box::new(host))
            .with_descriptor_registry(create_descriptors(false))
    }

    fn empty_host() -> MockSceneHost {
        let mut host = MockSceneHost::new();
        host.expect_scenes().return_const(vec![]);
        host
    }

    #[test]
    fn should_go_through_lifecycle() {
        let mut container = create_builder(empty_host()).build();
        assert_eq!(container.state(), ContainerState::Uninitialized);
        assert!(matches!(
            container.inject_dependencies_at_scenes().unwrap_err(),
            ContainerError::InvalidState {
                expected: ContainerState::Ready,
                actual: ContainerState::Uninitialized,
            }
        ));

        let report = container.start().unwrap();
        assert_eq!(container.state(), ContainerState::Ready);
        assert!(report.is_complete());

        assert!(matches!(
            container.initialize().unwrap_err(),
            ContainerError::InvalidState {
                expected: ContainerState::Uninitialized,
                actual: ContainerState::Ready,
            }
        ));
    }

    #[test]
    fn should_warn_about_empty_scenes() {
        let mut host = MockSceneHost::new();
        host.expect_scenes().return_const(vec![SceneId(0)]);
        host.expect_root_nodes()
            .with(eq(SceneId(0)))
            .times(1)
            .return_const(vec![]);

        let mut container = create_builder(host).build();
        let report = container.start().unwrap();
        assert_eq!(report.receivers, 0);
    }

    #[test]
    fn should_propagate_rule_provider_errors() {
        let mut provider = MockRuleProvider::new();
        provider
            .expect_rules()
            .times(1)
            .returning(|| Err(Box::new(IoError::new(ErrorKind::Other, "broken")) as ErrorPtr));

        let mut container = create_builder(empty_host())
            .with_rule_provider(Box::new(provider) as RuleProviderPtr)
            .build();

        assert!(matches!(
            container.initialize().unwrap_err(),
            ContainerError::RuleProvider(_)
        ));
        assert_eq!(container.state(), ContainerState::Uninitialized);
    }

    #[test]
    fn should_load_rules_from_providers() {
        let mut container = create_builder(empty_host())
            .with_rule_provider(Box::new(vec![CreationRule::new::<dyn Source, Settings>()]))
            .build();
        container.initialize().unwrap();

        assert!(container
            .rules()
            .resolve_rule(TypeId::of::<dyn Source>())
            .is_some());
        assert!(container.get_or_create_instance::<dyn Source>().is_ok());
    }

    #[test]
    fn should_propagate_missing_prototypes() {
        let mut host = empty_host();
        host.expect_prototype_component_types()
            .with(eq(PrototypeId(3)))
            .times(1)
            .return_const(Err(HostError::PrototypeNotFound(PrototypeId(3))));

        let mut container = create_builder(host)
            .with_prototype(PrototypeId(3))
            .build();

        assert!(matches!(
            container.initialize().unwrap_err(),
            ContainerError::Host(HostError::PrototypeNotFound(PrototypeId(3)))
        ));
    }

    #[test]
    fn should_register_resources_as_persistent() {
        let resource = InstancePtr::new(Settings);
        let mut container = create_builder(empty_host())
            .with_resource(resource.clone() as InstanceAnyPtr)
            .build();
        container.start().unwrap();
        container.clear();

        assert!(InstancePtr::ptr_eq(
            &container.resolve::<Settings>().unwrap(),
            &resource
        ));
    }

    #[test]
    fn should_reject_duplicate_resources() {
        let mut container = create_builder(empty_host())
            .with_resource(InstancePtr::new(Settings) as InstanceAnyPtr)
            .with_resource(InstancePtr::new(Settings) as InstanceAnyPtr)
            .build();

        assert!(matches!(
            container.initialize().unwrap_err(),
            ContainerError::Registry(RegistryError::DuplicateRegistration { .. })
        ));
    }

    #[test]
    fn should_inject_scene_receivers() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let root = graph.spawn(scene, "root").unwrap();
        let settings = graph.attach_component(root, Settings).unwrap();
        let consumer = graph.attach_component(root, Consumer::default()).unwrap();

        let mut container = create_builder(graph).build();
        let report = container.start().unwrap();

        assert_eq!(report.receivers, 1);
        assert_eq!(report.bound_fields, 1);
        assert!(InstancePtr::ptr_eq(
            &consumer.settings.get().unwrap(),
            &settings
        ));
    }

    #[test]
    fn should_report_rejected_scene_registrations() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let root = graph.spawn(scene, "root").unwrap();
        graph.attach_component(root, Settings).unwrap();
        graph.attach_component(root, Settings).unwrap();

        let mut container = create_builder(graph).build();
        let report = container.start().unwrap();

        assert_eq!(report.rejected_registrations.len(), 1);
        assert!(!report.is_complete());
    }

    #[test]
    fn should_create_default_instance_on_demand() {
        let mut container = create_builder(empty_host()).build();
        container.start().unwrap();

        let first = container.get_or_create_instance::<Settings>().unwrap();
        let second = container.get_or_create_instance::<Settings>().unwrap();
        assert!(InstancePtr::ptr_eq(&first, &second));

        let unique = container.create_instance::<Settings>().unwrap();
        assert!(!InstancePtr::ptr_eq(&first, &unique));
    }

    #[test]
    fn should_provide_optional_instances() {
        let mut container = create_builder(empty_host()).build();
        container.start().unwrap();

        let settings = container.global_instance_option::<Settings>().unwrap();
        assert!(InstancePtr::ptr_eq(
            &settings.unwrap(),
            &container.resolve::<Settings>().unwrap()
        ));
        assert!(container
            .global_instance_option::<dyn Source>()
            .unwrap()
            .is_none());
    }

    #[test]
    fn should_instantiate_prototype_and_inject() {
        let mut graph = MemorySceneGraph::new();
        graph.add_scene("main");
        let prototype =
            graph.add_prototype(PrototypeTemplate::new("consumer").with_component::<Consumer>());

        let mut container = create_builder(graph).build();
        container.start().unwrap();

        let consumer = container.instantiate_typed::<Consumer>(prototype).unwrap();
        assert!(consumer.settings.is_bound());
        assert!(container.resolve::<Settings>().is_some());
    }

    #[test]
    fn should_not_instantiate_missing_prototype() {
        let mut graph = MemorySceneGraph::new();
        graph.add_scene("main");

        let mut container = create_builder(graph).build();
        container.start().unwrap();

        assert!(matches!(
            container.instantiate(PrototypeId(9)).unwrap_err(),
            ContainerError::Host(HostError::PrototypeNotFound(PrototypeId(9)))
        ));
    }

    #[test]
    fn should_register_rules_at_runtime() {
        let mut container = create_builder(empty_host()).build();
        container.start().unwrap();

        assert!(container.rules().is_empty());
        container.register_rule::<dyn Source, Settings>().unwrap();
        assert!(container.create_instance::<dyn Source>().is_ok());
    }

    #[test]
    fn should_register_injectable_manually() {
        let mut container = create_builder(empty_host()).build();
        container.start().unwrap();

        assert!(container
            .register_injectable(&(InstancePtr::new(Settings) as InstanceAnyPtr))
            .unwrap());
        assert!(!container
            .register_injectable(&(InstancePtr::new(Consumer::default()) as InstanceAnyPtr))
            .unwrap());
        assert!(container.resolve::<Settings>().is_some());

        container.clear();
        assert!(container.resolve::<Settings>().is_none());
    }

    #[test]
    fn should_report_unresolved_dependency() {
        let mut container = ContainerBuilder::new()
            .unwrap()
            .with_host(Box::new(empty_host()))
            .with_descriptor_registry(Box::new(StaticDescriptorRegistry::empty()))
            .build();
        container.start().unwrap();

        assert!(matches!(
            container.get_or_create_instance::<Settings>().unwrap_err(),
            ContainerError::Resolution(ResolutionError::UnresolvedDependency { .. })
        ));
    }

    #[test]
    fn should_require_ready_container() {
        let mut container: Container = create_builder(empty_host()).build();
        assert!(matches!(
            container.get_or_create_instance::<Settings>().unwrap_err(),
            ContainerError::InvalidState { .. }
        ));
    }
}
