//! Field resolution. A receiver is injected level by level: first the fields declared on its
//! concrete type, then the fields of its embedded base, as long as the base is itself a
//! registered receiver. Each field is resolved according to its
//! [InjectionStrategy](crate::component::InjectionStrategy), and every failure is logged and
//! recorded without stopping injection of the remaining fields.

use crate::component::InjectionStrategy;
use crate::component_registry::{concrete_type_id, FieldDescriptor, TargetDefinition};
use crate::error::ResolutionError;
use crate::factory::{Container, InjectionFailure, InjectionReport};
use crate::instance_provider::{CastFunction, InstanceAnyPtr};
use crate::policy::HierarchyFallback;
use crate::scene::traversal::{
    component_in_ancestors, component_in_children, components_in_subtree,
};
use crate::scene::{NodeId, PrototypeId};
use crate::scope::Partition;
use std::any::{Any, TypeId};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Direction {
    Down,
    Up,
}

impl Container {
    /// Injects all fields of the receiver, including those of its embedded bases.
    pub(crate) fn inject_receiver(&mut self, instance: &InstanceAnyPtr, report: &mut InjectionReport) {
        let mut type_id = concrete_type_id(instance);
        let Some(receiver_name) = self
            .descriptors
            .descriptor(type_id)
            .filter(|descriptor| descriptor.receiver.is_some())
            .map(|descriptor| descriptor.type_name)
        else {
            return;
        };

        report.receivers += 1;

        let mut level: &dyn Any = &**instance;
        while let Some(receiver) = self.descriptors.receiver(type_id).cloned() {
            for field in &receiver.fields {
                match self.inject_field(instance, level, field, report) {
                    Ok(()) => report.bound_fields += 1,
                    Err(error) => {
                        warn!(
                            receiver = receiver_name,
                            field = field.name,
                            target_type = field.target_name,
                            %error,
                            "Cannot inject field."
                        );

                        report.failures.push(InjectionFailure {
                            receiver: receiver_name,
                            field: field.name,
                            error,
                        });
                    }
                }
            }

            let Some(base) = receiver.base else {
                break;
            };

            let Some(base_level) = (base.accessor)(level) else {
                warn!(
                    receiver = receiver_name,
                    base = base.type_name,
                    "Cannot access embedded base."
                );

                report.failures.push(InjectionFailure {
                    receiver: receiver_name,
                    field: base.type_name,
                    error: ResolutionError::IncompatibleInstance {
                        type_name: base.type_name.to_string(),
                    },
                });
                break;
            };

            level = base_level;
            type_id = base.type_id;
        }
    }

    fn inject_field(
        &mut self,
        instance: &InstanceAnyPtr,
        level: &dyn Any,
        field: &FieldDescriptor,
        report: &mut InjectionReport,
    ) -> Result<(), ResolutionError> {
        let incompatible = || ResolutionError::IncompatibleInstance {
            type_name: field.target_name.to_string(),
        };

        let slot = (field.accessor)(level).ok_or_else(incompatible)?;
        let value = match field.strategy {
            InjectionStrategy::Global => {
                self.resolve_global(field.target_type, field.target_name, report)?
            }
            InjectionStrategy::Unique => {
                self.resolve_unique(field.target_type, field.target_name, report)?
            }
            InjectionStrategy::DownInHierarchy => {
                self.resolve_in_hierarchy(instance, field, Direction::Down, report)?
            }
            InjectionStrategy::UpInHierarchy => {
                self.resolve_in_hierarchy(instance, field, Direction::Up, report)?
            }
        };

        slot.bind(value).map_err(|_| incompatible())
    }

    /// Resolves a shared instance: registry, then prototype, then creation rule, then default
    /// construction of a concrete non-component type.
    pub(crate) fn resolve_global(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        report: &mut InjectionReport,
    ) -> Result<Box<dyn Any>, ResolutionError> {
        let incompatible = || ResolutionError::IncompatibleInstance {
            type_name: type_name.to_string(),
        };

        if let Some(registered) = self.registry.lookup(type_id) {
            return registered.cast().map_err(|_| incompatible());
        }

        if let Some(prototype) = self.registry.lookup_prototype(type_id) {
            return self.realize_prototype(prototype, type_id, type_name, report);
        }

        if let Some(rule) = self.rules.resolve_rule(type_id).copied() {
            debug!(
                abstract_type = rule.abstract_name,
                concrete_type = rule.concrete_name,
                "Creating instance with creation rule."
            );

            let instance = self.construct(rule.concrete_type, rule.concrete_name, report)?;
            self.register_created(&instance, type_id, type_name, rule.cast);
            return (rule.cast)(instance).map_err(|_| incompatible());
        }

        let Some(descriptor) = self.descriptors.descriptor(type_id) else {
            return Err(ResolutionError::UnresolvedDependency {
                type_name: type_name.to_string(),
            });
        };

        if descriptor.is_component() {
            return Err(ResolutionError::UnresolvedDependency {
                type_name: type_name.to_string(),
            });
        }

        let cast = descriptor.cast;
        info!(
            target_type = type_name,
            "No suitable creation rule has been found. Creating default object."
        );

        let instance = self.construct(type_id, type_name, report)?;
        self.register_created(&instance, type_id, type_name, cast);
        cast(instance).map_err(|_| incompatible())
    }

    /// Creates a fresh instance, never consulting the registry. Component types can't be created
    /// this way.
    pub(crate) fn resolve_unique(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        report: &mut InjectionReport,
    ) -> Result<Box<dyn Any>, ResolutionError> {
        let incompatible = || ResolutionError::IncompatibleInstance {
            type_name: type_name.to_string(),
        };

        let (concrete_type, concrete_name, cast) =
            if let Some(descriptor) = self.descriptors.descriptor(type_id) {
                (descriptor.type_id, descriptor.type_name, descriptor.cast)
            } else if let Some(rule) = self.rules.resolve_rule(type_id) {
                (rule.concrete_type, rule.concrete_name, rule.cast)
            } else {
                return Err(ResolutionError::UnresolvedDependency {
                    type_name: type_name.to_string(),
                });
            };

        if self
            .descriptors
            .descriptor(concrete_type)
            .map(|descriptor| descriptor.is_component())
            .unwrap_or(false)
        {
            return Err(ResolutionError::UnsupportedStrategy {
                type_name: concrete_name.to_string(),
            });
        }

        let instance = self.construct(concrete_type, concrete_name, report)?;
        cast(instance).map_err(|_| incompatible())
    }

    fn resolve_in_hierarchy(
        &mut self,
        instance: &InstanceAnyPtr,
        field: &FieldDescriptor,
        direction: Direction,
        report: &mut InjectionReport,
    ) -> Result<Box<dyn Any>, ResolutionError> {
        let node =
            self.host
                .node_of(instance)
                .ok_or_else(|| ResolutionError::NotAHierarchyNode {
                    type_name: field.target_name.to_string(),
                })?;

        let found = match direction {
            Direction::Down => component_in_children(
                self.host.as_ref(),
                self.descriptors.as_ref(),
                node,
                field.target_type,
            ),
            Direction::Up => component_in_ancestors(
                self.host.as_ref(),
                self.descriptors.as_ref(),
                node,
                field.target_type,
            ),
        };

        if let Some(component) = found {
            return Ok(component);
        }

        match self.policy.hierarchy_fallback {
            HierarchyFallback::Warn => Err(ResolutionError::ComponentNotFound {
                type_name: field.target_name.to_string(),
                node,
            }),
            HierarchyFallback::AddDefaultComponent => {
                warn!(
                    field = field.name,
                    target_type = field.target_name,
                    %node,
                    ?direction,
                    "Cannot find a component in hierarchy. Adding default if possible."
                );

                self.add_default_component(node, field.target_type, field.target_name, report)
            }
        }
    }

    /// Adds a default component to the node or, for abstract types, constructs the concrete type
    /// from the creation rule. Added components get injected.
    fn add_default_component(
        &mut self,
        node: NodeId,
        type_id: TypeId,
        type_name: &'static str,
        report: &mut InjectionReport,
    ) -> Result<Box<dyn Any>, ResolutionError> {
        let incompatible = || ResolutionError::IncompatibleInstance {
            type_name: type_name.to_string(),
        };

        let (concrete_type, cast) = match self.descriptors.descriptor(type_id) {
            Some(descriptor) if descriptor.is_component() => (descriptor.type_id, descriptor.cast),
            Some(_) => {
                return Err(ResolutionError::ComponentNotFound {
                    type_name: type_name.to_string(),
                    node,
                })
            }
            None => match self.rules.resolve_rule(type_id) {
                Some(rule) => (rule.concrete_type, rule.cast),
                None => {
                    return Err(ResolutionError::ComponentNotFound {
                        type_name: type_name.to_string(),
                        node,
                    })
                }
            },
        };

        let Some(descriptor) = self.descriptors.descriptor(concrete_type) else {
            return Err(ResolutionError::NoDefaultConstructor {
                type_name: type_name.to_string(),
            });
        };

        let concrete_name = descriptor.type_name;
        let instance = if descriptor.is_component() {
            let constructor =
                descriptor
                    .constructor
                    .ok_or_else(|| ResolutionError::NoDefaultConstructor {
                        type_name: concrete_name.to_string(),
                    })?;

            self.enter_construction(concrete_type, concrete_name)?;

            let instance = self.host.add_component(node, constructor);
            if let Ok(instance) = &instance {
                debug!(component_type = concrete_name, %node, "Added default component.");
                self.inject_receiver(instance, report);
            }

            self.types_under_construction.remove(&concrete_type);
            instance?
        } else {
            self.construct(concrete_type, concrete_name, report)?
        };

        cast(instance).map_err(|_| incompatible())
    }

    /// Realizes the prototype, registers its injectables, injects its receivers and returns the
    /// component matching the requested type. The realization is destroyed when nothing in it
    /// matches.
    fn realize_prototype(
        &mut self,
        prototype: PrototypeId,
        type_id: TypeId,
        type_name: &'static str,
        report: &mut InjectionReport,
    ) -> Result<Box<dyn Any>, ResolutionError> {
        let root = self.host.instantiate(prototype)?;

        let Some(component) = component_in_children(
            self.host.as_ref(),
            self.descriptors.as_ref(),
            root,
            type_id,
        ) else {
            self.host.destroy(root);
            return Err(ResolutionError::ComponentNotFound {
                type_name: type_name.to_string(),
                node: root,
            });
        };

        let components = components_in_subtree(self.host.as_ref(), root);
        for (_, instance) in &components {
            if let Err(error) = self.register_injectable_instance(instance) {
                warn!(%prototype, %error, "Cannot register prototype injectable.");
                report.rejected_registrations.push(error);
            }
        }

        for (_, instance) in &components {
            if self
                .descriptors
                .receiver(concrete_type_id(instance))
                .is_some()
            {
                self.inject_receiver(instance, report);
            }
        }

        debug!(%prototype, %root, target_type = type_name, "Realized prototype.");
        Ok(component)
    }

    /// Default-constructs and injects an instance of a concrete type.
    fn construct(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        report: &mut InjectionReport,
    ) -> Result<InstanceAnyPtr, ResolutionError> {
        let constructor = self
            .descriptors
            .descriptor(type_id)
            .and_then(|descriptor| descriptor.constructor)
            .ok_or_else(|| ResolutionError::NoDefaultConstructor {
                type_name: type_name.to_string(),
            })?;

        self.enter_construction(type_id, type_name)?;

        let instance = constructor();
        self.inject_receiver(&instance, report);

        self.types_under_construction.remove(&type_id);
        Ok(instance)
    }

    fn enter_construction(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<(), ResolutionError> {
        if self.types_under_construction.insert(type_id) {
            Ok(())
        } else {
            Err(ResolutionError::DependencyCycle {
                type_name: type_name.to_string(),
            })
        }
    }

    /// Registers an instance created for a `Global` request under its own targets and under the
    /// requested type, so subsequent requests share it. The requested type goes to the same
    /// partition as the instance's own targets, or the scene partition if the instance isn't
    /// globally injectable. Conflicts are only logged, since the instance is already usable by the
    /// requester.
    fn register_created(
        &mut self,
        instance: &InstanceAnyPtr,
        requested_type: TypeId,
        requested_name: &'static str,
        cast: CastFunction,
    ) {
        if let Err(error) = self.register_injectable_instance(instance) {
            warn!(%error, "Cannot register created instance.");
        }

        if self.registry.contains(requested_type) {
            return;
        }

        let target = TargetDefinition {
            type_id: requested_type,
            type_name: requested_name,
            cast,
        };

        let partition = self
            .descriptors
            .injectable(concrete_type_id(instance))
            .map(|injectable| Partition::from_persistence(injectable.is_persistent))
            .unwrap_or(Partition::Scene);

        if let Err(error) = self.registry.register(instance, &[target], partition) {
            warn!(%error, "Cannot register created instance.");
        }
    }
}
