use crate::factory::ContainerState;
use crate::instance_provider::ErrorPtr;
use crate::scene::{NodeId, PrototypeId, SceneId};
use crate::scope::Partition;
use thiserror::Error;

/// Errors related to registering instances, prototypes, rules and type descriptors.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum RegistryError {
    #[error("Attempted to register a duplicated instance for type {type_name} in the {partition} partition")]
    DuplicateRegistration {
        type_name: String,
        partition: Partition,
    },
    #[error("Attempted to register a duplicated prototype for type: {0}")]
    DuplicatePrototype(String),
    #[error("Attempted to register a duplicated creation rule for type: {0}")]
    DuplicateRule(String),
    #[error("Attempted to re-register a type descriptor: {0}")]
    DuplicateDescriptor(String),
}

/// Errors reported by a [SceneHost](crate::scene::SceneHost).
#[derive(Error, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum HostError {
    #[error("Cannot find scene node: {0}")]
    NodeNotFound(NodeId),
    #[error("Cannot find prototype: {0}")]
    PrototypeNotFound(PrototypeId),
    #[error("Cannot find scene: {0}")]
    SceneNotFound(SceneId),
}

/// Errors resolving a single injected field. None of them is fatal to an injection sweep - they
/// are logged and collected in an [InjectionReport](crate::factory::InjectionReport).
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ResolutionError {
    #[error("Cannot find an injectable, prototype or creation rule for type: {type_name}")]
    UnresolvedDependency { type_name: String },
    #[error("Unique injection is not supported for hierarchy-bound type: {type_name}")]
    UnsupportedStrategy { type_name: String },
    #[error("Cannot find a component of type {type_name} in the hierarchy of node {node}")]
    ComponentNotFound { type_name: String, node: NodeId },
    #[error("Type has no usable default constructor: {type_name}")]
    NoDefaultConstructor { type_name: String },
    #[error("Hierarchy injection of {type_name} requested for a receiver not attached to a scene node")]
    NotAHierarchyNode { type_name: String },
    #[error("Resolved instance is incompatible with requested type: {type_name}")]
    IncompatibleInstance { type_name: String },
    #[error("Detected a dependency cycle while creating: {type_name}")]
    DependencyCycle { type_name: String },
    #[error("Scene host error: {0}")]
    Host(#[from] HostError),
}

/// Errors related to the container lifecycle. Unlike [ResolutionError], these are propagated to the
/// host.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Invalid configuration: {0}")]
    Registry(#[from] RegistryError),
    #[error("Creation rule provider failed: {0}")]
    RuleProvider(ErrorPtr),
    #[error("Scene host error: {0}")]
    Host(#[from] HostError),
    #[error("Container is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: ContainerState,
        actual: ContainerState,
    },
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("No container is installed")]
    NotInstalled,
    #[error("Installed container is already in use")]
    ReentrantAccess,
}
