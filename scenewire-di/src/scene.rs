//! The live scene graph is owned by the host application. The container only consumes it through
//! the [SceneHost] trait: enumerating scenes and nodes, reading components, adding default
//! components and instantiating prototypes. [memory::MemorySceneGraph] is a self-contained
//! implementation, useful for tests and for hosts without an engine of their own.

pub mod memory;
pub mod traversal;

use crate::error::HostError;
use crate::instance_provider::{Constructor, InstanceAnyPtr};
#[cfg(test)]
use mockall::automock;
use std::any::TypeId;
use std::fmt::{Display, Formatter};

/// Identifier of a node in the scene graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub u64);

/// Identifier of a loaded scene.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SceneId(pub u32);

/// Handle to an un-instantiated template, e.g. a prefab.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PrototypeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Display for SceneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

impl Display for PrototypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "prototype#{}", self.0)
    }
}

pub type SceneHostPtr = Box<dyn SceneHost>;

/// Live object tree collaborator.
#[cfg_attr(test, automock)]
pub trait SceneHost {
    /// Currently loaded scenes, in load order.
    fn scenes(&self) -> Vec<SceneId>;

    /// Root nodes of the given scene.
    fn root_nodes(&self, scene: SceneId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Components attached directly to the node, in attachment order.
    fn components(&self, node: NodeId) -> Vec<InstanceAnyPtr>;

    /// Returns the node the given component instance is attached to.
    fn node_of(&self, instance: &InstanceAnyPtr) -> Option<NodeId>;

    /// Creates a component with the constructor and attaches it to the node.
    fn add_component(
        &mut self,
        node: NodeId,
        constructor: Constructor,
    ) -> Result<InstanceAnyPtr, HostError>;

    /// Concrete types of all components in the prototype's template tree.
    fn prototype_component_types(&self, prototype: PrototypeId) -> Result<Vec<TypeId>, HostError>;

    /// Realizes the prototype as a new live subtree and returns its root.
    fn instantiate(&mut self, prototype: PrototypeId) -> Result<NodeId, HostError>;

    /// Removes the node with its subtree from the scene graph.
    fn destroy(&mut self, node: NodeId);
}
