//! Hierarchy searches expressed over any [SceneHost]. Components match a requested type when the
//! [DescriptorRegistry] knows a cast from their concrete type to it.

use crate::component_registry::DescriptorRegistry;
use crate::instance_provider::InstanceAnyPtr;
use crate::scene::{NodeId, SceneHost};
use std::any::{Any, TypeId};

/// Returns all components in the subtree, in pre-order: components of a node come before the
/// components of its children.
pub fn components_in_subtree(host: &dyn SceneHost, root: NodeId) -> Vec<(NodeId, InstanceAnyPtr)> {
    let mut result = vec![];
    for node in nodes_in_subtree(host, root) {
        result.extend(
            host.components(node)
                .into_iter()
                .map(|component| (node, component)),
        );
    }

    result
}

/// Returns the node and all its descendants, in pre-order.
pub fn nodes_in_subtree(host: &dyn SceneHost, root: NodeId) -> Vec<NodeId> {
    let mut result = vec![];
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        result.push(node);
        stack.extend(host.children(node).into_iter().rev());
    }

    result
}

/// Finds the first component attached directly to the node which can be viewed as the target
/// type. The result contains an `InstancePtr<Target>`.
pub fn component_on_node(
    host: &dyn SceneHost,
    descriptors: &dyn DescriptorRegistry,
    node: NodeId,
    target_type: TypeId,
) -> Option<Box<dyn Any>> {
    host.components(node)
        .iter()
        .find_map(|component| descriptors.cast(component, target_type))
}

/// Searches the node and its descendants, depth-first.
pub fn component_in_children(
    host: &dyn SceneHost,
    descriptors: &dyn DescriptorRegistry,
    node: NodeId,
    target_type: TypeId,
) -> Option<Box<dyn Any>> {
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        if let Some(component) = component_on_node(host, descriptors, current, target_type) {
            return Some(component);
        }

        stack.extend(host.children(current).into_iter().rev());
    }

    None
}

/// Searches the node and its ancestors, nearest first.
pub fn component_in_ancestors(
    host: &dyn SceneHost,
    descriptors: &dyn DescriptorRegistry,
    node: NodeId,
    target_type: TypeId,
) -> Option<Box<dyn Any>> {
    let mut current = Some(node);

    while let Some(node) = current {
        if let Some(component) = component_on_node(host, descriptors, node, target_type) {
            return Some(component);
        }

        current = host.parent(node);
    }

    None
}
