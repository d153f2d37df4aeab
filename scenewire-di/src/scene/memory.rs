//! In-memory scene graph. Nodes are owned by the graph and identified by [NodeId]s; components are
//! shared instances attached to nodes. Prototypes are templates realized on demand, mirroring
//! prefabs in a game engine.

use crate::component::{construct_default, Injectable};
use crate::error::HostError;
use crate::instance_provider::{Constructor, InstanceAnyPtr, InstancePtr};
use crate::scene::{NodeId, PrototypeId, SceneHost, SceneId};
use derivative::Derivative;
use fxhash::FxHashMap;
use std::any::TypeId;
use tracing::debug;

/// Component declared by a [PrototypeTemplate].
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct TemplateComponent {
    pub type_id: TypeId,
    #[derivative(Debug = "ignore")]
    pub constructor: Constructor,
}

/// Template of a subtree which can be instantiated any number of times.
#[derive(Clone, Debug)]
pub struct PrototypeTemplate {
    name: String,
    components: Vec<TemplateComponent>,
    children: Vec<PrototypeTemplate>,
}

impl PrototypeTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: vec![],
            children: vec![],
        }
    }

    /// Adds a default-constructed component to the template root.
    pub fn with_component<C: Injectable + Default>(self) -> Self {
        self.with_constructor(TypeId::of::<C>(), construct_default::<C>)
    }

    /// Adds a component created with the given constructor, which must produce instances of the
    /// given type.
    pub fn with_constructor(mut self, type_id: TypeId, constructor: Constructor) -> Self {
        self.components.push(TemplateComponent {
            type_id,
            constructor,
        });
        self
    }

    pub fn with_child(mut self, child: PrototypeTemplate) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn collect_component_types(&self, result: &mut Vec<TypeId>) {
        result.extend(self.components.iter().map(|component| component.type_id));
        for child in &self.children {
            child.collect_component_types(result);
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
struct Node {
    name: String,
    scene: SceneId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    #[derivative(Debug = "ignore")]
    components: Vec<InstanceAnyPtr>,
}

#[derive(Debug)]
struct Scene {
    name: String,
    roots: Vec<NodeId>,
}

/// Scene graph kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySceneGraph {
    scenes: Vec<Scene>,
    active_scene: Option<SceneId>,
    nodes: FxHashMap<NodeId, Node>,
    // component address -> owning node
    owners: FxHashMap<usize, NodeId>,
    prototypes: Vec<PrototypeTemplate>,
    next_node: u64,
}

impl MemorySceneGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a new, empty scene. The first loaded scene becomes active.
    pub fn add_scene(&mut self, name: impl Into<String>) -> SceneId {
        let id = SceneId(self.scenes.len() as u32);
        self.scenes.push(Scene {
            name: name.into(),
            roots: vec![],
        });

        if self.active_scene.is_none() {
            self.active_scene = Some(id);
        }

        id
    }

    /// Changes the scene receiving instantiated prototypes.
    pub fn set_active_scene(&mut self, scene: SceneId) -> Result<(), HostError> {
        if self.scene(scene).is_none() {
            return Err(HostError::SceneNotFound(scene));
        }

        self.active_scene = Some(scene);
        Ok(())
    }

    #[inline]
    pub fn active_scene(&self) -> Option<SceneId> {
        self.active_scene
    }

    pub fn scene_name(&self, scene: SceneId) -> Option<&str> {
        self.scene(scene).map(|scene| scene.name.as_str())
    }

    /// Creates a new root node in the given scene.
    pub fn spawn(&mut self, scene: SceneId, name: impl Into<String>) -> Result<NodeId, HostError> {
        let id = self.create_node(scene, None, name.into())?;
        if let Some(scene) = self.scenes.get_mut(scene.0 as usize) {
            scene.roots.push(id);
        }

        Ok(id)
    }

    /// Creates a new node as the last child of the given parent.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, HostError> {
        let scene = self
            .nodes
            .get(&parent)
            .map(|node| node.scene)
            .ok_or(HostError::NodeNotFound(parent))?;

        let id = self.create_node(scene, Some(parent), name.into())?;
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }

        Ok(id)
    }

    /// Attaches an existing instance to the node.
    pub fn attach(&mut self, node: NodeId, instance: InstanceAnyPtr) -> Result<(), HostError> {
        let target = self
            .nodes
            .get_mut(&node)
            .ok_or(HostError::NodeNotFound(node))?;

        self.owners.insert(address(&instance), node);
        target.components.push(instance);
        Ok(())
    }

    /// Attaches the component to the node and returns the shared instance.
    pub fn attach_component<C: Injectable>(
        &mut self,
        node: NodeId,
        component: C,
    ) -> Result<InstancePtr<C>, HostError> {
        let instance = InstancePtr::new(component);
        self.attach(node, instance.clone() as InstanceAnyPtr)?;
        Ok(instance)
    }

    /// Registers a template for later instantiation.
    pub fn add_prototype(&mut self, template: PrototypeTemplate) -> PrototypeId {
        let id = PrototypeId(self.prototypes.len() as u32);
        self.prototypes.push(template);
        id
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|node| node.name.as_str())
    }

    /// Finds the first node with the given name, in no particular order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn scene(&self, scene: SceneId) -> Option<&Scene> {
        self.scenes.get(scene.0 as usize)
    }

    fn create_node(
        &mut self,
        scene: SceneId,
        parent: Option<NodeId>,
        name: String,
    ) -> Result<NodeId, HostError> {
        if self.scene(scene).is_none() {
            return Err(HostError::SceneNotFound(scene));
        }

        let id = NodeId(self.next_node);
        self.next_node += 1;

        self.nodes.insert(
            id,
            Node {
                name,
                scene,
                parent,
                children: vec![],
                components: vec![],
            },
        );

        Ok(id)
    }

    fn realize(
        &mut self,
        template: &PrototypeTemplate,
        scene: SceneId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, HostError> {
        let node = match parent {
            Some(parent) => self.spawn_child(parent, template.name.clone())?,
            None => self.spawn(scene, template.name.clone())?,
        };

        for component in &template.components {
            self.attach(node, (component.constructor)())?;
        }

        for child in &template.children {
            self.realize(child, scene, Some(node))?;
        }

        Ok(node)
    }

    fn remove_subtree(&mut self, node: NodeId) {
        if let Some(removed) = self.nodes.remove(&node) {
            for component in &removed.components {
                self.owners.remove(&address(component));
            }

            for child in removed.children {
                self.remove_subtree(child);
            }
        }
    }
}

impl SceneHost for MemorySceneGraph {
    fn scenes(&self) -> Vec<SceneId> {
        (0..self.scenes.len() as u32).map(SceneId).collect()
    }

    fn root_nodes(&self, scene: SceneId) -> Vec<NodeId> {
        self.scene(scene)
            .map(|scene| scene.roots.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|node| node.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn components(&self, node: NodeId) -> Vec<InstanceAnyPtr> {
        self.nodes
            .get(&node)
            .map(|node| node.components.clone())
            .unwrap_or_default()
    }

    fn node_of(&self, instance: &InstanceAnyPtr) -> Option<NodeId> {
        self.owners.get(&address(instance)).copied()
    }

    fn add_component(
        &mut self,
        node: NodeId,
        constructor: Constructor,
    ) -> Result<InstanceAnyPtr, HostError> {
        if !self.contains(node) {
            return Err(HostError::NodeNotFound(node));
        }

        let instance = constructor();
        self.attach(node, instance.clone())?;
        Ok(instance)
    }

    fn prototype_component_types(&self, prototype: PrototypeId) -> Result<Vec<TypeId>, HostError> {
        let template = self
            .prototypes
            .get(prototype.0 as usize)
            .ok_or(HostError::PrototypeNotFound(prototype))?;

        let mut result = vec![];
        template.collect_component_types(&mut result);
        Ok(result)
    }

    fn instantiate(&mut self, prototype: PrototypeId) -> Result<NodeId, HostError> {
        let template = self
            .prototypes
            .get(prototype.0 as usize)
            .cloned()
            .ok_or(HostError::PrototypeNotFound(prototype))?;

        let scene = self.active_scene.ok_or(HostError::SceneNotFound(SceneId(0)))?;
        let root = self.realize(&template, scene, None)?;

        debug!(%prototype, %root, name = template.name, "Instantiated prototype.");
        Ok(root)
    }

    fn destroy(&mut self, node: NodeId) {
        let Some((parent, scene)) = self.nodes.get(&node).map(|node| (node.parent, node.scene))
        else {
            return;
        };

        match parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.retain(|child| *child != node);
                }
            }
            None => {
                if let Some(scene) = self.scenes.get_mut(scene.0 as usize) {
                    scene.roots.retain(|root| *root != node);
                }
            }
        }

        self.remove_subtree(node);
        debug!(%node, "Destroyed node.");
    }
}

#[inline]
fn address(instance: &InstanceAnyPtr) -> usize {
    InstancePtr::as_ptr(instance) as *const () as usize
}

#[cfg(test)]
mod tests {
    use crate::component::Injectable;
    use crate::error::HostError;
    use crate::instance_provider::{InstanceAnyPtr, InstancePtr};
    use crate::scene::memory::{MemorySceneGraph, PrototypeTemplate};
    use crate::scene::{NodeId, PrototypeId, SceneHost, SceneId};
    use std::any::TypeId;

    #[derive(Default)]
    struct Body;

    impl Injectable for Body {}

    #[derive(Default)]
    struct Wheel;

    impl Injectable for Wheel {}

    #[test]
    fn should_build_hierarchy() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let root = graph.spawn(scene, "root").unwrap();
        let child = graph.spawn_child(root, "child").unwrap();

        assert_eq!(graph.scenes(), vec![scene]);
        assert_eq!(graph.root_nodes(scene), vec![root]);
        assert_eq!(graph.children(root), vec![child]);
        assert_eq!(graph.parent(child), Some(root));
        assert_eq!(graph.parent(root), None);
        assert_eq!(graph.name(child), Some("child"));
        assert_eq!(graph.find("root"), Some(root));
    }

    #[test]
    fn should_not_spawn_in_missing_scene() {
        let mut graph = MemorySceneGraph::new();
        assert_eq!(
            graph.spawn(SceneId(3), "root").unwrap_err(),
            HostError::SceneNotFound(SceneId(3))
        );
        assert_eq!(
            graph.spawn_child(NodeId(8), "child").unwrap_err(),
            HostError::NodeNotFound(NodeId(8))
        );
    }

    #[test]
    fn should_track_component_owners() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let root = graph.spawn(scene, "root").unwrap();
        let body = graph.attach_component(root, Body).unwrap();

        assert_eq!(graph.components(root).len(), 1);
        assert_eq!(graph.node_of(&(body as InstanceAnyPtr)), Some(root));

        let detached = InstancePtr::new(Body) as InstanceAnyPtr;
        assert_eq!(graph.node_of(&detached), None);
    }

    #[test]
    fn should_add_component() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let root = graph.spawn(scene, "root").unwrap();

        let wheel = graph
            .add_component(root, crate::component::construct_default::<Wheel>)
            .unwrap();
        assert!(wheel.is::<Wheel>());
        assert_eq!(graph.node_of(&wheel), Some(root));
    }

    #[test]
    fn should_instantiate_prototype() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let prototype = graph.add_prototype(
            PrototypeTemplate::new("car")
                .with_component::<Body>()
                .with_child(PrototypeTemplate::new("wheel").with_component::<Wheel>()),
        );

        assert_eq!(
            graph.prototype_component_types(prototype).unwrap(),
            vec![TypeId::of::<Body>(), TypeId::of::<Wheel>()]
        );

        let first = graph.instantiate(prototype).unwrap();
        let second = graph.instantiate(prototype).unwrap();
        assert_ne!(first, second);
        assert_eq!(graph.root_nodes(scene), vec![first, second]);
        assert_eq!(graph.children(first).len(), 1);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn should_instantiate_into_active_scene() {
        let mut graph = MemorySceneGraph::new();
        let menu = graph.add_scene("menu");
        let level = graph.add_scene("level");
        let prototype = graph.add_prototype(PrototypeTemplate::new("car").with_component::<Body>());

        assert_eq!(graph.active_scene(), Some(menu));
        assert_eq!(graph.scene_name(level), Some("level"));
        assert_eq!(graph.scene_name(SceneId(5)), None);

        assert_eq!(
            graph.set_active_scene(SceneId(5)).unwrap_err(),
            HostError::SceneNotFound(SceneId(5))
        );
        assert_eq!(graph.active_scene(), Some(menu));

        graph.set_active_scene(level).unwrap();
        let car = graph.instantiate(prototype).unwrap();

        assert_eq!(graph.root_nodes(level), vec![car]);
        assert!(graph.root_nodes(menu).is_empty());
    }

    #[test]
    fn should_not_instantiate_missing_prototype() {
        let mut graph = MemorySceneGraph::new();
        graph.add_scene("main");
        assert_eq!(
            graph.instantiate(PrototypeId(1)).unwrap_err(),
            HostError::PrototypeNotFound(PrototypeId(1))
        );
    }

    #[test]
    fn should_destroy_subtree() {
        let mut graph = MemorySceneGraph::new();
        let scene = graph.add_scene("main");
        let root = graph.spawn(scene, "root").unwrap();
        let child = graph.spawn_child(root, "child").unwrap();
        let leaf = graph.spawn_child(child, "leaf").unwrap();
        let body = graph.attach_component(leaf, Body).unwrap() as InstanceAnyPtr;

        graph.destroy(child);

        assert_eq!(graph.children(root), vec![]);
        assert!(!graph.contains(leaf));
        assert_eq!(graph.node_of(&body), None);

        graph.destroy(root);
        assert!(graph.root_nodes(scene).is_empty());
        assert_eq!(graph.node_count(), 0);
    }
}
