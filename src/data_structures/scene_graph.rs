//! Scene graph and hierarchical scene organization.
//!
//! A loaded model is a tree of [`SceneNode`]s. Container nodes only group and
//! transform their children, model nodes additionally carry a [`Mesh`]. World
//! transforms are not cached: they are recomputed from the local transforms
//! every time the tree is flattened for drawing, so a rotation written to the
//! root is picked up by the whole subtree on the next frame.

use std::{fmt::Debug, sync::Arc};

use cgmath::Matrix4;

use crate::{
    data_structures::{model::Mesh, transform::Transform},
    render::Instanced,
};

pub trait SceneNode: Send + Debug {
    fn get_name(&self) -> &str;

    fn get_local_transform(&self) -> Transform;

    fn set_local_transform(&mut self, transform: Transform);

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Transform));

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn get_mesh(&self) -> Option<&Arc<Mesh>>;

    /**
     * Flattens this node and its subtree into draw calls.
     *
     * `parent` is the world matrix of the node above; pass the identity for a root.
     */
    fn get_render(&self, parent: &Matrix4<f32>) -> Vec<Instanced<'_>> {
        let world = parent * self.get_local_transform().to_matrix();
        self.get_mesh()
            .map(|mesh| Instanced { mesh, world })
            .into_iter()
            .chain(
                self.get_children()
                    .iter()
                    .flat_map(|child| child.get_render(&world)),
            )
            .collect()
    }
}

/// Number of nodes in the subtree rooted at `node`, `node` included.
pub fn count_nodes(node: &dyn SceneNode) -> usize {
    1 + node
        .get_children()
        .iter()
        .map(|child| count_nodes(child.as_ref()))
        .sum::<usize>()
}

/// A node without geometry that groups and transforms its children.
#[derive(Debug, Default)]
pub struct ContainerNode {
    pub name: String,
    pub local: Transform,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new(name: &str, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            name: name.to_string(),
            local: Transform::default(),
            children,
        }
    }
}

impl SceneNode for ContainerNode {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> Transform {
        self.local
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Transform)) {
        mutation(&mut self.local);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn get_mesh(&self) -> Option<&Arc<Mesh>> {
        None
    }
}

/// A node that draws one mesh and may have children of its own.
#[derive(Debug)]
pub struct ModelNode {
    local: Transform,
    mesh: Arc<Mesh>,
    children: Vec<Box<dyn SceneNode>>,
}

impl ModelNode {
    pub fn new(mesh: Mesh) -> Self {
        Self::from_shared(Arc::new(mesh))
    }

    pub fn from_shared(mesh: Arc<Mesh>) -> Self {
        Self {
            local: Transform::default(),
            mesh,
            children: Vec::new(),
        }
    }
}

impl SceneNode for ModelNode {
    fn get_name(&self) -> &str {
        &self.mesh.name
    }

    fn get_local_transform(&self) -> Transform {
        self.local
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Transform)) {
        mutation(&mut self.local);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn get_mesh(&self) -> Option<&Arc<Mesh>> {
        Some(&self.mesh)
    }
}

/// Wrap the loaded nodes under a fresh container whose transform the caller owns.
///
/// A lone node is returned as is only when its own transform is the identity,
/// otherwise placing the root would overwrite the authored transform.
pub fn mk_root(name: &str, mut nodes: Vec<Box<dyn SceneNode>>) -> Box<dyn SceneNode> {
    if nodes.len() == 1 && nodes[0].get_local_transform().is_identity() {
        if let Some(node) = nodes.pop() {
            return node;
        }
    }
    Box::new(ContainerNode::new(name, nodes))
}
