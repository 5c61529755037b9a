//! The renderer contract and draw-list composition.
//!
//! The scene never talks to the GPU directly. Each frame it is flattened into
//! [`Instanced`] draws (mesh + world matrix), which a [`Renderer`] batches per
//! mesh so that repeated meshes are drawn with a single instanced call.
//!
//! # Key types
//!
//! - [`Renderer`] is what the animation step calls once per frame
//! - [`Instanced<'a>`] is one mesh placed in the world
//! - [`Batch<'a>`] is every placement of one mesh, ready for instanced drawing

use std::{collections::BTreeMap, sync::Arc};

use cgmath::Matrix4;

use crate::{
    camera::PerspectiveCamera,
    data_structures::model::{Mesh, MeshId},
    scene::Scene,
};

/// Draws the current state of a scene from a camera.
///
/// Implemented by [`crate::gpu_renderer::WgpuRenderer`] for real output and by
/// recording doubles in tests.
pub trait Renderer {
    type Error: std::fmt::Display;

    fn draw(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), Self::Error>;
}

/// One mesh at one world transform.
#[derive(Clone, Debug)]
pub struct Instanced<'a> {
    pub mesh: &'a Arc<Mesh>,
    pub world: Matrix4<f32>,
}

/// All world transforms of a single mesh.
#[derive(Debug)]
pub struct Batch<'a> {
    pub mesh: &'a Arc<Mesh>,
    pub instances: Vec<Matrix4<f32>>,
}

/// Group draws by mesh. Batches come out in mesh creation order.
pub fn batch<'a>(draws: Vec<Instanced<'a>>) -> Vec<Batch<'a>> {
    let mut batches: BTreeMap<MeshId, Batch<'a>> = BTreeMap::new();
    for Instanced { mesh, world } in draws {
        batches
            .entry(mesh.id)
            .and_modify(|batch| batch.instances.push(world))
            .or_insert(Batch {
                mesh,
                instances: vec![world],
            });
    }
    batches.into_values().collect()
}
