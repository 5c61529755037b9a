//! CPU-side mesh and material data produced by the model loaders.
//!
//! Nothing in here touches the GPU. The renderer uploads a [`Mesh`] the first
//! time it sees its [`MeshId`] and keeps the buffers around from then on.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use cgmath::{InnerSpace, Vector3, Zero};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Process-unique mesh identity, used as the key for uploaded GPU buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    /// Linear RGBA multiplier. Used as the flat colour when there is no diffuse texture.
    pub base_colour: [f32; 4],
    pub diffuse: Option<Arc<image::RgbaImage>>,
}

impl Material {
    pub fn new(name: &str, base_colour: [f32; 4], diffuse: Option<image::RgbaImage>) -> Self {
        Self {
            name: name.to_string(),
            base_colour,
            diffuse: diffuse.map(Arc::new),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [0.8, 0.8, 0.8, 1.0], None)
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub id: MeshId,
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Arc<Material>,
}

impl Mesh {
    pub fn new(
        name: &str,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        material: Arc<Material>,
    ) -> Self {
        Self {
            id: MeshId::next(),
            name: name.to_string(),
            vertices,
            indices,
            material,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Fill in smooth vertex normals by accumulating the face normals of every triangle.
///
/// Indices pointing outside `vertices` are skipped.
pub fn compute_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut accumulated = vec![Vector3::<f32>::zero(); vertices.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let pa: Vector3<f32> = vertices[a].position.into();
        let pb: Vector3<f32> = vertices[b].position.into();
        let pc: Vector3<f32> = vertices[c].position.into();
        // not normalised so larger faces weigh more
        let face = (pb - pa).cross(pc - pa);
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }
    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        if normal.magnitude2() > 0.0 {
            vertex.normal = normal.normalize().into();
        }
    }
}
