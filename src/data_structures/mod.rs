//! Scene data: transforms, lights, meshes, the scene graph and GPU textures.
//!
//! - `transform` holds a node's position, Euler rotation and scale, plus the raw GPU instance layout
//! - `light` contains ambient and directional light descriptions
//! - `model` contains CPU-side meshes, materials and the vertex layout
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod light;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
