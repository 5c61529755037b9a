//! Render pipelines.
//!
//! - `basic` draws lit, textured meshes and hosts the shared pipeline constructor
//! - `background` draws the full-screen backdrop image
//! - `light` packs the scene lights into the uniform the mesh shader reads

pub mod background;
pub mod basic;
pub mod light;
