//! turntable
//!
//! Loads a single 3D model, lights it and spins it in front of a static
//! background image. Runs natively and in the browser (WASM + WebGL). The
//! scene state is plain CPU data driven one frame at a time, with the GPU
//! hidden behind the [`render::Renderer`] trait, so everything except the
//! final draw can be exercised without a window.
//!
//! High-level modules
//! - `config`: start-up parameters and their validation
//! - `camera`: perspective camera, projection and the camera uniform
//! - `data_structures`: meshes, materials, lights, transforms and the scene graph
//! - `scene`: the scene container and the builder that sets up camera and lights
//! - `resources`: fetching and decoding images, OBJ and glTF models
//! - `loader`: background asset loads and the model loader
//! - `animation`: the per-frame rotation step
//! - `bootstrap`: start-up sequencing and the owning [`bootstrap::SceneContext`]
//! - `render`: the renderer contract and draw batching
//! - `context`, `pipelines`, `gpu_renderer`: the wgpu backend
//! - `flow`: the winit event loop
//!

pub mod animation;
pub mod bootstrap;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod gpu_renderer;
pub mod loader;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use bootstrap::{Bootstrap, SceneContext};
pub use config::SceneConfig;
pub use flow::run;
pub use render::Renderer;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point. Uses the default configuration with assets served next to the page.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(SceneConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
