//! The scene and the builder that composes it.
//!
//! [`SceneBuilder`] turns a [`SceneConfig`] into the three pieces the render
//! loop needs before its first frame: a [`Scene`] with its backdrop, the
//! [`PerspectiveCamera`], and the light rig around the model anchor. The model
//! itself arrives later through [`crate::loader::ModelLoader`].

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{
    camera::{Camera, PerspectiveCamera, Projection, Viewport},
    config::SceneConfig,
    data_structures::{
        light::{Light, LightKind},
        scene_graph::SceneNode,
    },
    render::Instanced,
};

/// Backdrop drawn behind everything else. `image` stays empty until the asset has loaded.
#[derive(Clone, Debug, Default)]
pub struct Background {
    pub path: String,
    pub image: Option<Arc<image::RgbaImage>>,
}

#[derive(Debug, Default)]
pub struct Scene {
    background: Option<Background>,
    lights: Vec<Light>,
    model: Option<Box<dyn SceneNode>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_background(&mut self, path: &str) {
        self.background = Some(Background {
            path: path.to_string(),
            image: None,
        });
    }

    /// Attach decoded pixels to the configured backdrop. Ignored when no backdrop is set.
    pub fn set_background_image(&mut self, image: image::RgbaImage) {
        match &mut self.background {
            Some(background) => background.image = Some(Arc::new(image)),
            None => log::warn!("Background image arrived but the scene has no backdrop configured."),
        }
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_of(&self, kind: LightKind) -> impl Iterator<Item = &Light> {
        self.lights.iter().filter(move |light| light.kind == kind)
    }

    /// Insert the model root. A second insertion replaces the first and is logged.
    pub fn add_model(&mut self, model: Box<dyn SceneNode>) {
        if self.model.is_some() {
            log::warn!("Replacing the model that was already in the scene.");
        }
        self.model = Some(model);
    }

    pub fn model(&self) -> Option<&dyn SceneNode> {
        self.model.as_deref()
    }

    pub fn model_mut(&mut self) -> Option<&mut (dyn SceneNode + 'static)> {
        self.model.as_deref_mut()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Everything that has to be drawn this frame, with world matrices resolved.
    pub fn get_render(&self) -> Vec<Instanced<'_>> {
        match &self.model {
            Some(model) => model.get_render(&Matrix4::identity()),
            None => Vec::new(),
        }
    }
}

pub struct SceneBuilder<'a> {
    config: &'a SceneConfig,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a SceneConfig) -> Self {
        Self { config }
    }

    /// An empty scene with the configured backdrop.
    pub fn create_scene(&self) -> Scene {
        let mut scene = Scene::new();
        scene.set_background(&self.config.background);
        scene
    }

    /// Perspective camera at the configured position, looking down -z.
    pub fn configure_camera(&self, viewport: Viewport) -> PerspectiveCamera {
        // yaw -90 looks along -z, pitch 0 keeps the horizon level
        let camera = Camera::new(
            self.config.camera_position,
            cgmath::Deg(-90.0),
            cgmath::Deg(0.0),
        );
        let projection = Projection::new(
            viewport,
            self.config.fovy,
            self.config.znear,
            self.config.zfar,
        );
        log::info!(
            "Camera at {:?}, viewport {}x{}, aspect {}",
            camera.position,
            viewport.width,
            viewport.height,
            projection.aspect()
        );
        PerspectiveCamera { camera, projection }
    }

    /// Ambient light on the anchor plus one directional light in front of and one behind it.
    pub fn set_up_light(&self, mut scene: Scene) -> Scene {
        let anchor = self.config.anchor;
        let offset = Vector3::new(0.0, 0.0, self.config.fill_offset);
        let ambient = self.config.ambient;
        let directional = self.config.directional;

        scene.add_light(Light::ambient(ambient.colour, ambient.intensity, anchor));
        scene.add_light(Light::directional(
            directional.colour,
            directional.intensity,
            anchor + offset,
        ));
        scene.add_light(Light::directional(
            directional.colour,
            directional.intensity,
            anchor - offset,
        ));
        scene
    }
}
