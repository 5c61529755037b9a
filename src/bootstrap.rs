//! Start-up sequencing and the context that owns everything the render loop touches.

use instant::Instant;

use crate::{
    animation::AnimationDriver,
    camera::{PerspectiveCamera, Viewport},
    config::SceneConfig,
    loader::{LoadState, ModelLoad, ModelLoader, TextureLoad},
    render::Renderer,
    scene::{Scene, SceneBuilder},
};

/// Single owner of the scene state. Created once by [`Bootstrap::init`] and then driven
/// one frame at a time by the host loop.
#[derive(Debug)]
pub struct SceneContext {
    pub config: SceneConfig,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub driver: AnimationDriver,
    loader: ModelLoader,
    model: ModelLoad,
    background: Option<TextureLoad>,
    started: Instant,
}

impl SceneContext {
    pub fn model_state(&self) -> &LoadState {
        self.model.state()
    }

    pub fn background_state(&self) -> Option<&LoadState> {
        self.background.as_ref().map(|load| load.state())
    }

    /// Milliseconds since the render loop started.
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Restart the clock `elapsed_ms` counts from. Called when the first frame is scheduled.
    pub fn restart_clock(&mut self) {
        self.started = Instant::now();
    }

    /// Pick up finished loads, then run the animation step for `time_ms`.
    pub fn frame<R: Renderer>(&mut self, renderer: &mut R, time_ms: f64) -> Result<(), R::Error> {
        self.poll_loads();
        self.driver
            .animate(&mut self.scene, &self.camera, renderer, time_ms)
    }

    /// Returns `true` when the model was inserted during this call.
    pub fn poll_loads(&mut self) -> bool {
        if let Some(background) = &mut self.background {
            if let Some(image) = background.poll() {
                self.scene.set_background_image(image);
            }
        }
        self.loader.poll(&mut self.model, &mut self.scene)
    }

    /// Abort whatever is still loading.
    pub fn cancel_loads(&mut self) {
        self.model.cancel();
        if let Some(background) = &mut self.background {
            background.cancel();
        }
    }
}

pub struct Bootstrap;

impl Bootstrap {
    /// Build the scene, camera and lights, then start loading the model and backdrop.
    ///
    /// Loads are spawned on the platform executor; natively the caller must be inside a
    /// tokio runtime context.
    pub fn init(config: SceneConfig, viewport: Viewport) -> anyhow::Result<SceneContext> {
        Self::init_with(config, viewport, |loader, config| {
            let model = loader.add_model(&config.model);
            let background = loader.add_background(&config.background);
            (model, Some(background))
        })
    }

    /// Same sequence as [`init`](Self::init), with the loads started by `start_loads` once
    /// the scene, camera and lights exist.
    pub fn init_with<F>(
        config: SceneConfig,
        viewport: Viewport,
        start_loads: F,
    ) -> anyhow::Result<SceneContext>
    where
        F: FnOnce(&ModelLoader, &SceneConfig) -> (ModelLoad, Option<TextureLoad>),
    {
        config.validate()?;

        let builder = SceneBuilder::new(&config);
        let scene = builder.create_scene();
        let camera = builder.configure_camera(viewport);
        let scene = builder.set_up_light(scene);

        let loader = ModelLoader::new(&config);
        let (model, background) = start_loads(&loader, &config);
        log::info!(
            "Scene ready with {} lights, waiting for {}",
            scene.lights().len(),
            model.label()
        );

        let driver = AnimationDriver::new(config.spin);
        Ok(SceneContext {
            config,
            scene,
            camera,
            driver,
            loader,
            model,
            background,
            started: Instant::now(),
        })
    }
}
