//! Application event loop.
//!
//! Owns the window and drives one [`SceneContext::frame`] per redraw. The
//! lifecycle is:
//! 1. `resumed` creates the window, the GPU context and the renderer
//! 2. [`Bootstrap::init`] builds the scene, camera and lights and starts the loads
//! 3. every `RedrawRequested` picks up finished loads, spins the model and draws,
//!    then schedules the next redraw
//!
//! On the web, GPU setup is asynchronous and its result comes back through a
//! user event.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    bootstrap::{Bootstrap, SceneContext},
    config::SceneConfig,
    context::Context,
    gpu_renderer::WgpuRenderer,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) struct Running {
    renderer: WgpuRenderer,
    scene: SceneContext,
}

impl Running {
    async fn start(window: Arc<Window>, config: SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let viewport = ctx.viewport();
        let renderer = WgpuRenderer::new(ctx, config.clear_colour);
        // Natively the loads are spawned onto the runtime this future is blocked on.
        let scene = Bootstrap::init(config, viewport)?;
        Ok(Self { renderer, scene })
    }

    fn redraw(&mut self) {
        let time_ms = self.scene.elapsed_ms();
        match self.scene.frame(&mut self.renderer, time_ms) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.renderer.context().viewport();
                self.renderer.resize(size.width, size.height);
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
        self.renderer.request_redraw();
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<Running>),
    #[allow(dead_code)]
    Failed(String),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    // Taken once the window exists.
    config: Option<SceneConfig>,
    state: Option<Running>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config: Some(config),
            state: None,
        })
    }

    fn start_rendering(&mut self, mut running: Running) {
        let size = running.renderer.context().viewport();
        running.renderer.resize(size.width, size.height);
        running.scene.restart_clock();
        running.renderer.request_redraw();
        self.state = Some(running);
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            // Already initialised, e.g. resumed again on mobile.
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&config.window_title);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Running::start(window, config)) {
                Ok(running) => self.start_rendering(running),
                Err(e) => {
                    log::error!("Start-up failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match Running::start(window, config).await {
                    Ok(running) => FlowEvent::Initialized(Box::new(running)),
                    Err(e) => FlowEvent::Failed(format!("{:#}", e)),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before start-up finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(running) => self.start_rendering(*running),
            FlowEvent::Failed(reason) => {
                log::error!("Start-up failed: {}", reason);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                state.scene.cancel_loads();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.renderer.resize(size.width, size.height),
            WindowEvent::RedrawRequested => state.redraw(),
            _ => {}
        }
    }
}

/// Open a window and spin `config.model` until the window is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    config.validate()?;

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
