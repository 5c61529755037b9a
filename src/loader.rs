//! Asynchronous asset loads and the model loader built on top of them.
//!
//! A load runs as a detached task (a tokio task natively, `spawn_local` on the
//! web) and hands its result back through a oneshot channel. Nothing is ever
//! shared with the task: the render loop calls [`AssetLoad::poll`] once per
//! frame, which is the only point where the result crosses over. That keeps
//! the "is the model there yet?" check a plain presence test on the render
//! thread.

use cgmath::Point3;
use futures::{
    channel::oneshot,
    future::{AbortHandle, Aborted, abortable},
};

use crate::{
    config::SceneConfig,
    data_structures::{scene_graph::SceneNode, transform::Transform},
    resources,
    scene::Scene,
};

#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Loaded,
    Failed(String),
    Cancelled,
}

/// Handle to an asset that is being loaded in the background.
///
/// The value is handed out exactly once by [`poll`](Self::poll); afterwards the
/// state stays `Loaded`.
pub struct AssetLoad<T> {
    label: String,
    state: LoadState,
    receiver: Option<oneshot::Receiver<anyhow::Result<T>>>,
    abort: Option<AbortHandle>,
}

impl<T> std::fmt::Debug for AssetLoad<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoad")
            .field("label", &self.label)
            .field("state", &self.state)
            .finish()
    }
}

impl<T: MaybeSend + 'static> AssetLoad<T> {
    /// Start `load` on the platform executor.
    ///
    /// Natively this must be called from within a tokio runtime context.
    pub fn spawn<F>(label: &str, load: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + MaybeSend + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let (load, abort) = abortable(load);
        let task_label = label.to_string();
        spawn_detached(async move {
            match load.await {
                Ok(result) => {
                    if tx.send(result).is_err() {
                        log::warn!("{} finished after its handle was dropped", task_label);
                    }
                }
                Err(Aborted) => log::info!("{} was cancelled", task_label),
            }
        });
        Self {
            label: label.to_string(),
            state: LoadState::Pending,
            receiver: Some(rx),
            abort: Some(abort),
        }
    }
}

impl<T> AssetLoad<T> {
    /// Wrap a receiver whose sender is driven elsewhere. Such a load cannot abort a task,
    /// cancelling only stops listening.
    pub fn from_receiver(label: &str, receiver: oneshot::Receiver<anyhow::Result<T>>) -> Self {
        Self {
            label: label.to_string(),
            state: LoadState::Pending,
            receiver: Some(receiver),
            abort: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == LoadState::Pending
    }

    pub fn cancel(&mut self) {
        if !self.is_pending() {
            return;
        }
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
        self.receiver = None;
        self.state = LoadState::Cancelled;
    }

    /// Non-blocking check for the result. Returns the value on the one call that observes
    /// a successful completion and `None` on every other call.
    pub fn poll(&mut self) -> Option<T> {
        let receiver = self.receiver.as_mut()?;
        let outcome = match receiver.try_recv() {
            Ok(None) => return None,
            Ok(Some(outcome)) => outcome,
            Err(oneshot::Canceled) => Err(anyhow::anyhow!("loader task ended without a result")),
        };
        self.receiver = None;
        self.abort = None;
        match outcome {
            Ok(value) => {
                self.state = LoadState::Loaded;
                Some(value)
            }
            Err(e) => {
                log::error!("Failed to load {}: {:#}", self.label, e);
                self.state = LoadState::Failed(format!("{:#}", e));
                None
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_detached<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(task);
}

#[cfg(target_arch = "wasm32")]
fn spawn_detached<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

pub type ModelLoad = AssetLoad<Box<dyn SceneNode>>;

pub type TextureLoad = AssetLoad<image::RgbaImage>;

/// Loads the model and places it in the scene once it arrives.
#[derive(Clone, Debug)]
pub struct ModelLoader {
    asset_root: String,
    scale: f32,
    anchor: Point3<f32>,
}

impl ModelLoader {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            asset_root: config.asset_root.clone(),
            scale: config.model_scale,
            anchor: config.anchor,
        }
    }

    /// Kick off a single, non-blocking attempt to load `asset_path`.
    pub fn add_model(&self, asset_path: &str) -> ModelLoad {
        log::info!("Loading model {}", asset_path);
        let root = self.asset_root.clone();
        let path = asset_path.to_string();
        AssetLoad::spawn(asset_path, async move {
            resources::load_model(&root, &path).await
        })
    }

    /// Kick off the backdrop image load.
    pub fn add_background(&self, asset_path: &str) -> TextureLoad {
        log::info!("Loading background {}", asset_path);
        let root = self.asset_root.clone();
        let path = asset_path.to_string();
        AssetLoad::spawn(asset_path, async move {
            resources::texture::load_image(&root, &path).await
        })
    }

    /// Scale and position a freshly loaded root node.
    pub fn place(&self, model: &mut dyn SceneNode) {
        let (scale, anchor) = (self.scale, self.anchor);
        model.set_local_transform_with(&mut |transform: &mut Transform| {
            transform.set_uniform_scale(scale);
            transform.position = cgmath::Vector3::new(anchor.x, anchor.y, anchor.z);
        });
    }

    /// Move a completed load into `scene`. Returns `true` on the one call that inserts the model.
    pub fn poll(&self, load: &mut ModelLoad, scene: &mut Scene) -> bool {
        match load.poll() {
            Some(mut model) => {
                self.place(model.as_mut());
                log::info!("Model {} ({}) added to the scene", load.label(), model.get_name());
                scene.add_model(model);
                true
            }
            None => false,
        }
    }
}
