use std::time::Duration;

use futures::channel::oneshot;
use turntable::{
    Bootstrap,
    camera::Viewport,
    config::SceneConfig,
    loader::{AssetLoad, LoadState},
};

use crate::common::test_utils::{RecordingRenderer, approx, fixture_dir, model_node, png_bytes};

mod common;

#[test]
fn invalid_configuration_is_rejected_before_loading() {
    let config = SceneConfig {
        znear: 0.0,
        ..Default::default()
    };
    let mut started = false;

    let result = Bootstrap::init_with(config, Viewport::new(800, 600), |_, _| {
        started = true;
        let (_tx, rx) = oneshot::channel();
        (AssetLoad::from_receiver("model.obj", rx), None)
    });

    assert!(result.is_err());
    assert!(!started);
}

#[test]
fn frames_draw_before_and_after_the_model_arrives() {
    let (tx, rx) = oneshot::channel();
    let mut ctx = Bootstrap::init_with(
        SceneConfig::default(),
        Viewport::new(800, 600),
        |_, config| (AssetLoad::from_receiver(&config.model, rx), None),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::new();

    assert_eq!(ctx.scene.lights().len(), 3);
    assert_eq!(ctx.model_state(), &LoadState::Pending);
    assert!(ctx.background_state().is_none());

    ctx.frame(&mut renderer, 0.0).unwrap();
    ctx.frame(&mut renderer, 16.0).unwrap();
    assert!(renderer.frames.iter().all(|frame| !frame.has_model));

    tx.send(Ok(model_node())).unwrap();
    ctx.frame(&mut renderer, 2000.0).unwrap();

    assert_eq!(renderer.draw_count(), 3);
    let last = renderer.last();
    assert!(last.has_model);
    assert_eq!(last.batches, 1);
    let rotation = last.rotation.expect("rotation of the loaded model");
    assert!(approx(rotation.x.0, 1.0));
    assert!(approx(rotation.y.0, 2.0));
    assert_eq!(ctx.model_state(), &LoadState::Loaded);
}

#[test]
fn cancel_stops_waiting_for_the_model() {
    let (tx, rx) = oneshot::channel();
    let mut ctx = Bootstrap::init_with(
        SceneConfig::default(),
        Viewport::new(800, 600),
        |_, _| (AssetLoad::from_receiver("model.obj", rx), None),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::new();

    ctx.cancel_loads();
    let _ = tx.send(Ok(model_node()));
    ctx.frame(&mut renderer, 500.0).unwrap();

    assert_eq!(ctx.model_state(), &LoadState::Cancelled);
    assert!(!renderer.last().has_model);
}

#[tokio::test]
async fn missing_assets_keep_the_loop_running() {
    let dir = fixture_dir("bootstrap-missing");
    let config = SceneConfig {
        asset_root: dir.to_string_lossy().into_owned(),
        ..Default::default()
    };
    let mut ctx = Bootstrap::init(config, Viewport::new(1024, 768)).unwrap();
    let mut renderer = RecordingRenderer::new();

    let mut time = 0.0;
    while ctx.model_state() == &LoadState::Pending && time < 5000.0 {
        ctx.frame(&mut renderer, time).unwrap();
        time += 16.0;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    ctx.frame(&mut renderer, time).unwrap();

    assert!(matches!(ctx.model_state(), LoadState::Failed(_)));
    assert!(renderer.frames.iter().all(|frame| !frame.has_model));
    assert!(renderer.frames.iter().all(|frame| frame.lights == 3));
    assert!(!ctx.scene.has_model());
}

#[tokio::test]
async fn default_assets_load_end_to_end() {
    let dir = fixture_dir("bootstrap-assets");
    std::fs::write(dir.join("model.obj"), crate::common::test_utils::QUAD_OBJ).unwrap();
    std::fs::write(dir.join("background.png"), png_bytes(8, 8)).unwrap();
    let config = SceneConfig {
        asset_root: dir.to_string_lossy().into_owned(),
        ..Default::default()
    };
    let mut ctx = Bootstrap::init(config, Viewport::new(1024, 768)).unwrap();
    let mut renderer = RecordingRenderer::new();

    for step in 0..300 {
        ctx.frame(&mut renderer, step as f64 * 16.0).unwrap();
        let background_done = ctx.background_state() != Some(&LoadState::Pending);
        if ctx.model_state() != &LoadState::Pending && background_done {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    ctx.frame(&mut renderer, 10_000.0).unwrap();

    assert_eq!(ctx.model_state(), &LoadState::Loaded);
    assert_eq!(ctx.background_state(), Some(&LoadState::Loaded));
    let last = renderer.last();
    assert!(last.has_model);
    assert!(last.has_background_image);
    assert!(approx(last.rotation.unwrap().x.0, 5.0));
}
