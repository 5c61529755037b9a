use std::time::Duration;

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};
use futures::channel::oneshot;
use turntable::{
    config::SceneConfig,
    loader::{AssetLoad, LoadState, ModelLoad, ModelLoader},
    resources,
    scene::Scene,
};

use crate::common::test_utils::{
    QUAD_OBJ, approx, fixture_dir, model_node, png_bytes, triangle_glb,
    triangle_glb_with_node_fields,
};

mod common;

fn config_for(asset_root: &std::path::Path) -> SceneConfig {
    SceneConfig {
        asset_root: asset_root.to_string_lossy().into_owned(),
        ..Default::default()
    }
}

/// Poll until the load settles; background tasks need a few runtime turns.
async fn settle(loader: &ModelLoader, load: &mut ModelLoad, scene: &mut Scene) -> usize {
    let mut inserted = 0;
    for _ in 0..200 {
        if loader.poll(load, scene) {
            inserted += 1;
        }
        if !load.is_pending() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    inserted
}

#[test]
fn model_is_inserted_once_when_ready() {
    let config = SceneConfig::default();
    let loader = ModelLoader::new(&config);
    let mut scene = Scene::new();
    let (tx, rx) = oneshot::channel();
    let mut load: ModelLoad = AssetLoad::from_receiver("model.obj", rx);

    assert!(!loader.poll(&mut load, &mut scene));
    assert_eq!(load.state(), &LoadState::Pending);
    assert!(!scene.has_model());

    tx.send(Ok(model_node())).unwrap();

    assert!(loader.poll(&mut load, &mut scene));
    assert_eq!(load.state(), &LoadState::Loaded);
    assert!(scene.has_model());

    // Later frames see nothing new.
    assert!(!loader.poll(&mut load, &mut scene));
    assert!(!loader.poll(&mut load, &mut scene));
    assert_eq!(scene.get_render().len(), 1);
}

#[test]
fn inserted_model_is_scaled_and_anchored() {
    let config = SceneConfig::default();
    let loader = ModelLoader::new(&config);
    let mut scene = Scene::new();
    let (tx, rx) = oneshot::channel();
    let mut load: ModelLoad = AssetLoad::from_receiver("model.obj", rx);
    tx.send(Ok(model_node())).unwrap();

    loader.poll(&mut load, &mut scene);

    let local = scene.model().unwrap().get_local_transform();
    assert_eq!(local.position, Vector3::new(0.0, 10.0, 10.0));
    assert_eq!(local.scale, Vector3::new(0.5, 0.5, 0.5));
}

#[test]
fn failed_load_leaves_the_scene_empty() {
    let loader = ModelLoader::new(&SceneConfig::default());
    let mut scene = Scene::new();
    let (tx, rx) = oneshot::channel();
    let mut load: ModelLoad = AssetLoad::from_receiver("model.obj", rx);

    tx.send(Err(anyhow::anyhow!("404 Not Found"))).unwrap();

    assert!(!loader.poll(&mut load, &mut scene));
    match load.state() {
        LoadState::Failed(reason) => assert!(reason.contains("404"), "reason: {}", reason),
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(!scene.has_model());
    assert!(!loader.poll(&mut load, &mut scene));
}

#[test]
fn dropped_sender_counts_as_failure() {
    let loader = ModelLoader::new(&SceneConfig::default());
    let mut scene = Scene::new();
    let (tx, rx) = oneshot::channel();
    let mut load: ModelLoad = AssetLoad::from_receiver("model.obj", rx);

    drop(tx);

    assert!(!loader.poll(&mut load, &mut scene));
    assert!(matches!(load.state(), LoadState::Failed(_)));
}

#[test]
fn cancelled_load_ignores_late_results() {
    let loader = ModelLoader::new(&SceneConfig::default());
    let mut scene = Scene::new();
    let (tx, rx) = oneshot::channel();
    let mut load: ModelLoad = AssetLoad::from_receiver("model.obj", rx);

    load.cancel();
    assert_eq!(load.state(), &LoadState::Cancelled);

    // The receiver is gone, so the sender notices.
    assert!(tx.send(Ok(model_node())).is_err());
    assert!(!loader.poll(&mut load, &mut scene));
    assert!(!scene.has_model());
    assert_eq!(load.state(), &LoadState::Cancelled);
}

#[test]
fn cancel_after_completion_keeps_the_state() {
    let (tx, rx) = oneshot::channel::<anyhow::Result<u32>>();
    let mut load = AssetLoad::from_receiver("number", rx);
    tx.send(Ok(7)).unwrap();

    assert_eq!(load.poll(), Some(7));
    load.cancel();

    assert_eq!(load.state(), &LoadState::Loaded);
}

#[tokio::test]
async fn spawned_load_can_be_aborted() {
    let mut load = AssetLoad::spawn("never", async {
        futures::future::pending::<anyhow::Result<u32>>().await
    });
    assert!(load.is_pending());

    load.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(load.poll(), None);
    assert_eq!(load.state(), &LoadState::Cancelled);
}

#[tokio::test]
async fn missing_model_file_fails() {
    let dir = fixture_dir("missing-model");
    let loader = ModelLoader::new(&config_for(&dir));
    let mut scene = Scene::new();

    let mut load = loader.add_model("does-not-exist.obj");
    let inserted = settle(&loader, &mut load, &mut scene).await;

    assert_eq!(inserted, 0);
    assert!(matches!(load.state(), LoadState::Failed(_)));
    assert!(!scene.has_model());
}

#[tokio::test]
async fn obj_model_loads_into_the_scene() {
    let dir = fixture_dir("obj-model");
    std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();
    let loader = ModelLoader::new(&config_for(&dir));
    let mut scene = Scene::new();

    let mut load = loader.add_model("quad.obj");
    let inserted = settle(&loader, &mut load, &mut scene).await;

    assert_eq!(inserted, 1);
    assert_eq!(load.state(), &LoadState::Loaded);
    let draws = scene.get_render();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].mesh.triangle_count(), 2);
}

#[tokio::test]
async fn obj_without_normals_gets_face_normals() {
    let dir = fixture_dir("obj-normals");
    std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();

    let model = resources::load_model(&dir.to_string_lossy(), "quad.obj")
        .await
        .unwrap();

    let mesh = model.get_mesh().expect("a single mesh is returned as the root");
    for vertex in &mesh.vertices {
        assert!(approx(vertex.normal[2], 1.0), "normal {:?}", vertex.normal);
    }
    // v is flipped for wgpu's top-left texture origin
    assert!(mesh.vertices.iter().any(|v| v.tex_coords == [0.0, 1.0]));
}

#[tokio::test]
async fn glb_model_loads() {
    let dir = fixture_dir("glb-model");
    std::fs::write(dir.join("tri.glb"), triangle_glb()).unwrap();

    let model = resources::load_model(&dir.to_string_lossy(), "tri.glb")
        .await
        .unwrap();

    let draws = model.get_render(&Matrix4::identity());
    assert_eq!(draws.len(), 1);
    let mesh = draws[0].mesh;
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.vertices.len(), 3);
    assert!(approx(mesh.vertices[0].normal[2], 1.0));
    assert_eq!(mesh.material.base_colour, [0.8, 0.8, 0.8, 1.0]);
}

#[tokio::test]
async fn gltf_root_transform_survives_placement() {
    let dir = fixture_dir("glb-root-transform");
    let glb = triangle_glb_with_node_fields(r#""translation": [4.0, 0.0, 0.0], "scale": [2.0, 2.0, 2.0]"#);
    std::fs::write(dir.join("tri.glb"), glb).unwrap();
    let loader = ModelLoader::new(&SceneConfig::default());
    let mut scene = Scene::new();

    let mut model = resources::load_model(&dir.to_string_lossy(), "tri.glb")
        .await
        .unwrap();
    loader.place(model.as_mut());

    // The authored node sits below a container that takes the placement.
    assert!(model.get_mesh().is_none());
    assert_eq!(model.get_name(), "tri.glb");
    assert_eq!(model.get_children().len(), 1);
    let authored = model.get_children()[0].get_local_transform();
    assert_eq!(authored.position, Vector3::new(4.0, 0.0, 0.0));
    assert_eq!(authored.scale, Vector3::new(2.0, 2.0, 2.0));

    scene.add_model(model);
    let draws = scene.get_render();
    assert_eq!(draws.len(), 1);
    let origin = draws[0].world * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert!(approx(origin.x, 2.0), "origin {:?}", origin);
    assert!(approx(origin.y, 10.0), "origin {:?}", origin);
    assert!(approx(origin.z, 10.0), "origin {:?}", origin);
    assert!(approx(draws[0].world.x.x, 1.0));
}

#[tokio::test]
async fn obj_material_library_is_applied() {
    let dir = fixture_dir("obj-mtl");
    let obj = QUAD_OBJ.replacen("o Quad\n", "mtllib quad.mtl\no Quad\nusemtl Red\n", 1);
    std::fs::write(dir.join("quad.obj"), obj).unwrap();
    std::fs::write(dir.join("quad.mtl"), "newmtl Red\nKd 1.0 0.0 0.0\nd 0.5\nmap_Kd tex.png\n").unwrap();
    std::fs::write(dir.join("tex.png"), png_bytes(2, 2)).unwrap();

    let model = resources::load_model(&dir.to_string_lossy(), "quad.obj")
        .await
        .unwrap();

    let mesh = model.get_mesh().expect("a single mesh is returned as the root");
    assert_eq!(mesh.material.name, "Red");
    assert_eq!(mesh.material.base_colour, [1.0, 0.0, 0.0, 0.5]);
    let diffuse = mesh.material.diffuse.as_ref().expect("diffuse texture");
    assert_eq!(diffuse.dimensions(), (2, 2));
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let dir = fixture_dir("fbx-model");
    std::fs::write(dir.join("model.fbx"), b"not a model").unwrap();

    let error = resources::load_model(&dir.to_string_lossy(), "model.fbx")
        .await
        .err()
        .expect("fbx should be rejected");

    assert!(error.to_string().contains("Unsupported model format"));
}

#[tokio::test]
async fn background_image_loads() {
    let dir = fixture_dir("background");
    std::fs::write(dir.join("bg.png"), png_bytes(4, 3)).unwrap();
    let loader = ModelLoader::new(&config_for(&dir));

    let mut load = loader.add_background("bg.png");
    let mut image = None;
    for _ in 0..200 {
        image = load.poll();
        if !load.is_pending() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let image = image.expect("background did not arrive");
    assert_eq!(image.dimensions(), (4, 3));
    assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
}
