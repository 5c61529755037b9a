use std::{convert::Infallible, path::PathBuf, sync::Arc};

use cgmath::{Euler, Rad};
use turntable::{
    Renderer,
    camera::PerspectiveCamera,
    data_structures::{
        model::{Material, Mesh, ModelVertex},
        scene_graph::{ModelNode, SceneNode},
    },
    render::batch,
    scene::Scene,
};

/// What the renderer saw on one `draw` call.
#[derive(Clone, Debug)]
pub struct Frame {
    pub has_model: bool,
    pub rotation: Option<Euler<Rad<f32>>>,
    pub lights: usize,
    pub batches: usize,
    pub has_background_image: bool,
}

/// Renderer double that records every frame instead of drawing it.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Frame>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_count(&self) -> usize {
        self.frames.len()
    }

    pub fn last(&self) -> &Frame {
        self.frames.last().expect("no frame was drawn")
    }
}

impl Renderer for RecordingRenderer {
    type Error = Infallible;

    fn draw(&mut self, scene: &Scene, _camera: &PerspectiveCamera) -> Result<(), Self::Error> {
        self.frames.push(Frame {
            has_model: scene.has_model(),
            rotation: scene.model().map(|m| m.get_local_transform().rotation),
            lights: scene.lights().len(),
            batches: batch(scene.get_render()).len(),
            has_background_image: scene
                .background()
                .is_some_and(|background| background.image.is_some()),
        });
        Ok(())
    }
}

/// Renderer double whose every draw fails.
#[derive(Debug, Default)]
pub struct FailingRenderer {
    pub attempts: usize,
}

impl Renderer for FailingRenderer {
    type Error = String;

    fn draw(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) -> Result<(), Self::Error> {
        self.attempts += 1;
        Err("surface lost".to_string())
    }
}

pub fn triangle_mesh(name: &str) -> Mesh {
    let vertex = |position: [f32; 3]| ModelVertex {
        position,
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    };
    Mesh::new(
        name,
        vec![
            vertex([0.0, 0.0, 0.0]),
            vertex([1.0, 0.0, 0.0]),
            vertex([0.0, 1.0, 0.0]),
        ],
        vec![0, 1, 2],
        Arc::new(Material::default()),
    )
}

pub fn model_node() -> Box<dyn SceneNode> {
    Box::new(ModelNode::new(triangle_mesh("triangle")))
}

/// Fresh, empty directory under the system temp dir for asset fixtures.
pub fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("turntable-{}-{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("failed to clear fixture dir");
    }
    std::fs::create_dir_all(&dir).expect("failed to create fixture dir");
    dir
}

/// A unit quad in the z = 0 plane without normals or materials.
pub const QUAD_OBJ: &str = "\
o Quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";

/// A binary glTF holding one triangle in the z = 0 plane, no normals, no material.
pub fn triangle_glb() -> Vec<u8> {
    triangle_glb_with_node_fields("")
}

/// Same as [`triangle_glb`], with `node_fields` (e.g. `"translation": [1, 0, 0]`)
/// added to the single root node.
pub fn triangle_glb_with_node_fields(node_fields: &str) -> Vec<u8> {
    let node_fields = if node_fields.is_empty() {
        String::new()
    } else {
        format!(", {}", node_fields)
    };
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let indices: [u32; 3] = [0, 1, 2];

    let mut bin: Vec<u8> = Vec::new();
    for position in positions {
        for component in position {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    for index in indices {
        bin.extend_from_slice(&index.to_le_bytes());
    }

    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "tri", "mesh": 0{node_fields} }}],
  "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
  "buffers": [{{ "byteLength": {len} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
        len = bin.len(),
        node_fields = node_fields
    );

    let mut json = json.into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}

/// A small solid colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("failed to encode png");
    bytes.into_inner()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
