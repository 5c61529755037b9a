use std::{
    io::{BufReader, Cursor},
    path::Path,
    sync::Arc,
};

use anyhow::{anyhow, bail};

use crate::data_structures::{
    model::{self, Material, Mesh, ModelVertex},
    scene_graph::{ContainerNode, ModelNode, SceneNode, count_nodes, mk_root},
    transform::Transform,
};

/**
 * This module contains all logic for loading meshes, materials and images from asset files.
 *
 * Everything produced here is CPU data; nothing requires a GPU device, so models can be
 * loaded on a background task while the render loop keeps running.
 */
pub mod mesh;
pub mod texture;

/// Load a model, picking the parser by file extension (`.obj`, `.gltf`, `.glb`).
pub async fn load_model(asset_root: &str, file_name: &str) -> anyhow::Result<Box<dyn SceneNode>> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let model = match extension.as_deref() {
        Some("obj") => load_model_obj(asset_root, file_name).await?,
        Some("gltf") | Some("glb") => load_model_gltf(asset_root, file_name).await?,
        _ => bail!("Unsupported model format: {}", file_name),
    };
    log::info!(
        "Loaded {} with {} scene nodes",
        file_name,
        count_nodes(model.as_ref())
    );
    Ok(model)
}

pub async fn load_model_obj(
    asset_root: &str,
    file_name: &str,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let obj_text = texture::load_string(asset_root, file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let root = asset_root.to_string();
    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let root = root.clone();
            async move {
                match texture::load_string(&root, &p).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("Material library {} could not be read: {}", p, e);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("Materials of {} are ignored: {}", file_name, e);
        Vec::new()
    });

    let mut materials = Vec::with_capacity(obj_materials.len());
    for m in obj_materials {
        let diffuse = match &m.diffuse_texture {
            Some(texture_file) => match texture::load_image(asset_root, texture_file).await {
                Ok(img) => Some(img),
                Err(e) => {
                    log::warn!("Diffuse texture {} of {} not loaded: {}", texture_file, m.name, e);
                    None
                }
            },
            None => None,
        };
        let [r, g, b] = m.diffuse.unwrap_or([0.8, 0.8, 0.8]);
        let alpha = m.dissolve.unwrap_or(1.0);
        materials.push(Arc::new(Material::new(&m.name, [r, g, b, alpha], diffuse)));
    }

    let nodes: Vec<Box<dyn SceneNode>> = models
        .iter()
        .enumerate()
        .filter_map(|(idx, obj)| match mesh::obj_to_mesh(obj, &materials) {
            Ok(mesh) => Some(Box::new(ModelNode::new(mesh)) as Box<dyn SceneNode>),
            Err(e) => {
                log::warn!("Mesh at index {} in file {} was skipped: {}", idx, file_name, e);
                None
            }
        })
        .collect();

    if nodes.is_empty() {
        bail!("{} contains no usable meshes", file_name);
    }
    Ok(mk_root(file_name, nodes))
}

pub async fn load_model_gltf(
    asset_root: &str,
    file_name: &str,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_bytes = texture::load_binary(asset_root, file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("{} references a binary chunk it does not have", file_name))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                bail!("{}: embedded data URIs are not supported, use .glb or external buffers", file_name)
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(texture::load_binary(asset_root, uri).await?);
            }
        }
    }

    // Load materials
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material.name().unwrap_or("gltf material");
        let diffuse = match pbr.base_color_texture().map(|info| info.texture().source().source()) {
            Some(gltf::image::Source::View { view, mime_type }) => {
                let start = view.offset();
                let end = start + view.length();
                buffer_data
                    .get(view.buffer().index())
                    .and_then(|data| data.get(start..end))
                    .ok_or_else(|| anyhow!("image view of {} is out of bounds", name))
                    .and_then(|bytes| texture::decode_image(bytes, Some(mime_type)))
                    .map_err(|e| log::warn!("Base colour texture of {} not loaded: {}", name, e))
                    .ok()
            }
            Some(gltf::image::Source::Uri { uri, mime_type }) => {
                match texture::load_binary(asset_root, uri).await {
                    Ok(bytes) => texture::decode_image(&bytes, mime_type)
                        .map_err(|e| log::warn!("Base colour texture {} not decoded: {}", uri, e))
                        .ok(),
                    Err(e) => {
                        log::warn!("Base colour texture {} not loaded: {}", uri, e);
                        None
                    }
                }
            }
            None => None,
        };
        materials.push(Arc::new(Material::new(name, pbr.base_color_factor(), diffuse)));
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("{} contains no scene", file_name))?;

    let mut models = Vec::new();
    for node in scene.nodes() {
        models.push(to_scene_node(node, &buffer_data, &materials)?);
    }
    if models.is_empty() {
        bail!("{} has an empty scene", file_name);
    }

    Ok(mk_root(file_name, models))
}

fn to_scene_node(
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    materials: &[Arc<Material>],
) -> anyhow::Result<Box<dyn SceneNode>> {
    let name = node.name().unwrap_or("node");
    let mut meshes: Vec<Box<dyn SceneNode>> = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Primitive {} of {:?} uses {:?} and is skipped, only triangles are drawn",
                    primitive.index(),
                    mesh.name(),
                    primitive.mode()
                );
                continue;
            }
            let mesh = read_primitive(&mesh, &primitive, buffers, materials)?;
            meshes.push(Box::new(ModelNode::new(mesh)));
        }
    }

    let mut scene_node: Box<dyn SceneNode> = match meshes.pop() {
        Some(only) if meshes.is_empty() => only,
        Some(last) => {
            meshes.push(last);
            Box::new(ContainerNode::new(name, meshes))
        }
        None => Box::new(ContainerNode::new(name, Vec::new())),
    };
    let (translation, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Transform::from_decomposed(translation, rotation, scale));

    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, materials)?);
    }
    Ok(scene_node)
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    materials: &[Arc<Material>],
) -> anyhow::Result<Mesh> {
    let name = mesh.name().unwrap_or("unknown_mesh");
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = reader
        .read_positions()
        .ok_or_else(|| anyhow!("primitive of {} has no positions", name))?
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    let mut has_normals = false;
    if let Some(normals) = reader.read_normals() {
        let normals: Vec<[f32; 3]> = normals.collect();
        if normals.len() == vertices.len() {
            vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(vertex, normal)| vertex.normal = normal);
            has_normals = true;
        }
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
        vertices
            .iter_mut()
            .zip(tex_coords)
            .for_each(|(vertex, tex_coord)| vertex.tex_coords = tex_coord);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if let Some(bad) = indices.iter().find(|&&idx| idx as usize >= vertices.len()) {
        bail!("primitive of {} references missing vertex {}", name, bad);
    }
    if !has_normals {
        model::compute_normals(&mut vertices, &indices);
    }

    let material = primitive
        .material()
        .index()
        .and_then(|idx| materials.get(idx))
        .cloned()
        .unwrap_or_else(|| Arc::new(Material::default()));

    Ok(Mesh::new(name, vertices, indices, material))
}
