use std::sync::Arc;

use anyhow::bail;

use crate::data_structures::model::{self, Material, Mesh, ModelVertex};

/// Convert one triangulated, single-indexed OBJ model into a [`Mesh`].
///
/// OBJ files frequently omit normals; those are recomputed from the faces.
pub fn obj_to_mesh(obj: &tobj::Model, materials: &[Arc<Material>]) -> anyhow::Result<Mesh> {
    let mesh = &obj.mesh;
    if mesh.positions.len() % 3 != 0 {
        bail!("mesh {} has a truncated position array", obj.name);
    }
    let vertex_count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == vertex_count * 3;
    let has_tex_coords = mesh.texcoords.len() == vertex_count * 2;

    let mut vertices = (0..vertex_count)
        .map(|i| ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            // OBJ puts the texture origin bottom left, wgpu top left
            tex_coords: if has_tex_coords {
                [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            },
            normal: if has_normals {
                [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ]
            } else {
                [0.0, 0.0, 0.0]
            },
        })
        .collect::<Vec<_>>();

    if let Some(bad) = mesh.indices.iter().find(|&&idx| idx as usize >= vertex_count) {
        bail!(
            "mesh {} references vertex {} but only has {}",
            obj.name,
            bad,
            vertex_count
        );
    }
    if !has_normals {
        model::compute_normals(&mut vertices, &mesh.indices);
    }

    let material = mesh
        .material_id
        .and_then(|id| materials.get(id))
        .cloned()
        .unwrap_or_else(|| Arc::new(Material::default()));

    Ok(Mesh::new(&obj.name, vertices, mesh.indices.clone(), material))
}
