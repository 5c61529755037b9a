//! wgpu implementation of [`Renderer`].
//!
//! Meshes are uploaded lazily: the first frame a [`MeshId`] shows up in the
//! draw list its vertices, indices and material texture go to the GPU and stay
//! cached. Per-instance world matrices are rewritten every frame since the
//! model spins continuously.

use std::{collections::HashMap, iter, sync::Arc};

use wgpu::util::DeviceExt;

use crate::{
    camera::{CameraUniform, PerspectiveCamera},
    config::Colour,
    context::Context,
    data_structures::{
        model::{Mesh, MeshId},
        texture::{self, Texture},
        transform::InstanceRaw,
    },
    pipelines::{
        background::BackgroundResources,
        basic::mk_basic_pipeline,
        light::{LightResources, LightUniform},
    },
    render::{Renderer, batch},
    scene::Scene,
};

struct CameraResources {
    uniform: CameraUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
    material: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

impl GpuMesh {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        mesh: &Mesh,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let diffuse = match &mesh.material.diffuse {
            Some(img) => Texture::from_image(device, queue, img, Some(mesh.material.name.as_str())),
            None => Texture::from_colour(device, queue, mesh.material.base_colour, &mesh.material.name),
        };
        let material = texture::diffuse_bind_group(
            device,
            material_layout,
            &diffuse,
            sampler,
            &format!("{} material", mesh.name),
        );
        Self {
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
            material,
            instance_buffer: mk_instance_buffer(device, &[]),
            instance_capacity: 0,
        }
    }

    fn write_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, raw: &[InstanceRaw]) {
        if raw.len() > self.instance_capacity {
            self.instance_buffer = mk_instance_buffer(device, raw);
            self.instance_capacity = raw.len();
        } else {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(raw));
        }
    }
}

fn mk_instance_buffer(device: &wgpu::Device, raw: &[InstanceRaw]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Instance Buffer"),
        contents: bytemuck::cast_slice(raw),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

pub struct WgpuRenderer {
    ctx: Context,
    clear_colour: wgpu::Color,
    camera: CameraResources,
    light: LightResources,
    background: BackgroundResources,
    material_layout: wgpu::BindGroupLayout,
    basic: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    meshes: HashMap<MeshId, GpuMesh>,
}

impl WgpuRenderer {
    pub fn new(ctx: Context, clear_colour: Colour) -> Self {
        let camera = CameraResources::new(&ctx.device);
        let light = LightResources::new(&ctx.device, LightUniform::from_lights(&[]));
        let background = BackgroundResources::new(&ctx.device, &ctx.config);
        let material_layout = texture::diffuse_layout(&ctx.device, "material_bind_group_layout");
        let basic = mk_basic_pipeline(
            &ctx.device,
            &ctx.config,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let sampler = texture::create_default_sampler(&ctx.device);
        Self {
            ctx,
            clear_colour: clear_colour.into(),
            camera,
            light,
            background,
            material_layout,
            basic,
            sampler,
            meshes: HashMap::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    pub fn request_redraw(&self) {
        self.ctx.request_redraw();
    }
}

impl Renderer for WgpuRenderer {
    type Error = wgpu::SurfaceError;

    fn draw(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), Self::Error> {
        // Rendering requires the surface to be configured
        if !self.ctx.is_surface_configured() {
            return Ok(());
        }

        self.camera.uniform.update_view_proj(camera);
        self.ctx.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        self.light.update(&self.ctx.queue, scene.lights());

        if let Some(image) = scene.background().and_then(|b| b.image.as_ref()) {
            self.background
                .bind(&self.ctx.device, &self.ctx.queue, &self.sampler, image);
        }

        let batches = batch(scene.get_render());
        for batch in &batches {
            let mesh: &Arc<Mesh> = batch.mesh;
            let gpu = self.meshes.entry(mesh.id).or_insert_with(|| {
                log::info!(
                    "Uploading mesh {} ({} triangles)",
                    mesh.name,
                    mesh.triangle_count()
                );
                GpuMesh::new(
                    &self.ctx.device,
                    &self.ctx.queue,
                    &self.material_layout,
                    &self.sampler,
                    mesh,
                )
            });
            let raw: Vec<InstanceRaw> = batch.instances.iter().map(InstanceRaw::from_world).collect();
            gpu.write_instances(&self.ctx.device, &self.ctx.queue, &raw);
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(bind_group) = self.background.bind_group() {
                render_pass.set_pipeline(&self.background.pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_pipeline(&self.basic);
            render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.light.bind_group, &[]);
            for batch in &batches {
                let Some(gpu) = self.meshes.get(&batch.mesh.id) else {
                    continue;
                };
                if gpu.num_elements == 0 {
                    continue;
                }
                render_pass.set_bind_group(0, &gpu.material, &[]);
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.num_elements, 0, 0..batch.instances.len() as u32);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
