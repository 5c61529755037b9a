use std::sync::Arc;

use crate::{
    data_structures::texture::{self, Texture},
    pipelines::basic::{DepthMode, mk_render_pipeline},
};

/// Full-screen backdrop. Holds the pipeline and, once the image is in, its bind group.
pub struct BackgroundResources {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    bound: Option<(Arc<image::RgbaImage>, wgpu::BindGroup)>,
}

impl BackgroundResources {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let bind_group_layout = texture::diffuse_layout(device, "background_bind_group_layout");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            &layout,
            config.format,
            Some(wgpu::BlendState::REPLACE),
            Some(DepthMode::Ignore),
            &[],
            shader,
        );
        Self {
            pipeline,
            bind_group_layout,
            bound: None,
        }
    }

    /// Make sure `image` is the one on the GPU. Uploads only when the image changed.
    pub fn bind(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        fallback_sampler: &wgpu::Sampler,
        image: &Arc<image::RgbaImage>,
    ) {
        if let Some((current, _)) = &self.bound {
            if Arc::ptr_eq(current, image) {
                return;
            }
        }
        let tex = Texture::from_image(device, queue, image, Some("background"));
        let bind_group = texture::diffuse_bind_group(
            device,
            &self.bind_group_layout,
            &tex,
            fallback_sampler,
            "background_bind_group",
        );
        log::info!("Background uploaded ({}x{})", image.width(), image.height());
        self.bound = Some((image.clone(), bind_group));
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bound.as_ref().map(|(_, group)| group)
    }
}
