use wgpu::util::DeviceExt;

use crate::data_structures::light::{Light, LightKind};

/// Directional lights beyond this count are ignored by the shader.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalRaw {
    // xyz points towards the light, w is unused (uniforms want 16 byte spacing)
    pub direction: [f32; 4],
    pub colour: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Sum of all ambient lights, premultiplied with their intensities.
    pub ambient: [f32; 4],
    /// `x` is the number of valid entries in `directional`, the rest is padding.
    pub counts: [u32; 4],
    pub directional: [DirectionalRaw; MAX_DIRECTIONAL_LIGHTS],
}

impl LightUniform {
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut ambient = [0.0f32; 4];
        let mut directional = [DirectionalRaw::default(); MAX_DIRECTIONAL_LIGHTS];
        let mut count = 0usize;
        for light in lights {
            match light.kind {
                LightKind::Ambient => {
                    let [r, g, b] = light.radiance();
                    ambient[0] += r;
                    ambient[1] += g;
                    ambient[2] += b;
                }
                LightKind::Directional => {
                    let Some(direction) = light.direction() else {
                        log::warn!("Directional light at {:?} points nowhere and is skipped", light.position);
                        continue;
                    };
                    if count == MAX_DIRECTIONAL_LIGHTS {
                        log::warn!("Only {} directional lights are supported", MAX_DIRECTIONAL_LIGHTS);
                        continue;
                    }
                    let [r, g, b] = light.radiance();
                    directional[count] = DirectionalRaw {
                        direction: direction.extend(0.0).into(),
                        colour: [r, g, b, 1.0],
                    };
                    count += 1;
                }
            }
        }
        Self {
            ambient,
            counts: [count as u32, 0, 0, 0],
            directional,
        }
    }
}

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Upload `lights` if they differ from what the GPU already has.
    pub fn update(&mut self, queue: &wgpu::Queue, lights: &[Light]) {
        let uniform = LightUniform::from_lights(lights);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("light_bind_group_layout"),
    })
}
