//! Skybox: a cubemap drawn behind everything else.
//!
//! The cube is drawn last inside the forward pass with the camera's
//! translation stripped, so it never gets closer. The vertex shader writes
//! `z = w`, which puts every fragment on the far plane; with `LessEqual` it
//! only shows where nothing else was drawn.

use super::gpu::GpuContext;
use super::mesh::{MeshKind, Meshes};
use super::pipeline::{self, uniform_entry};
use super::texture;
use super::vertex::{PositionVertex, SkyboxUniform};
use crate::camera::FlyCamera;
use crate::error::AssetError;

/// Projection times the rotation-only view.
pub(crate) fn skybox_view_proj(camera: &FlyCamera, aspect: f32) -> glam::Mat4 {
    camera.projection_matrix(aspect) * camera.rotation_only_view()
}

pub(crate) struct SkyboxRenderer {
    pub pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SkyboxRenderer {
    /// Load the six faces and build the skybox pipeline.
    ///
    /// Fails only on a wrong face count; unreadable faces turn black.
    pub fn new(
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
        faces: &[std::path::PathBuf],
    ) -> Result<Self, AssetError> {
        let device = &gpu.device;
        let cubemap = texture::assemble_cubemap(faces, device.limits().max_texture_dimension_2d)?;
        let cube_view = texture::upload_cubemap(gpu, &cubemap);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX, None),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("skybox uniform buffer"),
            size: std::mem::size_of::<SkyboxUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cube_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let pipeline = build_pipeline(gpu, &layout, shader);
        log::info!("Skybox enabled ({}x{} faces)", cubemap.size.0, cubemap.size.1);

        Ok(Self {
            pipeline,
            layout,
            uniform_buffer,
            bind_group,
        })
    }

    pub fn build_pipeline(
        &self,
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        build_pipeline(gpu, &self.layout, shader)
    }

    /// Upload this frame's skybox transform.
    pub fn write(&self, queue: &wgpu::Queue, camera: &FlyCamera, aspect: f32) {
        let uniform = SkyboxUniform {
            view_proj: skybox_view_proj(camera, aspect).to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draw inside an open forward pass, after all other geometry.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, meshes: &Meshes) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        meshes.draw(MeshKind::Skybox, pass);
    }
}

fn build_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("skybox pipeline layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("skybox pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[PositionVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: gpu.surface_format(),
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: pipeline::primitive_state(),
        depth_stencil: Some(pipeline::depth_state(false, wgpu::CompareFunction::LessEqual)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn skybox_ignores_camera_position() {
        let mut near = FlyCamera::default();
        let mut far = FlyCamera::default();
        near.position = Vec3::ZERO;
        far.position = Vec3::new(50.0, -20.0, 7.0);
        let (a, b) = (skybox_view_proj(&near, 1.5), skybox_view_proj(&far, 1.5));
        assert!(a.abs_diff_eq(b, 1e-5), "{a} vs {b}");
    }

    #[test]
    fn skybox_follows_camera_rotation() {
        let mut cam = FlyCamera::default();
        let before = skybox_view_proj(&cam, 1.0);
        cam.rotate(200.0, 0.0);
        assert!(!before.abs_diff_eq(skybox_view_proj(&cam, 1.0), 1e-3));
    }
}
