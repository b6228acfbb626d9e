//! # Shadow: One Depth Pass per Light
//!
//! Every light renders the scene's depth from its own point of view into its
//! own depth target. The lit pass later samples all of them.
//!
//! ## Depth Targets
//!
//! The N targets are the N layers of one `Depth32Float` 2D array texture:
//!
//! ```text
//! shadow array (1024×1024×N)
//! ┌─────────┐┌─────────┐┌─────────┐
//! │ layer 0 ││ layer 1 ││ layer 2 │   ← written by shadow pass i
//! │ light 0 ││ light 1 ││ light 2 │     through a single-layer view
//! └─────────┘└─────────┘└─────────┘
//!            ▲
//!            └── bound whole (D2Array view) in the lit pass
//! ```
//!
//! A render pass that clears one single-layer view touches only that layer,
//! so pass *i* can never overwrite light *j*'s depth.
//!
//! ## Per-Frame Flow
//!
//! ```text
//! for light i in 0..N:
//!     light_space[i] = ortho(±10, 0.1..7.5) · look_at(light_pos[i], origin, +Y)
//!     begin pass: depth = layer_view[i], clear 1.0, no color attachment
//!     viewport 1024×1024
//!     bind light_space[i] (dynamic offset i·stride)
//!     for cube, floor: bind model offset, draw
//!     end pass
//! ```
//!
//! All N matrices are written to one buffer before the encoder is submitted;
//! each pass reads its own slot through the dynamic offset.

use super::gpu::GpuContext;
use super::mesh::{MeshKind, Meshes};
use super::pipeline::{self, DEPTH_FORMAT, ModelBuffer};
use super::vertex::{LightSpaceUniform, MeshVertex};
use crate::scene::{NUMBER_OF_LIGHTS, SHADOW_RESOLUTION, Scene, SceneObject};

/// Descriptor of the single-layer view that shadow pass `layer` renders into.
pub(crate) fn layer_view_descriptor(layer: usize) -> wgpu::TextureViewDescriptor<'static> {
    wgpu::TextureViewDescriptor {
        label: Some("shadow layer view"),
        dimension: Some(wgpu::TextureViewDimension::D2),
        aspect: wgpu::TextureAspect::DepthOnly,
        base_array_layer: layer as u32,
        array_layer_count: Some(1),
        ..Default::default()
    }
}

/// Dynamic offsets of each light's matrix in the light-space buffer.
pub(crate) fn light_offsets(stride: usize) -> [u32; NUMBER_OF_LIGHTS] {
    std::array::from_fn(|i| (i * stride) as u32)
}

/// The per-light depth targets and the sampler the lit pass reads them with.
pub(crate) struct ShadowMaps {
    /// One render view per light; `layer_views[i]` is light `i`'s target.
    pub layer_views: [wgpu::TextureView; NUMBER_OF_LIGHTS],
    /// Every layer, bound as `texture_depth_2d_array` in the lit pass.
    pub array_view: wgpu::TextureView,
    /// `LessEqual` comparison sampler for `textureSampleCompare`.
    pub compare_sampler: wgpu::Sampler,
}

impl ShadowMaps {
    pub fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow map array"),
            size: wgpu::Extent3d {
                width: SHADOW_RESOLUTION,
                height: SHADOW_RESOLUTION,
                depth_or_array_layers: NUMBER_OF_LIGHTS as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let layer_views = std::array::from_fn(|i| texture.create_view(&layer_view_descriptor(i)));
        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow array view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            aspect: wgpu::TextureAspect::DepthOnly,
            base_array_layer: 0,
            array_layer_count: Some(NUMBER_OF_LIGHTS as u32),
            ..Default::default()
        });

        // Outside the light frustum counts as lit: clamp to the border texel
        // of a map cleared to 1.0.
        let compare_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow compare sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        log::debug!(
            "Allocated {NUMBER_OF_LIGHTS} shadow maps at {SHADOW_RESOLUTION}x{SHADOW_RESOLUTION}"
        );

        Self {
            layer_views,
            array_view,
            compare_sampler,
        }
    }
}

/// Depth-only pipeline and the light-space uniform slots.
pub(crate) struct ShadowRenderer {
    pub pipeline: wgpu::RenderPipeline,
    light_space_layout: wgpu::BindGroupLayout,
    light_space_buffer: wgpu::Buffer,
    light_space_bind_group: wgpu::BindGroup,
    offsets: [u32; NUMBER_OF_LIGHTS],
}

impl ShadowRenderer {
    pub fn new(gpu: &GpuContext, shader: &wgpu::ShaderModule, models: &ModelBuffer) -> Self {
        let device = &gpu.device;
        let uniform_size = std::mem::size_of::<LightSpaceUniform>() as u64;

        let light_space_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("light space layout"),
            entries: &[pipeline::uniform_entry(0, wgpu::ShaderStages::VERTEX, Some(uniform_size))],
        });

        let stride = pipeline::uniform_stride::<LightSpaceUniform>(device);
        let light_space_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("light space buffer"),
            size: (stride * NUMBER_OF_LIGHTS) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_space_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light space bind group"),
            layout: &light_space_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &light_space_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(uniform_size),
                }),
            }],
        });

        let pipeline = build_pipeline(device, &light_space_layout, &models.layout, shader);

        Self {
            pipeline,
            light_space_layout,
            light_space_buffer,
            light_space_bind_group,
            offsets: light_offsets(stride),
        }
    }

    /// Build a depth pipeline from `shader` with the existing layouts. The
    /// caller decides whether to swap it in.
    pub fn build_pipeline(
        &self,
        gpu: &GpuContext,
        models: &ModelBuffer,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        build_pipeline(&gpu.device, &self.light_space_layout, &models.layout, shader)
    }

    /// Render every light's depth into its own layer. Returns the light-space
    /// matrices, in light order, for the lit pass.
    pub fn run(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        maps: &ShadowMaps,
        scene: &Scene,
        models: &ModelBuffer,
        meshes: &Meshes,
    ) -> [glam::Mat4; NUMBER_OF_LIGHTS] {
        let matrices = scene.light_space_matrices();
        for (i, matrix) in matrices.iter().enumerate() {
            let uniform = LightSpaceUniform {
                matrix: matrix.to_cols_array_2d(),
            };
            gpu.queue.write_buffer(
                &self.light_space_buffer,
                self.offsets[i] as u64,
                bytemuck::bytes_of(&uniform),
            );
        }

        for (i, target) in maps.layer_views.iter().enumerate() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let size = SHADOW_RESOLUTION as f32;
            pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.light_space_bind_group, &[self.offsets[i]]);

            for object in SceneObject::ALL {
                pass.set_bind_group(1, &models.bind_group, &[models.offset(object.model_slot())]);
                meshes.draw(mesh_of(object), &mut pass);
            }
        }

        matrices
    }
}

/// The mesh each scene object is drawn with.
pub(crate) fn mesh_of(object: SceneObject) -> MeshKind {
    match object {
        SceneObject::Cube => MeshKind::Cube,
        SceneObject::Floor => MeshKind::Floor,
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    light_space_layout: &wgpu::BindGroupLayout,
    model_layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shadow pipeline layout"),
        bind_group_layouts: &[light_space_layout, model_layout],
        push_constant_ranges: &[],
    });

    let mut depth = pipeline::depth_state(true, wgpu::CompareFunction::Less);
    // Slope-scaled bias against shadow acne on surfaces facing the light.
    depth.bias = wgpu::DepthBiasState {
        constant: 2,
        slope_scale: 2.0,
        clamp: 0.0,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadow pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: pipeline::primitive_state(),
        depth_stencil: Some(depth),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_pass_targets_only_its_own_layer() {
        for i in 0..NUMBER_OF_LIGHTS {
            let desc = layer_view_descriptor(i);
            assert_eq!(desc.base_array_layer, i as u32);
            assert_eq!(desc.array_layer_count, Some(1), "a clear must not reach other layers");
            assert_eq!(desc.dimension, Some(wgpu::TextureViewDimension::D2));
        }
    }

    #[test]
    fn one_matrix_slot_per_light_in_order() {
        let offsets = light_offsets(256);
        assert_eq!(offsets, [0, 256, 512]);
    }

    #[test]
    fn shadow_casters_are_cube_then_floor() {
        let meshes: Vec<_> = SceneObject::ALL.iter().map(|&o| mesh_of(o)).collect();
        assert_eq!(meshes, [MeshKind::Cube, MeshKind::Floor]);
    }
}
