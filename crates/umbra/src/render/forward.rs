//! # Forward: The Lit Camera Pass
//!
//! Draws the scene from the camera into the swapchain image, after every
//! shadow pass has finished.
//!
//! ## Bind Groups
//!
//! ```text
//! object program                      lamp program
//! group 0  frame:  camera, lights     group 0  frame
//! group 1  material:                  group 1  model (dynamic)
//!          0 diffuse texture
//!          1 diffuse sampler
//!          2 shadow maps (2D array, layer i = light i)
//!          3 comparison sampler
//! group 2  model (dynamic)
//! ```
//!
//! The lights uniform and the shadow array share one index: entry `i` of the
//! light array carries the matrix that rendered layer `i`. The shader loops
//! over both with the same counter.
//!
//! ## Draw Order
//!
//! 1. Cube (own texture), floor (own texture): lit, shadowed.
//! 2. One marker per light: unlit, no shadow lookup.
//! 3. Skybox, if enabled: depth `LessEqual`, drawn at the far plane.

use std::path::Path;

use glam::Mat4;

use super::gpu::GpuContext;
use super::mesh::{MeshKind, Meshes};
use super::pipeline::{self, DepthBuffer, FrameBindings, ModelBuffer};
use super::shadow::{ShadowMaps, mesh_of};
use super::skybox::SkyboxRenderer;
use super::texture::{self, GpuTexture};
use super::vertex::{CameraUniform, LightsUniform, MeshVertex, PositionVertex};
use crate::camera::FlyCamera;
use crate::scene::{Light, MATERIAL_SHININESS, NUMBER_OF_LIGHTS, SceneObject};

/// Background color of the lit pass.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.15,
    g: 0.15,
    b: 0.15,
    a: 1.0,
};

/// Binding slots of the material group. The object shader declares the same.
pub(crate) const DIFFUSE_TEXTURE_BINDING: u32 = 0;
pub(crate) const DIFFUSE_SAMPLER_BINDING: u32 = 1;
pub(crate) const SHADOW_MAPS_BINDING: u32 = 2;
pub(crate) const SHADOW_SAMPLER_BINDING: u32 = 3;

/// Layout entries of the material group, in binding order.
pub(crate) fn material_layout_entries() -> [wgpu::BindGroupLayoutEntry; 4] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: DIFFUSE_TEXTURE_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: DIFFUSE_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: SHADOW_MAPS_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2Array,
                sample_type: wgpu::TextureSampleType::Depth,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: SHADOW_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
            count: None,
        },
    ]
}

/// The camera and light uniforms for one frame.
pub(crate) fn frame_uniforms(
    camera: &FlyCamera,
    aspect: f32,
    lights: &[Light; NUMBER_OF_LIGHTS],
    light_space: &[Mat4; NUMBER_OF_LIGHTS],
) -> (CameraUniform, LightsUniform) {
    let camera_uniform = CameraUniform::new(
        camera.projection_matrix(aspect),
        camera.view_matrix(),
        camera.position,
        MATERIAL_SHININESS,
    );
    (camera_uniform, LightsUniform::new(lights, light_space))
}

/// Lit and lamp pipelines plus the two object materials.
pub(crate) struct ForwardRenderer {
    pub object_pipeline: wgpu::RenderPipeline,
    pub lamp_pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    cube_material: wgpu::BindGroup,
    floor_material: wgpu::BindGroup,
}

/// Resources the forward pipelines are built against.
pub(crate) struct ForwardSetup<'a> {
    pub object_shader: &'a wgpu::ShaderModule,
    pub lamp_shader: &'a wgpu::ShaderModule,
    pub frame: &'a FrameBindings,
    pub models: &'a ModelBuffer,
    pub shadow_maps: &'a ShadowMaps,
    pub cube_texture: &'a Path,
    pub floor_texture: &'a Path,
}

impl ForwardRenderer {
    pub fn new(gpu: &GpuContext, setup: ForwardSetup<'_>) -> Self {
        let device = &gpu.device;

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material layout"),
            entries: &material_layout_entries(),
        });

        // Repeat so the floor's 0..10 UVs tile.
        let diffuse_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("diffuse sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let cube_texture = texture::load_or_white(gpu, setup.cube_texture);
        let floor_texture = texture::load_or_white(gpu, setup.floor_texture);
        let material = |label: &str, diffuse: &GpuTexture| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: DIFFUSE_TEXTURE_BINDING,
                        resource: wgpu::BindingResource::TextureView(&diffuse.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: DIFFUSE_SAMPLER_BINDING,
                        resource: wgpu::BindingResource::Sampler(&diffuse_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: SHADOW_MAPS_BINDING,
                        resource: wgpu::BindingResource::TextureView(&setup.shadow_maps.array_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: SHADOW_SAMPLER_BINDING,
                        resource: wgpu::BindingResource::Sampler(
                            &setup.shadow_maps.compare_sampler,
                        ),
                    },
                ],
            })
        };
        let cube_material = material("cube material", &cube_texture);
        let floor_material = material("floor material", &floor_texture);

        let object_pipeline = build_object_pipeline(
            gpu,
            &[&setup.frame.layout, &material_layout, &setup.models.layout],
            setup.object_shader,
        );
        let lamp_pipeline = build_lamp_pipeline(
            gpu,
            &[&setup.frame.layout, &setup.models.layout],
            setup.lamp_shader,
        );

        Self {
            object_pipeline,
            lamp_pipeline,
            material_layout,
            cube_material,
            floor_material,
        }
    }

    /// Candidate lit pipeline from a new shader module.
    pub fn rebuild_object_pipeline(
        &self,
        gpu: &GpuContext,
        frame: &FrameBindings,
        models: &ModelBuffer,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        build_object_pipeline(gpu, &[&frame.layout, &self.material_layout, &models.layout], shader)
    }

    /// Candidate lamp pipeline from a new shader module.
    pub fn rebuild_lamp_pipeline(
        &self,
        gpu: &GpuContext,
        frame: &FrameBindings,
        models: &ModelBuffer,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        build_lamp_pipeline(gpu, &[&frame.layout, &models.layout], shader)
    }

    fn material(&self, object: SceneObject) -> &wgpu::BindGroup {
        match object {
            SceneObject::Cube => &self.cube_material,
            SceneObject::Floor => &self.floor_material,
        }
    }

    /// Record the lit pass. Frame uniforms must already be written.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &DepthBuffer,
        viewport: (u32, u32),
        frame: &FrameBindings,
        models: &ModelBuffer,
        meshes: &Meshes,
        skybox: Option<&SkyboxRenderer>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("forward pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_viewport(0.0, 0.0, viewport.0 as f32, viewport.1 as f32, 0.0, 1.0);

        pass.set_pipeline(&self.object_pipeline);
        pass.set_bind_group(0, &frame.bind_group, &[]);
        for object in SceneObject::ALL {
            pass.set_bind_group(1, self.material(object), &[]);
            pass.set_bind_group(2, &models.bind_group, &[models.offset(object.model_slot())]);
            meshes.draw(mesh_of(object), &mut pass);
        }

        pass.set_pipeline(&self.lamp_pipeline);
        pass.set_bind_group(0, &frame.bind_group, &[]);
        for light in 0..NUMBER_OF_LIGHTS {
            let offset = models.offset(pipeline::marker_slot(light));
            pass.set_bind_group(1, &models.bind_group, &[offset]);
            meshes.draw(MeshKind::LightMarker, &mut pass);
        }

        if let Some(skybox) = skybox {
            skybox.draw(&mut pass, meshes);
        }
    }
}

fn build_object_pipeline(
    gpu: &GpuContext,
    layouts: &[&wgpu::BindGroupLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    build_color_pipeline(gpu, "object", layouts, shader, MeshVertex::LAYOUT)
}

fn build_lamp_pipeline(
    gpu: &GpuContext,
    layouts: &[&wgpu::BindGroupLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    build_color_pipeline(gpu, "lamp", layouts, shader, PositionVertex::LAYOUT)
}

fn build_color_pipeline(
    gpu: &GpuContext,
    name: &str,
    layouts: &[&wgpu::BindGroupLayout],
    shader: &wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
) -> wgpu::RenderPipeline {
    let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{name} pipeline layout")),
        bind_group_layouts: layouts,
        push_constant_ranges: &[],
    });

    gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{name} pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
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
        depth_stencil: Some(pipeline::depth_state(true, wgpu::CompareFunction::Less)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn material_bindings_in_contract_order() {
        let entries = material_layout_entries();
        let bindings: Vec<_> = entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, [0, 1, 2, 3]);

        match entries[SHADOW_MAPS_BINDING as usize].ty {
            wgpu::BindingType::Texture {
                view_dimension,
                sample_type,
                ..
            } => {
                assert_eq!(view_dimension, wgpu::TextureViewDimension::D2Array);
                assert_eq!(sample_type, wgpu::TextureSampleType::Depth);
            }
            other => panic!("shadow maps bound as {other:?}"),
        }
        assert!(matches!(
            entries[SHADOW_SAMPLER_BINDING as usize].ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison)
        ));
    }

    #[test]
    fn every_light_uploaded_with_its_layer_matrix() {
        let scene = Scene::default();
        let light_space = scene.light_space_matrices();
        let camera = FlyCamera::default();
        let (camera, lights) = frame_uniforms(&camera, 800.0 / 600.0, &scene.lights, &light_space);

        assert_eq!(lights.count as usize, NUMBER_OF_LIGHTS);
        let layers: Vec<_> = (0..NUMBER_OF_LIGHTS)
            .filter(|&i| lights.lights[i].light_space == light_space[i].to_cols_array_2d())
            .collect();
        assert_eq!(layers, [0, 1, 2], "light i must carry the matrix of shadow layer i");

        assert_eq!(camera.shininess, 64.0);
        assert_eq!(camera.view_pos, [0.0, 1.0, 5.0]);
    }

    #[test]
    fn clear_color_is_dark_gray() {
        let rgba = (CLEAR_COLOR.r, CLEAR_COLOR.g, CLEAR_COLOR.b, CLEAR_COLOR.a);
        assert_eq!(rgba, (0.15, 0.15, 0.15, 1.0));
    }
}
