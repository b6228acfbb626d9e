//! # Pipeline: Shared GPU Resources
//!
//! Resources used by more than one pass live here:
//!
//! - **Window depth buffer**: `Depth32Float`, recreated when the surface size
//!   changes. Shadow maps use the same format but are owned by
//!   [`ShadowMaps`](super::shadow::ShadowMaps).
//! - **Frame bindings** (group 0 of the lit and lamp programs): the camera
//!   uniform and the light array, written once per frame.
//! - **Model buffer**: one dynamic-offset uniform buffer holding every model
//!   matrix in the scene. Each draw binds it at its object's offset.
//!
//! ```text
//! model buffer (stride = align_up(128, min_uniform_buffer_offset_alignment))
//! ┌──────┬───────┬──────────┬──────────┬──────────┐
//! │ cube │ floor │ marker 0 │ marker 1 │ marker 2 │
//! └──────┴───────┴──────────┴──────────┴──────────┘
//!   slot 0  slot 1  slot 2..
//! ```
//!
//! The scene never changes, so the model buffer is written once at init.

use wgpu::util::DeviceExt;

use super::gpu::GpuContext;
use super::vertex::{CameraUniform, LightsUniform, ModelUniform};
use crate::scene::{NUMBER_OF_LIGHTS, Scene, SceneObject};

/// Depth format of the window depth buffer and of the shadow maps.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Number of model matrices: the static objects plus one per light marker.
pub(crate) const MODEL_SLOTS: usize = SceneObject::ALL.len() + NUMBER_OF_LIGHTS;

/// Model buffer slot of light `i`'s marker.
pub(crate) fn marker_slot(light: usize) -> usize {
    SceneObject::ALL.len() + light
}

/// Round `value` up to the next multiple of `align` (a power of two).
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Bytes between consecutive dynamic-offset entries of `T`.
pub(crate) fn uniform_stride<T>(device: &wgpu::Device) -> usize {
    let align = device.limits().min_uniform_buffer_offset_alignment as usize;
    align_up(std::mem::size_of::<T>(), align)
}

/// Layout entry for a uniform buffer at `binding`.
pub(crate) fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic_size: Option<u64>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic_size.is_some(),
            min_binding_size: dynamic_size.and_then(wgpu::BufferSize::new),
        },
        count: None,
    }
}

/// Depth state shared by every depth-tested pipeline.
pub(crate) fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Triangle lists, CCW front faces, no culling.
pub(crate) fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

/// The window-sized depth buffer.
pub(crate) struct DepthBuffer {
    pub view: wgpu::TextureView,
    size: (u32, u32),
}

impl DepthBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            view: create_depth_texture(device, width, height),
            size: (width, height),
        }
    }

    /// Recreate the depth texture if the surface size changed.
    pub fn resize_if_needed(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width, height) != self.size && width > 0 && height > 0 {
            self.view = create_depth_texture(device, width, height);
            self.size = (width, height);
        }
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("window depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Camera and light uniforms, bound as group 0 of the lit and lamp programs.
pub(crate) struct FrameBindings {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, None),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT, None),
            ],
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lights buffer"),
            size: std::mem::size_of::<LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            layout,
            bind_group,
            camera_buffer,
            lights_buffer,
        }
    }

    /// Upload this frame's camera and every light with its light-space matrix.
    pub fn write(&self, queue: &wgpu::Queue, camera: &CameraUniform, lights: &LightsUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(lights));
    }
}

/// Dynamic-offset buffer with one [`ModelUniform`] per drawn object.
pub(crate) struct ModelBuffer {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    stride: usize,
}

impl ModelBuffer {
    /// Create the buffer and fill it with the scene's model matrices.
    pub fn new(gpu: &GpuContext, scene: &Scene) -> Self {
        let device = &gpu.device;
        let model_size = std::mem::size_of::<ModelUniform>() as u64;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, Some(model_size))],
        });

        let stride = uniform_stride::<ModelUniform>(device);
        let data = pack_models(scene, stride);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model dynamic buffer"),
            contents: &data,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(model_size),
                }),
            }],
        });

        Self {
            layout,
            bind_group,
            stride,
        }
    }

    /// Dynamic offset of a model slot.
    pub fn offset(&self, slot: usize) -> u32 {
        (slot * self.stride) as u32
    }
}

/// Model matrices for every slot, laid out at `stride` bytes apart.
fn pack_models(scene: &Scene, stride: usize) -> Vec<u8> {
    let mut data = vec![0u8; stride * MODEL_SLOTS];
    let mut put = |slot: usize, model: glam::Mat4| {
        let bytes = bytemuck::bytes_of(&ModelUniform::new(model)).to_vec();
        data[slot * stride..slot * stride + bytes.len()].copy_from_slice(&bytes);
    };
    for object in SceneObject::ALL {
        put(object.model_slot(), object.model());
    }
    for (i, light) in scene.lights.iter().enumerate() {
        put(marker_slot(i), light.marker_model());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(128, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(64, 64), 64);
    }

    #[test]
    fn slots_do_not_overlap() {
        let mut slots: Vec<_> = SceneObject::ALL.iter().map(|o| o.model_slot()).collect();
        slots.extend((0..NUMBER_OF_LIGHTS).map(marker_slot));
        let mut unique = slots.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), slots.len());
        assert_eq!(slots.len(), MODEL_SLOTS);
        assert!(slots.iter().all(|&s| s < MODEL_SLOTS));
    }

    #[test]
    fn packed_models_land_at_their_slots() {
        let scene = Scene::default();
        let stride = 256;
        let data = pack_models(&scene, stride);
        assert_eq!(data.len(), stride * MODEL_SLOTS);

        let read = |slot: usize| -> ModelUniform {
            let size = std::mem::size_of::<ModelUniform>();
            bytemuck::pod_read_unaligned(&data[slot * stride..slot * stride + size])
        };
        let cube = read(SceneObject::Cube.model_slot());
        assert_eq!(cube.model, SceneObject::Cube.model().to_cols_array_2d());
        let marker = read(marker_slot(2));
        assert_eq!(marker.model, scene.lights[2].marker_model().to_cols_array_2d());
    }
}
