//! # Vertex and Uniform Layouts
//!
//! Every struct here is `#[repr(C)]` + `Pod` so it can be copied straight
//! into a GPU buffer with `bytemuck`. Field order and padding mirror the WGSL
//! structs in `assets/shaders/*.wgsl`; the sizes in the comments are the
//! contract between the two.
//!
//! ## Vertex formats
//!
//! ```text
//! MeshVertex (32 bytes)       cube, floor
//! ┌──────────────┬──────────────┬──────────────┐
//! │ position     │ normal       │ uv           │
//! │ location(0)  │ location(1)  │ location(2)  │
//! └──────────────┴──────────────┴──────────────┘
//!
//! PositionVertex (12 bytes)   light markers, skybox
//! TextVertex (16 bytes)       overlay quads: xy in pixels + uv
//! ```
//!
//! ## Uniform buffers
//!
//! ```text
//! CameraUniform      projection, view, view_pos, shininess     144 bytes
//! LightsUniform      NUMBER_OF_LIGHTS × LightData + count      400 bytes
//! ModelUniform       model + normal matrix (dynamic offset)    128 bytes
//! LightSpaceUniform  one light's clip transform (dyn. offset)   64 bytes
//! ```
//!
//! Lights are uploaded as one array sized by [`NUMBER_OF_LIGHTS`]; the shader
//! loops over `count` instead of naming each light.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::scene::{Light, NUMBER_OF_LIGHTS};

/// Per-vertex data for lit meshes: position, surface normal, texture UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

/// Position-only vertex for unlit geometry.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PositionVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
}

/// Overlay quad corner: screen position in pixels (origin bottom-left) + UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl TextVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TextVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };
}

/// Camera matrices and material constants, written once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4], // 64 bytes
    pub view: [[f32; 4]; 4],       // 64 bytes
    pub view_pos: [f32; 3],        // 12 bytes
    pub shininess: f32,            // 4 bytes → 144
}

impl CameraUniform {
    pub fn new(projection: Mat4, view: Mat4, view_pos: Vec3, shininess: f32) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            view_pos: view_pos.to_array(),
            shininess,
        }
    }
}

/// One light as the lit shader sees it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub position: [f32; 3],          // 12
    pub constant: f32,               // 4 → 16
    pub ambient: [f32; 3],           // 12
    pub linear: f32,                 // 4 → 32
    pub diffuse: [f32; 3],           // 12
    pub quadratic: f32,              // 4 → 48
    pub specular: [f32; 3],          // 12
    pub _pad: f32,                   // 4 → 64
    pub light_space: [[f32; 4]; 4],  // 64 → 128
}

impl LightData {
    pub fn new(light: &Light, light_space: Mat4) -> Self {
        Self {
            position: light.position.to_array(),
            constant: light.constant,
            ambient: light.ambient.to_array(),
            linear: light.linear,
            diffuse: light.diffuse.to_array(),
            quadratic: light.quadratic,
            specular: light.specular.to_array(),
            _pad: 0.0,
            light_space: light_space.to_cols_array_2d(),
        }
    }
}

/// Every light plus the number in use.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [LightData; NUMBER_OF_LIGHTS], // 384
    pub count: u32,                            // 4
    pub _pad: [u32; 3],                        // 12 → 400
}

impl LightsUniform {
    /// Pack lights with their light-space matrices. Index `i` of the result is
    /// light `i`, which is also layer `i` of the shadow-map array.
    pub fn new(
        lights: &[Light; NUMBER_OF_LIGHTS],
        light_space: &[Mat4; NUMBER_OF_LIGHTS],
    ) -> Self {
        Self {
            lights: std::array::from_fn(|i| LightData::new(&lights[i], light_space[i])),
            count: NUMBER_OF_LIGHTS as u32,
            _pad: [0; 3],
        }
    }
}

/// Per-object transform, stored at a dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],         // 64
    pub normal_matrix: [[f32; 4]; 4], // 64 → 128
}

impl ModelUniform {
    pub fn new(model: Mat4) -> Self {
        // Inverse transpose keeps normals perpendicular under non-uniform scale.
        let normal_matrix = model.inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
        }
    }
}

/// A light's world-to-clip transform for the depth pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightSpaceUniform {
    pub matrix: [[f32; 4]; 4],
}

/// Skybox transform: projection × rotation-only view.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkyboxUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Overlay projection and text color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TextUniform {
    pub projection: [[f32; 4]; 4], // 64
    pub color: [f32; 3],           // 12
    pub _pad: f32,                 // 4 → 80
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn uniform_sizes_match_shader_layouts() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(std::mem::size_of::<PositionVertex>(), 12);
        assert_eq!(std::mem::size_of::<TextVertex>(), 16);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
        assert_eq!(std::mem::size_of::<LightData>(), 128);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 400);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
        assert_eq!(std::mem::size_of::<TextUniform>(), 80);
    }

    #[test]
    fn lights_packed_in_light_order() {
        let scene = Scene::default();
        let matrices = scene.light_space_matrices();
        let packed = LightsUniform::new(&scene.lights, &matrices);
        assert_eq!(packed.count, 3);
        for (i, light) in scene.lights.iter().enumerate() {
            assert_eq!(packed.lights[i].position, light.position.to_array());
            assert_eq!(packed.lights[i].light_space, matrices[i].to_cols_array_2d());
            assert_eq!(packed.lights[i].quadratic, 0.032);
        }
    }

    #[test]
    fn normal_matrix_of_translation_is_identity_rotation() {
        let m = ModelUniform::new(Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)));
        let n = Mat4::from_cols_array_2d(&m.normal_matrix);
        let normal = n.transform_vector3(Vec3::Y);
        assert!((normal - Vec3::Y).length() < 1e-6);
    }
}
