//! The fixed demo scene: three point lights, a cube and a floor.
//!
//! Nothing here touches the GPU. The render passes read these values each
//! frame and derive their uniforms from them.

use glam::{Mat4, Vec3};

/// Number of point lights, and therefore of shadow maps.
pub const NUMBER_OF_LIGHTS: usize = 3;

/// Side length of each square shadow map, in texels.
pub const SHADOW_RESOLUTION: u32 = 1024;

/// Half-extent of the orthographic volume each light renders its depth with.
pub const LIGHT_FRUSTUM_HALF_EXTENT: f32 = 10.0;
/// Near plane of the light frustum.
pub const LIGHT_NEAR: f32 = 0.1;
/// Far plane of the light frustum.
pub const LIGHT_FAR: f32 = 7.5;

/// Specular exponent shared by the cube and floor materials.
pub const MATERIAL_SHININESS: f32 = 64.0;

/// Uniform scale of the light marker cubes.
pub const MARKER_SCALE: f32 = 0.25;

/// A point light with distance attenuation and Phong intensities.
///
/// Attenuation at distance `d` is `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Light {
    /// A light at `position` with the demo's fixed attenuation and intensities.
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(1.0),
        }
    }

    /// Transform from world space into this light's clip space.
    ///
    /// An orthographic box looking from the light toward the world origin.
    /// The origin is used as the target whatever the scene bounds are, which
    /// only works because the scene is small and centred.
    pub fn space_matrix(&self) -> Mat4 {
        light_projection() * Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    /// Model matrix of this light's marker cube.
    pub fn marker_model(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(MARKER_SCALE))
    }
}

/// The orthographic projection shared by every light.
pub fn light_projection() -> Mat4 {
    let e = LIGHT_FRUSTUM_HALF_EXTENT;
    Mat4::orthographic_rh(-e, e, -e, e, LIGHT_NEAR, LIGHT_FAR)
}

/// Static meshes that cast shadows and receive lighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneObject {
    Cube,
    Floor,
}

impl SceneObject {
    /// Draw order for both the shadow and forward passes.
    pub const ALL: [SceneObject; 2] = [SceneObject::Cube, SceneObject::Floor];

    /// World transform of the object.
    pub fn model(self) -> Mat4 {
        match self {
            SceneObject::Cube => Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)),
            SceneObject::Floor => Mat4::IDENTITY,
        }
    }

    /// Slot of this object's model matrix in the shared model buffer.
    pub fn model_slot(self) -> usize {
        self as usize
    }
}

/// Everything static about the scene.
#[derive(Debug, Clone)]
pub struct Scene {
    pub lights: [Light; NUMBER_OF_LIGHTS],
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            lights: [
                Light::at(Vec3::new(2.0, 3.0, 3.0)),
                Light::at(Vec3::new(-1.0, 2.5, -1.5)),
                Light::at(Vec3::new(0.5, 2.0, -2.5)),
            ],
        }
    }
}

impl Scene {
    /// Light-space matrices for every light, in light order.
    pub fn light_space_matrices(&self) -> [Mat4; NUMBER_OF_LIGHTS] {
        self.lights.map(|light| light.space_matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    #[test]
    fn one_matrix_per_light() {
        let scene = Scene::default();
        let matrices = scene.light_space_matrices();
        assert_eq!(matrices.len(), NUMBER_OF_LIGHTS);
        assert_ne!(matrices[0], matrices[1], "lights at different positions");
        assert_ne!(matrices[1], matrices[2]);
    }

    #[test]
    fn origin_projects_to_center_of_light_view() {
        for light in Scene::default().lights {
            let clip = light.space_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
            let ndc = clip.xyz() / clip.w;
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5, "origin off-centre: {ndc}");
            // Depth in [0, 1] for wgpu clip space.
            assert!((0.0..=1.0).contains(&ndc.z), "origin outside depth range: {}", ndc.z);
        }
    }

    #[test]
    fn light_depth_increases_away_from_light() {
        let light = Scene::default().lights[0];
        let m = light.space_matrix();
        let toward_light = light.position.normalize() * 0.5;
        let near = m.project_point3(toward_light).z;
        let far = m.project_point3(-toward_light).z;
        assert!(near < far, "closer point should have smaller depth ({near} vs {far})");
    }

    #[test]
    fn light_parameters() {
        let light = Light::at(Vec3::ONE);
        assert_eq!((light.constant, light.linear, light.quadratic), (1.0, 0.09, 0.032));
        assert_eq!(light.ambient, Vec3::splat(0.1));
        assert_eq!(light.diffuse, Vec3::splat(0.5));
        assert_eq!(light.specular, Vec3::splat(1.0));
    }

    #[test]
    fn marker_model_scales_then_translates() {
        let light = Light::at(Vec3::new(2.0, 3.0, 3.0));
        let corner = light.marker_model().transform_point3(Vec3::splat(0.5));
        assert!((corner - Vec3::new(2.125, 3.125, 3.125)).length() < 1e-6, "got {corner}");
    }

    #[test]
    fn object_models_and_slots() {
        assert_eq!(
            SceneObject::Cube.model().transform_point3(Vec3::ZERO),
            Vec3::new(0.0, 0.5, 0.0)
        );
        assert_eq!(SceneObject::Floor.model(), Mat4::IDENTITY);
        let slots: Vec<_> = SceneObject::ALL.iter().map(|o| o.model_slot()).collect();
        assert_eq!(slots, [0, 1]);
    }
}
