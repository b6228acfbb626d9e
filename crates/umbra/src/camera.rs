//! Free-fly camera.
//!
//! The camera is driven by three inputs:
//!
//! - **Keys** (polled each frame): W/S along the view direction, A/D along
//!   the right vector, Space/Shift along world up.
//! - **Mouse motion**: yaw and pitch follow the raw device delta scaled by
//!   the look sensitivity. Raw deltas keep arriving while the cursor is
//!   grabbed, so the camera can turn without limit. The view direction is
//!   rebuilt from the angles:
//!
//!   ```text
//!   front = normalize(cos(yaw)·cos(pitch), sin(pitch), sin(yaw)·cos(pitch))
//!   ```
//!
//!   Pitch is clamped to ±89° so `front` never becomes parallel to `up`,
//!   which would make the look-at basis degenerate.
//! - **Scroll**: zooms by narrowing or widening the field of view, clamped to
//!   [1°, 70°].

use glam::{Mat4, Vec3};

/// Pitch limit in degrees.
pub const PITCH_LIMIT: f32 = 89.0;
/// Narrowest field of view in degrees.
pub const FOV_MIN: f32 = 1.0;
/// Widest field of view in degrees.
pub const FOV_MAX: f32 = 70.0;
/// Near clip plane of the perspective projection.
pub const NEAR: f32 = 0.1;
/// Far clip plane of the perspective projection.
pub const FAR: f32 = 100.0;

/// One movement direction requested for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Unit view direction.
    pub front: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, within ±[`PITCH_LIMIT`].
    pub pitch: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 5.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 60.0,
            yaw: -90.0,
            pitch: 0.0,
            sensitivity: 0.15,
        }
    }
}

impl FlyCamera {
    /// Default camera with a custom field of view and look sensitivity.
    pub fn new(fov: f32, sensitivity: f32) -> Self {
        Self {
            fov: fov.clamp(FOV_MIN, FOV_MAX),
            sensitivity,
            ..Self::default()
        }
    }

    /// Unit vector pointing to the camera's right.
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    /// Move `step` world units in one direction.
    pub fn translate(&mut self, movement: Movement, step: f32) {
        let offset = match movement {
            Movement::Forward => self.front.normalize() * step,
            Movement::Backward => -self.front.normalize() * step,
            Movement::Right => self.right() * step,
            Movement::Left => -self.right() * step,
            Movement::Up => self.up.normalize() * step,
            Movement::Down => -self.up.normalize() * step,
        };
        self.position += offset;
    }

    /// Handle one relative mouse motion event in device pixels.
    pub fn look(&mut self, dx: f32, dy: f32) {
        // Device y grows downward; pitch grows upward.
        self.rotate(dx, -dy);
    }

    /// Apply a yaw/pitch offset in pixels and rebuild `front`.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }

    /// Zoom by a scroll offset (positive scrolls narrow the view).
    pub fn zoom(&mut self, scroll_y: f32) {
        self.fov = (self.fov - scroll_y).clamp(FOV_MIN, FOV_MAX);
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// View transform with translation removed, for the skybox.
    pub fn rotation_only_view(&self) -> Mat4 {
        let mut view = self.view_matrix();
        view.w_axis = glam::Vec4::W;
        view
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, NEAR, FAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn forward_step_moves_along_front() {
        let mut cam = FlyCamera::default();
        cam.translate(Movement::Forward, 0.1);
        assert!(approx(cam.position, Vec3::new(0.0, 1.0, 4.9)), "got {}", cam.position);
    }

    #[test]
    fn strafe_and_vertical() {
        let mut cam = FlyCamera::default();
        cam.translate(Movement::Right, 1.0);
        assert!(approx(cam.position, Vec3::new(1.0, 1.0, 5.0)), "right is +X when facing -Z");
        cam.translate(Movement::Left, 2.0);
        assert!(approx(cam.position, Vec3::new(-1.0, 1.0, 5.0)));
        cam.translate(Movement::Up, 0.5);
        cam.translate(Movement::Down, 0.25);
        assert!(approx(cam.position, Vec3::new(-1.0, 1.25, 5.0)));
        cam.translate(Movement::Backward, 1.0);
        assert!(approx(cam.position, Vec3::new(-1.0, 1.25, 6.0)));
    }

    #[test]
    fn pitch_always_clamped_and_front_unit() {
        let mut cam = FlyCamera::default();
        for dy in [500.0, 10_000.0, -3.0, -90_000.0, 1e6, 7.5, -1e6] {
            cam.rotate(13.0, dy);
            assert!(cam.pitch <= PITCH_LIMIT && cam.pitch >= -PITCH_LIMIT, "pitch {}", cam.pitch);
            assert!((cam.front.length() - 1.0).abs() < 1e-5, "front {}", cam.front);
        }
    }

    #[test]
    fn mouse_up_pitches_up() {
        let mut cam = FlyCamera::default();
        cam.look(0.0, -100.0);
        assert!((cam.pitch - 15.0).abs() < 1e-4, "100px * 0.15 = 15 deg, got {}", cam.pitch);
        assert!(cam.front.y > 0.0);
    }

    #[test]
    fn relative_motion_turns_all_the_way_around() {
        let mut cam = FlyCamera::default();
        // 100 swipes of 50px: far more than any window is wide.
        for _ in 0..100 {
            cam.look(50.0, 0.0);
        }
        let turned = cam.yaw + 90.0;
        assert!((turned - 750.0).abs() < 1e-2, "5000px * 0.15 = 750 deg, got {turned}");
        assert!(turned >= 180.0);
        assert!((cam.front.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn default_angles_match_default_front() {
        let mut cam = FlyCamera::default();
        cam.rotate(0.0, 0.0);
        assert!(approx(cam.front, Vec3::NEG_Z), "yaw -90 should face -Z, got {}", cam.front);
    }

    #[test]
    fn scroll_saturates_at_min() {
        let mut cam = FlyCamera::default();
        assert_eq!(cam.fov, 60.0);
        for _ in 0..10 {
            cam.zoom(100.0);
            assert!(cam.fov >= FOV_MIN);
        }
        assert_eq!(cam.fov, 1.0);
    }

    #[test]
    fn scroll_saturates_at_max() {
        let mut cam = FlyCamera::default();
        for _ in 0..10 {
            cam.zoom(-37.5);
            assert!(cam.fov <= FOV_MAX);
        }
        assert_eq!(cam.fov, 70.0);
    }

    #[test]
    fn new_clamps_fov() {
        assert_eq!(FlyCamera::new(120.0, 0.1).fov, FOV_MAX);
    }

    #[test]
    fn rotation_only_view_drops_translation() {
        let mut cam = FlyCamera::default();
        cam.position = Vec3::new(3.0, -2.0, 8.0);
        let view = cam.rotation_only_view();
        let p = view.transform_point3(Vec3::ZERO);
        assert!(approx(p, Vec3::ZERO), "origin should stay at origin, got {p}");
    }
}
