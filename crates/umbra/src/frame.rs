//! Per-frame CPU state: camera, input, timing, and the overlay text built
//! from them.
//!
//! Window callbacks write into [`SceneState`]; the renderer only reads it.

use crate::camera::{FlyCamera, Movement};
use crate::config::{Config, MovementConfig};
use crate::input::{Input, KeyCode, MouseButton};
use crate::render::text::OverlayLine;
use crate::scene::Scene;
use crate::time::{FpsCounter, Time};

/// Left margin of every overlay line, in pixels.
const OVERLAY_X: f32 = 10.0;
/// Distance between overlay lines, in pixels.
const OVERLAY_LINE_SPACING: f32 = 22.0;

/// Frame delta that counts as one full step when movement scales with time.
const REFERENCE_FRAME_SECS: f32 = 1.0 / 60.0;

/// Keys held → directions moved.
const MOVEMENT_KEYS: [(KeyCode, Movement); 6] = [
    (KeyCode::KeyW, Movement::Forward),
    (KeyCode::KeyS, Movement::Backward),
    (KeyCode::KeyA, Movement::Left),
    (KeyCode::KeyD, Movement::Right),
    (KeyCode::Space, Movement::Up),
    (KeyCode::ShiftLeft, Movement::Down),
];

pub struct SceneState {
    pub camera: FlyCamera,
    pub scene: Scene,
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    pub time: Time,
    pub fps: FpsCounter,
    /// Surface size in pixels.
    pub viewport: (u32, u32),
    movement: MovementConfig,
}

impl SceneState {
    pub fn new(config: &Config) -> Self {
        Self {
            camera: FlyCamera::new(config.camera.fov, config.camera.look_sensitivity),
            scene: Scene::default(),
            keys: Input::new(),
            mouse: Input::new(),
            time: Time::new(),
            fps: FpsCounter::new(),
            viewport: (config.window.width, config.window.height),
            movement: config.movement.clone(),
        }
    }

    /// Width over height; 1.0 while minimized.
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.viewport;
        if w == 0 || h == 0 { 1.0 } else { w as f32 / h as f32 }
    }

    /// Distance moved this frame per held key.
    pub fn movement_step(&self) -> f32 {
        if self.movement.scale_by_frame_time {
            self.movement.step * self.time.delta_secs() / REFERENCE_FRAME_SECS
        } else {
            self.movement.step
        }
    }

    /// Move the camera for every held movement key.
    pub fn apply_movement(&mut self) {
        let step = self.movement_step();
        for (key, movement) in MOVEMENT_KEYS {
            if self.keys.pressed(key) {
                self.camera.translate(movement, step);
            }
        }
    }

    /// Advance the clock and the FPS reading.
    pub fn advance_time(&mut self) {
        self.time.update();
        if self.fps.tick(self.time.delta_secs()) {
            log::debug!("{:.1} fps", self.fps.fps());
        }
    }

    /// FPS on the top line, then one line per held mouse button, each at a
    /// fixed slot.
    pub fn overlay_lines(&self) -> Vec<OverlayLine> {
        let top = self.viewport.1 as f32;
        let line = |slot: f32, text: String| OverlayLine {
            text,
            x: OVERLAY_X,
            y: top - slot * OVERLAY_LINE_SPACING,
        };

        let mut lines = vec![line(1.0, self.fps.label())];
        if self.mouse.pressed(MouseButton::Left) {
            lines.push(line(2.0, "Left Mouse clicked".to_owned()));
        }
        if self.mouse.pressed(MouseButton::Right) {
            lines.push(line(3.0, "Right Mouse clicked".to_owned()));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn state() -> SceneState {
        SceneState::new(&Config::default())
    }

    #[test]
    fn forward_once_moves_one_step() {
        let mut s = state();
        s.keys.press(KeyCode::KeyW);
        s.apply_movement();
        let expected = Vec3::new(0.0, 1.0, 4.9);
        assert!((s.camera.position - expected).length() < 1e-5, "{}", s.camera.position);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut s = state();
        s.keys.press(KeyCode::KeyA);
        s.keys.press(KeyCode::KeyD);
        s.keys.press(KeyCode::Space);
        s.keys.press(KeyCode::ShiftLeft);
        s.apply_movement();
        assert!((s.camera.position - Vec3::new(0.0, 1.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn fixed_step_ignores_frame_time() {
        let s = state();
        assert_eq!(s.movement_step(), 0.1);
    }

    #[test]
    fn scaled_step_follows_frame_time() {
        let mut config = Config::default();
        config.movement.scale_by_frame_time = true;
        let mut s = SceneState::new(&config);
        let t0 = std::time::Instant::now();
        s.time.update_at(t0);
        s.time.update_at(t0 + std::time::Duration::from_secs_f32(2.0 / 60.0));
        assert!((s.movement_step() - 0.2).abs() < 1e-4, "got {}", s.movement_step());
    }

    #[test]
    fn overlay_shows_fps_only_when_idle() {
        let s = state();
        let lines = s.overlay_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].text.starts_with("FPS: "));
        assert_eq!((lines[0].x, lines[0].y), (10.0, 578.0));
    }

    #[test]
    fn overlay_lines_for_held_buttons() {
        let mut s = state();
        s.mouse.press(MouseButton::Right);
        let lines = s.overlay_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "Right Mouse clicked");
        assert_eq!(lines[1].y, 600.0 - 66.0, "right button keeps its own slot");

        s.mouse.press(MouseButton::Left);
        let ys: Vec<_> = s.overlay_lines().iter().map(|l| l.y).collect();
        assert_eq!(ys, [578.0, 556.0, 534.0]);

        s.mouse.release(MouseButton::Left);
        s.mouse.release(MouseButton::Right);
        assert_eq!(s.overlay_lines().len(), 1);
    }

    #[test]
    fn aspect_survives_minimize() {
        let mut s = state();
        s.viewport = (0, 0);
        assert_eq!(s.aspect(), 1.0);
        s.viewport = (800, 600);
        assert!((s.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }
}
