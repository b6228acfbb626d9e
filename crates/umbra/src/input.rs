//! Keyboard and mouse button state.
//!
//! Movement is polled: the frame driver asks "is W held?" once per frame
//! instead of reacting to key events. [`Input`] records presses and releases
//! from the window events so that question can be answered at any time.

use std::collections::HashSet;
use std::hash::Hash;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Tracks which inputs of one kind (keys or mouse buttons) are held.
///
/// - `pressed`: currently held down
/// - `just_pressed`: went down since the last [`clear_just`](Self::clear_just)
#[derive(Debug)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input went down this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Call when an input is pressed (from the event handler).
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Call when an input is released (from the event handler).
    pub fn release(&mut self, input: T) {
        self.pressed.remove(&input);
    }

    /// Clear per-frame state. Called at the end of each frame.
    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut keys = Input::new();
        keys.press(KeyCode::KeyW);
        assert!(keys.pressed(KeyCode::KeyW));
        assert!(keys.just_pressed(KeyCode::KeyW));

        keys.clear_just();
        assert!(keys.pressed(KeyCode::KeyW), "still held after frame end");
        assert!(!keys.just_pressed(KeyCode::KeyW));

        keys.release(KeyCode::KeyW);
        assert!(!keys.pressed(KeyCode::KeyW));
    }

    #[test]
    fn key_repeat_is_not_a_new_press() {
        let mut keys = Input::new();
        keys.press(KeyCode::Space);
        keys.clear_just();
        keys.press(KeyCode::Space);
        assert!(!keys.just_pressed(KeyCode::Space));
    }
}
