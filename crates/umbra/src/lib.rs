//! # Umbra: Multi-Light Shadow Mapping Demo
//!
//! Opens a window and draws a fixed scene (a crate, a floor, three point
//! lights and an optional skybox) with one shadow map per light, plus an FPS
//! overlay. Fly around with WASD, Space and Left Shift; look with the mouse;
//! zoom with the wheel; Escape quits.
//!
//! Start with [`run`] and a [`Config`](config::Config).

pub mod app;
pub mod asset;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod time;

pub use app::run;
