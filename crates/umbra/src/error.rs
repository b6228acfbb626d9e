//! Error types.
//!
//! Two families, matching how failures are handled:
//!
//! - [`InitError`]: anything that stops the demo before the first frame
//!   (event loop, window, surface, adapter, device, config). These propagate
//!   to `main`, which logs them and exits with status -1.
//! - [`AssetError`]: a single resource failed to load. Loaders return it to
//!   the caller, which logs it and carries on with a placeholder.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("invalid config '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read config '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single asset could not be loaded.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image '{path}' has unsupported channel count {channels}")]
    UnsupportedChannels { path: PathBuf, channels: u8 },

    #[error("failed to parse font '{path}': {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("cubemap needs exactly 6 faces, got {0}")]
    CubemapFaceCount(usize),

    #[error("cubemap face '{path}' is {actual:?}, expected {expected:?}")]
    CubemapFaceSize {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("texture '{path}' is {size:?}, device limit is {max}")]
    TextureTooLarge {
        path: PathBuf,
        size: (u32, u32),
        max: u32,
    },

    #[error("shader '{name}' failed to compile: {diagnostic}")]
    ShaderCompile { name: String, diagnostic: String },
}
