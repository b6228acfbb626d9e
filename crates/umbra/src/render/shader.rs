//! # Shader: WGSL Program Loading
//!
//! Each program is one WGSL file holding a `vs_main` and (except the depth
//! program) an `fs_main`. Programs are read from `<assets>/shaders/` at
//! startup so they can be edited without recompiling; a copy of every file
//! is also compiled into the binary.
//!
//! ```text
//! load(kind)
//!   ├─ read <assets>/shaders/<name>.wgsl ──── fails → warn, use built-in
//!   └─ compile inside a validation scope ──── fails → warn, use built-in
//! ```
//!
//! Compile errors surface through `push_error_scope`/`pop_error_scope`, so
//! a bad file produces a logged diagnostic instead of a device panic.

use std::path::{Path, PathBuf};

use super::gpu::GpuContext;
use crate::config::AssetConfig;
use crate::error::AssetError;

/// The five programs the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Lit, textured, shadowed geometry.
    Object,
    /// Unlit light markers.
    Lamp,
    /// Depth-only light-space pass.
    ShadowMap,
    /// Skybox.
    Cubemap,
    /// Overlay glyphs.
    Text,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 5] = [
        ShaderKind::Object,
        ShaderKind::Lamp,
        ShaderKind::ShadowMap,
        ShaderKind::Cubemap,
        ShaderKind::Text,
    ];

    /// File stem of the program's source.
    pub fn name(self) -> &'static str {
        match self {
            ShaderKind::Object => "object",
            ShaderKind::Lamp => "lamp",
            ShaderKind::ShadowMap => "shadow_map",
            ShaderKind::Cubemap => "cubemap",
            ShaderKind::Text => "text",
        }
    }

    /// Source compiled into the binary.
    pub fn builtin_source(self) -> &'static str {
        match self {
            ShaderKind::Object => include_str!("../../assets/shaders/object.wgsl"),
            ShaderKind::Lamp => include_str!("../../assets/shaders/lamp.wgsl"),
            ShaderKind::ShadowMap => include_str!("../../assets/shaders/shadow_map.wgsl"),
            ShaderKind::Cubemap => include_str!("../../assets/shaders/cubemap.wgsl"),
            ShaderKind::Text => include_str!("../../assets/shaders/text.wgsl"),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Read a program's source from disk.
pub fn load_source(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile WGSL inside a validation error scope.
///
/// Returns the compiler diagnostic on failure instead of letting wgpu's
/// uncaptured-error handler panic.
pub(crate) fn compile(
    gpu: &GpuContext,
    kind: ShaderKind,
    source: &str,
) -> Result<wgpu::ShaderModule, AssetError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = create_module(gpu, kind, source);
    match pollster::block_on(gpu.device.pop_error_scope()) {
        Some(err) => Err(AssetError::ShaderCompile {
            name: kind.name().to_owned(),
            diagnostic: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// Create a shader module without an error scope. Used for hot-reload, where
/// the caller wraps module and pipeline creation in one scope.
pub(crate) fn create_module(
    gpu: &GpuContext,
    kind: ShaderKind,
    source: &str,
) -> wgpu::ShaderModule {
    gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.name()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

/// Load and compile a program from disk, falling back to the built-in source.
fn load_program(gpu: &GpuContext, kind: ShaderKind, path: &Path) -> wgpu::ShaderModule {
    let from_disk = load_source(path).and_then(|source| compile(gpu, kind, &source));
    match from_disk {
        Ok(module) => {
            log::debug!("Compiled shader '{}' from {}", kind.name(), path.display());
            module
        }
        Err(e) => {
            log::warn!("{e}; using built-in '{}' shader", kind.name());
            create_module(gpu, kind, kind.builtin_source())
        }
    }
}

/// Every compiled program, plus the file each was loaded from.
pub(crate) struct ShaderLibrary {
    modules: [wgpu::ShaderModule; ShaderKind::ALL.len()],
    paths: [PathBuf; ShaderKind::ALL.len()],
}

impl ShaderLibrary {
    pub fn load(gpu: &GpuContext, assets: &AssetConfig) -> Self {
        let paths = ShaderKind::ALL.map(|kind| assets.shader_path(kind.name()));
        let modules = ShaderKind::ALL.map(|kind| load_program(gpu, kind, &paths[kind.index()]));
        Self { modules, paths }
    }

    pub fn module(&self, kind: ShaderKind) -> &wgpu::ShaderModule {
        &self.modules[kind.index()]
    }

    /// Source files, for the hot-reload watcher.
    pub fn paths(&self) -> impl Iterator<Item = (&Path, ShaderKind)> {
        ShaderKind::ALL
            .into_iter()
            .map(|kind| (self.paths[kind.index()].as_path(), kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_files_named_after_programs() {
        let assets = AssetConfig::default();
        let names: Vec<_> = ShaderKind::ALL
            .iter()
            .map(|k| assets.shader_path(k.name()))
            .collect();
        assert!(names[2].ends_with("shaders/shadow_map.wgsl"));
        assert!(names[3].ends_with("shaders/cubemap.wgsl"));
    }

    #[test]
    fn builtin_sources_have_entry_points() {
        for kind in ShaderKind::ALL {
            let source = kind.builtin_source();
            assert!(source.contains("fn vs_main"), "{} lacks vs_main", kind.name());
            if kind != ShaderKind::ShadowMap {
                assert!(source.contains("fn fs_main"), "{} lacks fs_main", kind.name());
            }
        }
    }

    #[test]
    fn object_shader_sizes_light_array_like_the_scene() {
        let source = ShaderKind::Object.builtin_source();
        let expected = format!("NUMBER_OF_LIGHTS: u32 = {}u", crate::scene::NUMBER_OF_LIGHTS);
        assert!(source.contains(&expected), "object.wgsl must declare `{expected}`");
    }

    #[test]
    fn missing_source_is_io_error() {
        let err = load_source(Path::new("/nonexistent/umbra/object.wgsl")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn indices_are_distinct() {
        let mut seen: Vec<_> = ShaderKind::ALL.iter().map(|k| k.index()).collect();
        seen.dedup();
        assert_eq!(seen, [0, 1, 2, 3, 4]);
    }
}
