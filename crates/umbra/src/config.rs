//! Demo configuration.
//!
//! Every field has a default matching the hardcoded scene, so the demo runs
//! with no config file at all. When `umbra.json` (or the file named by the
//! `UMBRA_CONFIG` environment variable) exists, its fields override the
//! defaults; unknown fields are rejected so typos don't silently do nothing.
//!
//! ```json
//! {
//!     "window": { "width": 1280, "height": 720 },
//!     "movement": { "step": 0.05 },
//!     "skybox": { "enabled": true }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InitError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "umbra.json";

/// Environment variable that overrides the config file path.
pub const CONFIG_ENV: &str = "UMBRA_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub skybox: SkyboxConfig,
    pub text: TextConfig,
    /// Watch shader files and rebuild pipelines when they change.
    pub hot_reload: bool,
    /// `env_logger` filter string. Falls back to `RUST_LOG`, then `info`.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetConfig::default(),
            movement: MovementConfig::default(),
            camera: CameraConfig::default(),
            skybox: SkyboxConfig::default(),
            text: TextConfig::default(),
            hot_reload: true,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "umbra".to_owned(),
        }
    }
}

/// Asset locations. Relative paths resolve against `root`, which defaults to
/// the crate's `assets/` directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub shader_dir: PathBuf,
    pub cube_texture: PathBuf,
    pub floor_texture: PathBuf,
    pub font: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
            shader_dir: PathBuf::from("shaders"),
            cube_texture: PathBuf::from("textures/cube.png"),
            floor_texture: PathBuf::from("textures/floor.png"),
            font: PathBuf::from("fonts/DejaVuSans.ttf"),
        }
    }
}

impl AssetConfig {
    /// Resolve a path relative to the asset root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Path of the WGSL file for a named shader program.
    pub fn shader_path(&self, program: &str) -> PathBuf {
        self.resolve(&self.shader_dir).join(format!("{program}.wgsl"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementConfig {
    /// Distance moved per frame while a movement key is held.
    pub step: f32,
    /// Multiply `step` by the frame delta (in 60 Hz frames) instead of moving
    /// a fixed distance per frame.
    pub scale_by_frame_time: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            scale_by_frame_time: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Degrees of yaw/pitch per pixel of mouse motion.
    pub look_sensitivity: f32,
    /// Initial vertical field of view in degrees.
    pub fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.15,
            fov: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkyboxConfig {
    pub enabled: bool,
    /// Face images in +X, -X, +Y, -Y, +Z, -Z order.
    pub faces: Vec<PathBuf>,
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        let faces = ["right", "left", "top", "bottom", "back", "front"]
            .iter()
            .map(|face| PathBuf::from(format!("textures/skybox/{face}.jpg")))
            .collect();
        Self {
            enabled: false,
            faces,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Rasterization size of the glyph atlas, in pixels.
    pub pixel_size: f32,
    /// Scale applied to glyph metrics when drawing overlay lines.
    pub scale: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            pixel_size: 48.0,
            scale: 0.3,
        }
    }
}

impl Config {
    /// Load the config from `UMBRA_CONFIG` or `umbra.json`.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load() -> Result<Self, InitError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Load the config from a specific path, falling back to defaults if the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, InitError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map_err(|source| InitError::Config {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at '{}', using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(InitError::ConfigIo {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse a config from JSON text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scene() {
        let config = Config::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.movement.step, 0.1);
        assert!(!config.movement.scale_by_frame_time);
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.text.pixel_size, 48.0);
        assert!(!config.skybox.enabled);
        assert_eq!(config.skybox.faces.len(), 6);
        assert!(config.hot_reload);
    }

    #[test]
    fn empty_object_is_default() {
        let parsed = Config::parse("{}").unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_override() {
        let json = r#"{ "window": { "width": 1024 }, "hot_reload": false }"#;
        let parsed = Config::parse(json).unwrap();
        assert_eq!(parsed.window.width, 1024);
        assert_eq!(parsed.window.height, 600, "unspecified fields keep defaults");
        assert!(!parsed.hot_reload);
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(Config::parse(r#"{ "windw": {} }"#).is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("umbra-config-does-not-exist.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let name = format!("umbra-bad-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, "{ not json").unwrap();
        let result = Config::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(InitError::Config { .. })));
    }

    #[test]
    fn skybox_faces_in_cubemap_order() {
        let faces = SkyboxConfig::default().faces;
        let names: Vec<_> = faces
            .iter()
            .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["right", "left", "top", "bottom", "back", "front"]);
    }

    #[test]
    fn shader_path_resolves_under_root() {
        let assets = AssetConfig::default();
        assert_eq!(
            assets.shader_path("shadow_map"),
            assets.root.join("shaders").join("shadow_map.wgsl")
        );
        assert!(assets.shader_path("text").starts_with(&assets.root));
    }
}
