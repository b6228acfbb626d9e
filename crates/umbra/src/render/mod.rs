//! # Render: Frame Recording and Submission
//!
//! [`Renderer`] owns every GPU resource the demo uses. It is created once,
//! after the surface exists, and each redraw records one command encoder:
//!
//! ```text
//! encoder
//!   ├─ shadow pass × N     depth only, layer i ← light i
//!   ├─ forward pass        lit cube + floor, markers, skybox
//!   └─ text overlay pass   load, alpha blend, no depth
//! submit → present
//! ```
//!
//! All uniforms for the frame are written to the queue before `submit`, so
//! the GPU sees them in order with the passes that read them.
//!
//! ## Hot-Reload
//!
//! [`Renderer::reload_shader`] compiles new WGSL and builds the affected
//! pipelines inside one validation scope. Only if the scope comes back clean
//! are the new pipelines swapped in.

pub mod forward;
pub mod gpu;
pub mod mesh;
pub mod pipeline;
pub mod shader;
pub mod shadow;
pub mod shapes;
pub mod skybox;
pub mod text;
pub mod texture;
pub mod vertex;

use std::path::Path;

pub use gpu::GpuContext;
pub use shader::ShaderKind;

use crate::config::Config;
use crate::error::AssetError;
use crate::frame::SceneState;
use forward::{ForwardRenderer, ForwardSetup};
use mesh::Meshes;
use pipeline::{DepthBuffer, FrameBindings, ModelBuffer};
use shader::ShaderLibrary;
use shadow::{ShadowMaps, ShadowRenderer};
use skybox::SkyboxRenderer;
use text::TextRenderer;

/// All GPU state for the scene.
pub struct Renderer {
    shaders: ShaderLibrary,
    depth: DepthBuffer,
    frame: FrameBindings,
    models: ModelBuffer,
    meshes: Meshes,
    shadow_maps: ShadowMaps,
    shadow: ShadowRenderer,
    forward: ForwardRenderer,
    skybox: Option<SkyboxRenderer>,
    text: TextRenderer,
}

impl Renderer {
    /// Compile every program, allocate the shadow maps, upload geometry and
    /// textures, and build the glyph atlas.
    ///
    /// Asset failures are logged and replaced by placeholders, so this
    /// cannot fail once a device exists.
    pub fn new(gpu: &GpuContext, config: &Config, state: &SceneState) -> Self {
        let assets = &config.assets;
        let shaders = ShaderLibrary::load(gpu, assets);

        let (width, height) = gpu.surface_size();
        let depth = DepthBuffer::new(&gpu.device, width, height);
        let frame = FrameBindings::new(&gpu.device);
        let models = ModelBuffer::new(gpu, &state.scene);
        let meshes = Meshes::new(gpu);
        let shadow_maps = ShadowMaps::new(&gpu.device);
        let shadow = ShadowRenderer::new(gpu, shaders.module(ShaderKind::ShadowMap), &models);

        let cube_texture = assets.resolve(&assets.cube_texture);
        let floor_texture = assets.resolve(&assets.floor_texture);
        let forward = ForwardRenderer::new(
            gpu,
            ForwardSetup {
                object_shader: shaders.module(ShaderKind::Object),
                lamp_shader: shaders.module(ShaderKind::Lamp),
                frame: &frame,
                models: &models,
                shadow_maps: &shadow_maps,
                cube_texture: &cube_texture,
                floor_texture: &floor_texture,
            },
        );

        let skybox = if config.skybox.enabled {
            let faces: Vec<_> = config.skybox.faces.iter().map(|f| assets.resolve(f)).collect();
            SkyboxRenderer::new(gpu, shaders.module(ShaderKind::Cubemap), &faces)
                .map_err(|e| log::warn!("{e}; skybox disabled"))
                .ok()
        } else {
            None
        };

        let text = TextRenderer::new(
            gpu,
            shaders.module(ShaderKind::Text),
            &assets.resolve(&assets.font),
            config.text.pixel_size,
            config.text.scale,
        );

        log::info!("Renderer ready ({width}x{height})");

        Self {
            shaders,
            depth,
            frame,
            models,
            meshes,
            shadow_maps,
            shadow,
            forward,
            skybox,
            text,
        }
    }

    /// Record, submit and present one frame.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        state: &SceneState,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = gpu.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let viewport = gpu.surface_size();
        self.depth.resize_if_needed(&gpu.device, viewport.0, viewport.1);
        let aspect = state.aspect();

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let light_space = self.shadow.run(
            gpu,
            &mut encoder,
            &self.shadow_maps,
            &state.scene,
            &self.models,
            &self.meshes,
        );

        let (camera, lights) =
            forward::frame_uniforms(&state.camera, aspect, &state.scene.lights, &light_space);
        self.frame.write(&gpu.queue, &camera, &lights);
        if let Some(skybox) = &self.skybox {
            skybox.write(&gpu.queue, &state.camera, aspect);
        }

        self.forward.run(
            &mut encoder,
            &target,
            &self.depth,
            viewport,
            &self.frame,
            &self.models,
            &self.meshes,
            self.skybox.as_ref(),
        );

        self.text.run(gpu, &mut encoder, &target, viewport, &state.overlay_lines());

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Replace the pipelines built from one program with ones built from
    /// `source`. On a compile or pipeline error the old pipelines are kept.
    pub fn reload_shader(
        &mut self,
        gpu: &GpuContext,
        kind: ShaderKind,
        source: &str,
    ) -> Result<(), AssetError> {
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = shader::create_module(gpu, kind, source);
        let candidate = match kind {
            ShaderKind::Object => Some(self.forward.rebuild_object_pipeline(
                gpu,
                &self.frame,
                &self.models,
                &module,
            )),
            ShaderKind::Lamp => Some(self.forward.rebuild_lamp_pipeline(
                gpu,
                &self.frame,
                &self.models,
                &module,
            )),
            ShaderKind::ShadowMap => Some(self.shadow.build_pipeline(gpu, &self.models, &module)),
            ShaderKind::Cubemap => self.skybox.as_ref().map(|s| s.build_pipeline(gpu, &module)),
            ShaderKind::Text => Some(self.text.build_pipeline(gpu, &module)),
        };

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(AssetError::ShaderCompile {
                name: kind.name().to_owned(),
                diagnostic: err.to_string(),
            });
        }

        if let Some(pipeline) = candidate {
            match kind {
                ShaderKind::Object => self.forward.object_pipeline = pipeline,
                ShaderKind::Lamp => self.forward.lamp_pipeline = pipeline,
                ShaderKind::ShadowMap => self.shadow.pipeline = pipeline,
                ShaderKind::Cubemap => {
                    if let Some(skybox) = &mut self.skybox {
                        skybox.pipeline = pipeline;
                    }
                }
                ShaderKind::Text => self.text.pipeline = pipeline,
            }
        }
        Ok(())
    }

    /// Every program's source file, for the hot-reload watcher.
    pub fn shader_paths(&self) -> impl Iterator<Item = (&Path, ShaderKind)> {
        self.shaders.paths()
    }
}
