//! # Text: Glyph Atlas and Overlay Lines
//!
//! Uses [fontdue](https://docs.rs/fontdue) to rasterize ASCII 0..128 once at
//! startup. Every glyph with a non-empty bitmap becomes its own small `R8Unorm`
//! texture; the text shader reads the red channel as coverage and tints it.
//!
//! ## Glyph Metrics
//!
//! ```text
//!        bearing.x
//!        ├──┤ ┌──────┐ ─┬─
//!             │      │  │ bearing.y
//!             │  g   │  │
//!  origin ●───┼──────┼──┴── baseline
//!             │      │
//!             └──────┘
//!        ├────────────────┤ advance
//! ```
//!
//! Screen coordinates have their origin at the bottom-left, y up. A glyph
//! drawn at pen position `(x, y)` with scale `s` covers
//!
//! ```text
//! left   = x + bearing.x·s
//! bottom = y − (size.y − bearing.y)·s
//! width  = size.x·s, height = size.y·s
//! ```
//!
//! and the pen then moves right by `advance·s`.
//!
//! ## Drawing
//!
//! All quads for a frame go into one vertex buffer. Each glyph is then one
//! 6-vertex draw with that glyph's bind group. The overlay pass loads the
//! existing color and has no depth attachment, so text is always on top.

use std::path::Path;

use wgpu::util::DeviceExt;

use super::gpu::GpuContext;
use super::pipeline::uniform_entry;
use super::vertex::{TextUniform, TextVertex};
use crate::error::AssetError;

/// Glyphs cover character codes `0..GLYPH_COUNT`.
pub const GLYPH_COUNT: usize = 128;

/// Vertex budget of the per-frame quad buffer, in characters.
const MAX_OVERLAY_CHARS: usize = 256;

/// Overlay text color.
const TEXT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Size and placement of one glyph, in pixels at the rasterized size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    /// Bitmap width and height.
    pub size: (f32, f32),
    /// Offset from the pen to the bitmap's left edge, and from the baseline
    /// up to its top edge.
    pub bearing: (f32, f32),
    /// Horizontal pen advance.
    pub advance: f32,
}

impl GlyphMetrics {
    fn from_fontdue(m: &fontdue::Metrics) -> Self {
        Self {
            size: (m.width as f32, m.height as f32),
            bearing: (m.xmin as f32, (m.ymin + m.height as i32) as f32),
            advance: m.advance_width,
        }
    }

    fn is_empty(&self) -> bool {
        self.size.0 == 0.0 || self.size.1 == 0.0
    }
}

/// One character's quad, ready to draw with its glyph's texture.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphQuad {
    pub code: u8,
    pub vertices: [TextVertex; 6],
}

/// Lay out one line starting at pen position `(x, y)`.
///
/// Characters without metrics (outside ASCII, or an empty atlas) are skipped
/// without moving the pen. Empty glyphs such as space only advance.
pub fn layout_line(
    metrics: impl Fn(u8) -> Option<GlyphMetrics>,
    text: &str,
    x: f32,
    y: f32,
    scale: f32,
) -> Vec<GlyphQuad> {
    let mut quads = Vec::with_capacity(text.len());
    let mut pen = x;

    for ch in text.chars() {
        let Some(code) = u8::try_from(ch).ok().filter(|c| (*c as usize) < GLYPH_COUNT) else {
            continue;
        };
        let Some(m) = metrics(code) else { continue };

        if !m.is_empty() {
            let left = pen + m.bearing.0 * scale;
            let bottom = y - (m.size.1 - m.bearing.1) * scale;
            let (w, h) = (m.size.0 * scale, m.size.1 * scale);
            let v = |px: f32, py: f32, u: f32, t: f32| TextVertex {
                position: [px, py],
                uv: [u, t],
            };
            // Bitmap row 0 is the glyph's top, so v = 0 at the top edge.
            quads.push(GlyphQuad {
                code,
                vertices: [
                    v(left, bottom + h, 0.0, 0.0),
                    v(left, bottom, 0.0, 1.0),
                    v(left + w, bottom, 1.0, 1.0),
                    v(left, bottom + h, 0.0, 0.0),
                    v(left + w, bottom, 1.0, 1.0),
                    v(left + w, bottom + h, 1.0, 0.0),
                ],
            });
        }

        pen += m.advance * scale;
    }

    quads
}

/// Rasterize ASCII 0..128 from font bytes.
pub fn rasterize_ascii(
    font_bytes: &[u8],
    px: f32,
    path: &Path,
) -> Result<Vec<(GlyphMetrics, Vec<u8>)>, AssetError> {
    let font = fontdue::Font::from_bytes(
        font_bytes,
        fontdue::FontSettings {
            scale: px,
            ..Default::default()
        },
    )
    .map_err(|reason| AssetError::Font {
        path: path.to_path_buf(),
        reason: reason.to_owned(),
    })?;

    Ok((0..GLYPH_COUNT as u8)
        .map(|code| {
            let (metrics, bitmap) = font.rasterize(code as char, px);
            (GlyphMetrics::from_fontdue(&metrics), bitmap)
        })
        .collect())
}

/// A rasterized glyph: metrics plus its texture, if the bitmap is non-empty.
pub(crate) struct Glyph {
    pub metrics: GlyphMetrics,
    pub bind_group: Option<wgpu::BindGroup>,
}

/// Per-glyph textures for ASCII 0..128. Empty if the font failed to load.
pub(crate) struct GlyphAtlas {
    glyphs: Vec<Glyph>,
}

impl GlyphAtlas {
    fn empty() -> Self {
        Self { glyphs: Vec::new() }
    }

    fn metrics(&self, code: u8) -> Option<GlyphMetrics> {
        self.glyphs.get(code as usize).map(|g| g.metrics)
    }

    fn bind_group(&self, code: u8) -> Option<&wgpu::BindGroup> {
        self.glyphs.get(code as usize).and_then(|g| g.bind_group.as_ref())
    }
}

/// Read the font and upload every glyph, or log and return an empty atlas.
fn build_atlas(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    path: &Path,
    px: f32,
) -> GlyphAtlas {
    let rasterized = std::fs::read(path)
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|bytes| rasterize_ascii(&bytes, px, path));

    let rasterized = match rasterized {
        Ok(glyphs) => glyphs,
        Err(e) => {
            log::warn!("{e}; overlay text disabled");
            return GlyphAtlas::empty();
        }
    };

    let glyphs = rasterized
        .into_iter()
        .map(|(metrics, bitmap)| {
            let bind_group = (!metrics.is_empty()).then(|| {
                let texture = gpu.device.create_texture_with_data(
                    &gpu.queue,
                    &wgpu::TextureDescriptor {
                        label: Some("glyph texture"),
                        size: wgpu::Extent3d {
                            width: metrics.size.0 as u32,
                            height: metrics.size.1 as u32,
                            depth_or_array_layers: 1,
                        },
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: wgpu::TextureFormat::R8Unorm,
                        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                        view_formats: &[],
                    },
                    wgpu::util::TextureDataOrder::LayerMajor,
                    &bitmap,
                );
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("glyph bind group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                })
            });
            Glyph { metrics, bind_group }
        })
        .collect();

    log::info!("Glyph atlas built from '{}' at {px}px", path.display());
    GlyphAtlas { glyphs }
}

/// A line of overlay text at a pen position in pixels (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Glyph atlas plus the overlay pipeline.
pub(crate) struct TextRenderer {
    pub pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    glyph_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    atlas: GlyphAtlas,
    scale: f32,
}

impl TextRenderer {
    pub fn new(
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
        font: &Path,
        pixel_size: f32,
        scale: f32,
    ) -> Self {
        let device = &gpu.device;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text uniform layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, None)],
        });
        let glyph_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glyph layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("text uniform buffer"),
            contents: bytemuck::bytes_of(&text_uniform(1, 1)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("text vertex buffer"),
            size: (MAX_OVERLAY_CHARS * 6 * std::mem::size_of::<TextVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let atlas = build_atlas(gpu, &glyph_layout, &sampler, font, pixel_size);
        let pipeline = build_pipeline(gpu, &[&uniform_layout, &glyph_layout], shader);

        Self {
            pipeline,
            uniform_layout,
            glyph_layout,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            atlas,
            scale,
        }
    }

    pub fn build_pipeline(
        &self,
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        build_pipeline(gpu, &[&self.uniform_layout, &self.glyph_layout], shader)
    }

    /// Draw overlay lines on top of the finished frame.
    pub fn run(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        viewport: (u32, u32),
        lines: &[OverlayLine],
    ) {
        let mut quads: Vec<GlyphQuad> = lines
            .iter()
            .flat_map(|line| {
                layout_line(|c| self.atlas.metrics(c), &line.text, line.x, line.y, self.scale)
            })
            .collect();
        if quads.len() > MAX_OVERLAY_CHARS {
            log::warn!("Overlay text truncated to {MAX_OVERLAY_CHARS} characters");
            quads.truncate(MAX_OVERLAY_CHARS);
        }
        if quads.is_empty() {
            return;
        }

        let vertices: Vec<TextVertex> = quads.iter().flat_map(|q| q.vertices).collect();
        gpu.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        gpu.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&text_uniform(viewport.0, viewport.1)),
        );

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("text overlay pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        for (i, quad) in quads.iter().enumerate() {
            let Some(glyph) = self.atlas.bind_group(quad.code) else { continue };
            let first = (i * 6) as u32;
            pass.set_bind_group(1, glyph, &[]);
            pass.draw(first..first + 6, 0..1);
        }
    }
}

/// Pixel-space orthographic projection and text color.
fn text_uniform(width: u32, height: u32) -> TextUniform {
    TextUniform {
        projection: overlay_projection(width, height).to_cols_array_2d(),
        color: TEXT_COLOR,
        _pad: 0.0,
    }
}

/// Maps pixels (origin bottom-left) to clip space.
pub(crate) fn overlay_projection(width: u32, height: u32) -> glam::Mat4 {
    glam::Mat4::orthographic_rh(0.0, width as f32, 0.0, height as f32, -1.0, 1.0)
}

fn build_pipeline(
    gpu: &GpuContext,
    layouts: &[&wgpu::BindGroupLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("text pipeline layout"),
        bind_group_layouts: layouts,
        push_constant_ranges: &[],
    });

    gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("text pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[TextVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: gpu.surface_format(),
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: super::pipeline::primitive_state(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
