//! # Mesh: Uploaded Geometry
//!
//! Every mesh the demo draws is uploaded exactly once and reused on every
//! frame. [`GeometryCache`] is the slot table that enforces this: a lookup
//! for a [`MeshKind`] either returns the cached value or runs the upload
//! closure, stores its result, and returns that.
//!
//! The cache is generic over the stored value so the "created at most once"
//! rule can be tested without a GPU. In the renderer it holds [`GpuMesh`]es
//! and is filled up front by [`upload_all`] during init.

use wgpu::util::DeviceExt;

use super::gpu::GpuContext;
use super::shapes;

const MESH_COUNT: usize = 4;

/// The static meshes of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cube,
    Floor,
    LightMarker,
    Skybox,
}

impl MeshKind {
    pub const ALL: [MeshKind; MESH_COUNT] = [
        MeshKind::Cube,
        MeshKind::Floor,
        MeshKind::LightMarker,
        MeshKind::Skybox,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            MeshKind::Cube => "cube",
            MeshKind::Floor => "floor",
            MeshKind::LightMarker => "light marker",
            MeshKind::Skybox => "skybox",
        }
    }
}

/// Vertex buffer, index buffer and index count of one uploaded mesh.
pub(crate) struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    fn upload<V: bytemuck::Pod>(
        gpu: &GpuContext,
        kind: MeshKind,
        vertices: &[V],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertex buffer", kind.label())),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} index buffer", kind.label())),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!(
            "Uploaded {} mesh: {} vertices, {} indices",
            kind.label(),
            vertices.len(),
            indices.len()
        );
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Bind the buffers and issue one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// One slot per [`MeshKind`], filled on first lookup.
pub(crate) struct GeometryCache<M> {
    slots: [Option<M>; MESH_COUNT],
}

impl<M> GeometryCache<M> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// The cached value for `kind`, creating it with `create` if this is the
    /// first lookup. `create` never runs twice for the same kind.
    pub fn get_or_create(&mut self, kind: MeshKind, create: impl FnOnce(MeshKind) -> M) -> &M {
        self.slots[kind.slot()].get_or_insert_with(|| create(kind))
    }

    /// The cached value for `kind`, if it was created.
    pub fn get(&self, kind: MeshKind) -> Option<&M> {
        self.slots[kind.slot()].as_ref()
    }
}

impl<M> Default for GeometryCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate and upload the CPU geometry for one mesh.
fn create_mesh(gpu: &GpuContext, kind: MeshKind) -> GpuMesh {
    match kind {
        MeshKind::Cube => {
            let (v, i) = shapes::cube();
            GpuMesh::upload(gpu, kind, &v, &i)
        }
        MeshKind::Floor => {
            let (v, i) = shapes::floor();
            GpuMesh::upload(gpu, kind, &v, &i)
        }
        MeshKind::LightMarker => {
            let (v, i) = shapes::light_marker();
            GpuMesh::upload(gpu, kind, &v, &i)
        }
        MeshKind::Skybox => {
            let (v, i) = shapes::skybox();
            GpuMesh::upload(gpu, kind, &v, &i)
        }
    }
}

/// Upload every mesh. Called once during init.
pub(crate) fn upload_all(gpu: &GpuContext) -> GeometryCache<GpuMesh> {
    let mut cache = GeometryCache::new();
    for kind in MeshKind::ALL {
        cache.get_or_create(kind, |kind| create_mesh(gpu, kind));
    }
    cache
}

/// Uploaded meshes, all present after [`upload_all`].
pub(crate) struct Meshes {
    cache: GeometryCache<GpuMesh>,
}

impl Meshes {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            cache: upload_all(gpu),
        }
    }

    /// Draw one mesh. A mesh missing from the cache is skipped with a warning.
    pub fn draw(&self, kind: MeshKind, pass: &mut wgpu::RenderPass<'_>) {
        match self.cache.get(kind) {
            Some(mesh) => mesh.draw(pass),
            None => log::warn!("{} mesh was never uploaded", kind.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn creation_runs_once_per_kind() {
        let created = Cell::new(0);
        let mut cache = GeometryCache::new();
        for _ in 0..5 {
            for kind in MeshKind::ALL {
                cache.get_or_create(kind, |k| {
                    created.set(created.get() + 1);
                    k
                });
            }
        }
        assert_eq!(created.get(), 4, "one creation per mesh for the whole run");
    }

    #[test]
    fn repeated_lookup_returns_first_value() {
        let mut cache = GeometryCache::new();
        let first = *cache.get_or_create(MeshKind::Floor, |_| 7_u32);
        let second = *cache.get_or_create(MeshKind::Floor, |_| 99_u32);
        assert_eq!((first, second), (7, 7));
    }

    #[test]
    fn get_before_create_is_none() {
        let mut cache: GeometryCache<u8> = GeometryCache::new();
        assert!(cache.get(MeshKind::Skybox).is_none());
        cache.get_or_create(MeshKind::Skybox, |_| 1);
        assert_eq!(cache.get(MeshKind::Skybox), Some(&1));
        assert!(cache.get(MeshKind::Cube).is_none(), "kinds do not share slots");
    }
}
