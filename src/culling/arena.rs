/// Per-frame scratch arena.
///
/// Every per-frame container the pipeline touches lives here, allocated once
/// at startup from the configured worst-case capacities and reset (not
/// reallocated) at the top of each tick. Stages borrow slices of the arena
/// rather than owning buffers of their own, so a frame never allocates on
/// the hot path and a capacity overrun is caught up front by the pipeline's
/// validation pass instead of resizing mid-flight.
use glam::{Mat4, Vec4};

use crate::config::CullingConfig;
use crate::culling::{CullingItem, ScreenTriangle, TriangleRef, VertexRecord};

pub struct FrameArena {
    /// Frustum survivors, rebuilt by stage 1.
    pub items: Vec<CullingItem>,
    /// Classified occluders, sorted by descending screen size.
    pub occluders: Vec<CullingItem>,
    /// Occludee test set (every survivor unless policy excludes occluders).
    pub occludees: Vec<CullingItem>,

    /// Flattened occluder mesh vertices tagged with their matrix index.
    pub occluder_vertices: Vec<VertexRecord>,
    /// Synthesized occludee AABB corners, 8 per occludee.
    pub occludee_vertices: Vec<VertexRecord>,
    /// Clip-space outputs, index-aligned with the vertex buffers.
    pub occluder_clip: Vec<Vec4>,
    pub occludee_clip: Vec<Vec4>,

    /// Per-occluder model matrices (locally numbered) and their
    /// view-projection products.
    pub occluder_matrices: Vec<Mat4>,
    pub occludee_matrices: Vec<Mat4>,
    pub occluder_mvp: Vec<Mat4>,
    pub occludee_mvp: Vec<Mat4>,

    /// Occluder triangle index triples with running vertex bases.
    pub occluder_triangles: Vec<TriangleRef>,

    /// Screen-space triangle records.
    pub occluder_screen_tris: Vec<ScreenTriangle>,
    pub occludee_screen_tris: Vec<ScreenTriangle>,

    /// Visibility verdict per occludee slot.
    pub visibility: Vec<bool>,
}

impl FrameArena {
    pub fn new(config: &CullingConfig) -> Self {
        let max_objects = config.max_objects;
        let max_vertices = config.max_occluder_vertices;
        let max_triangles = config.max_occluder_triangles;

        Self {
            items: Vec::with_capacity(max_objects),
            occluders: Vec::with_capacity(max_objects),
            occludees: Vec::with_capacity(max_objects),
            occluder_vertices: Vec::with_capacity(max_vertices),
            occludee_vertices: Vec::with_capacity(max_objects * 8),
            occluder_clip: Vec::with_capacity(max_vertices),
            occludee_clip: Vec::with_capacity(max_objects * 8),
            occluder_matrices: Vec::with_capacity(max_objects),
            occludee_matrices: Vec::with_capacity(max_objects),
            occluder_mvp: Vec::with_capacity(max_objects),
            occludee_mvp: Vec::with_capacity(max_objects),
            occluder_triangles: Vec::with_capacity(max_triangles),
            occluder_screen_tris: Vec::with_capacity(max_triangles),
            occludee_screen_tris: Vec::with_capacity(max_objects),
            visibility: Vec::with_capacity(max_objects),
        }
    }

    /// Drop all per-frame contents while keeping the allocations.
    pub fn reset(&mut self) {
        self.items.clear();
        self.occluders.clear();
        self.occludees.clear();
        self.occluder_vertices.clear();
        self.occludee_vertices.clear();
        self.occluder_clip.clear();
        self.occludee_clip.clear();
        self.occluder_matrices.clear();
        self.occludee_matrices.clear();
        self.occluder_mvp.clear();
        self.occludee_mvp.clear();
        self.occluder_triangles.clear();
        self.occluder_screen_tris.clear();
        self.occludee_screen_tris.clear();
        self.visibility.clear();
    }
}
