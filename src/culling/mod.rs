/// Occlusion culling pipeline
/// Stages run in dependency order each frame: frustum rejection, occluder
/// classification, batched geometry transform, triangle setup, coverage
/// rasterization, and the occludee visibility test.
pub mod arena;
pub mod classify;
pub mod coverage;
pub mod frustum;
pub mod pipeline;
pub mod raster;
pub mod transform;
pub mod triangle;
pub mod visibility;

pub use coverage::{CoverageBuffer, COLUMNS_PER_BAND};
pub use pipeline::{CullingResults, OcclusionPipeline, PipelineStats};

use glam::{Vec3, Vec4};

/// Transient per-object record built by the frustum/classify stages and
/// discarded at frame end.
#[derive(Debug, Clone, Copy)]
pub struct CullingItem {
    pub center: Vec3,
    pub bound_radius: f32,
    /// Approximate fraction of the viewport covered by the bounding sphere.
    pub screen_size: f32,
    pub transparent: bool,
    /// Index into the frame's scene object slice.
    pub index: usize,
    /// Set by the classifier when the item qualified as an occluder.
    pub occluder: bool,
}

/// A vertex queued for the batched clip transform, tagged with the index of
/// its owning object's model matrix.
#[derive(Debug, Clone, Copy)]
pub struct VertexRecord {
    pub position: Vec3,
    pub matrix_index: u32,
}

/// Per-triangle vertex index triple, offset by the owning occluder's running
/// base in the flattened vertex buffer.
#[derive(Debug, Clone, Copy)]
pub struct TriangleRef {
    pub i0: u32,
    pub i1: u32,
    pub i2: u32,
    pub vertex_base: u32,
}

/// Which of v1/v2 is the mid vertex by y. `None` marks occludee bounding
/// quads, which carry (min, (max.x, min.y), max) instead of a real triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MidVertex {
    V1,
    V2,
    None,
}

/// A triangle (or occludee bounding quad) mapped into coverage-buffer space.
/// `v0` is the lowest vertex by y; the mid marker identifies which of the
/// other two sits between v0 and the highest vertex.
#[derive(Debug, Clone, Copy)]
pub struct ScreenTriangle {
    pub v0: Vec4,
    pub v1: Vec4,
    pub v2: Vec4,
    /// Representative depth: max z for occluder triangles (processing-order
    /// heuristic only), min z over the 8 corners for occludee quads.
    pub depth: f32,
    pub mid: MidVertex,
    /// Occludee quads whose projection was ill-conditioned (corner behind
    /// the eye, NaN from the divide) are flagged degenerate and treated as
    /// conservatively visible.
    pub degenerate: bool,
}

impl ScreenTriangle {
    /// Resolve (lowest, mid, highest) vertices by y for scan conversion.
    /// Only meaningful for occluder triangles (mid marker set).
    #[inline]
    pub fn posed_vertices(&self) -> (Vec4, Vec4, Vec4) {
        match self.mid {
            MidVertex::V1 => (self.v0, self.v1, self.v2),
            MidVertex::V2 => (self.v0, self.v2, self.v1),
            MidVertex::None => (self.v0, self.v1, self.v2),
        }
    }
}
