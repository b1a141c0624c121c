pub mod camera;
pub mod config;
pub mod culling;
pub mod error;
pub mod perf;
/// Software occlusion culling engine
/// Rasterizes occluder geometry into a compressed binary coverage buffer on
/// the CPU and tests occludee bounds against it, so fully hidden objects
/// never reach the rendering pipeline.
pub mod scene;

pub use camera::{extract_frustum_planes, Camera, FrustumPlane};
pub use config::CullingConfig;
pub use culling::{
    CoverageBuffer, CullingItem, CullingResults, MidVertex, OcclusionPipeline, PipelineStats,
    ScreenTriangle, TriangleRef, VertexRecord, COLUMNS_PER_BAND,
};
pub use error::CullingError;
pub use perf::{PerfTimer, StageTimings};
pub use scene::{Aabb, BoundingSphere, Material, MeshData, RenderQueue, SceneObject};
