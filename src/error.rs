use thiserror::Error;

/// Errors surfaced by the culling pipeline.
///
/// All of these are caller-configuration problems detected before any stage
/// runs; nothing here is retried or recovered mid-frame. Degenerate geometry
/// and missing mesh data are deliberately *not* errors (they are filtered or
/// demoted during processing).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CullingError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scene has {needed} objects but the pipeline is configured for at most {limit}")]
    ObjectCapacityExceeded { needed: usize, limit: usize },

    #[error("occluder meshes require {needed} vertices but the pipeline is configured for at most {limit}")]
    VertexCapacityExceeded { needed: usize, limit: usize },

    #[error("occluder meshes require {needed} triangles but the pipeline is configured for at most {limit}")]
    TriangleCapacityExceeded { needed: usize, limit: usize },
}
