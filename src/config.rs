use crate::culling::coverage::COLUMNS_PER_BAND;
use crate::error::CullingError;

/// Configuration for the occlusion culling pipeline.
///
/// The coverage grid resolution and the scratch capacities are fixed at
/// pipeline construction; every per-frame container is pre-sized from these
/// values and never grows afterwards. Exceeding a capacity is a caller
/// configuration error, reported before the frame starts.
#[derive(Debug, Clone)]
pub struct CullingConfig {
    /// Coverage grid width in cells. Must be a non-zero multiple of 64;
    /// every 64-column band is stored as one word per row.
    pub buffer_width: usize,
    /// Coverage grid height in cells (rows).
    pub buffer_height: usize,
    /// Minimum projected screen size (fraction of the viewport) for an
    /// object to qualify as an occluder.
    pub min_occluder_screen_size: f32,
    /// Maximum number of scene objects per frame.
    pub max_objects: usize,
    /// Maximum total occluder mesh vertices per frame.
    pub max_occluder_vertices: usize,
    /// Maximum total occluder triangles per frame.
    pub max_occluder_triangles: usize,
    /// Policy switch: when true, objects that qualified as occluders are not
    /// also tested as occludees. The observed variants of this logic
    /// disagree, so it is configurable rather than fixed; default keeps
    /// every object in the occludee set.
    pub exclude_occluders_from_occludees: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        // Container sizing mirrors a worst case of ~1M vertices; triangle
        // capacity is a third of that (three indices per triangle).
        const DEFAULT_CONTAINER_SIZE: usize = 1 << 20;

        Self {
            buffer_width: 256,
            buffer_height: 128,
            min_occluder_screen_size: 0.02,
            max_objects: 4096,
            max_occluder_vertices: DEFAULT_CONTAINER_SIZE,
            max_occluder_triangles: DEFAULT_CONTAINER_SIZE / 3,
            exclude_occluders_from_occludees: false,
        }
    }
}

impl CullingConfig {
    /// Number of 64-column bands in the coverage grid.
    #[inline]
    pub fn band_count(&self) -> usize {
        self.buffer_width / COLUMNS_PER_BAND
    }

    /// Check structural validity. Called once by the pipeline constructor.
    pub fn validate(&self) -> Result<(), CullingError> {
        if self.buffer_width == 0 || self.buffer_width % COLUMNS_PER_BAND != 0 {
            return Err(CullingError::InvalidConfig(format!(
                "buffer_width must be a non-zero multiple of {}, got {}",
                COLUMNS_PER_BAND, self.buffer_width
            )));
        }
        if self.buffer_height == 0 {
            return Err(CullingError::InvalidConfig(
                "buffer_height must be non-zero".to_string(),
            ));
        }
        if self.max_objects == 0 {
            return Err(CullingError::InvalidConfig(
                "max_objects must be non-zero".to_string(),
            ));
        }
        if !self.min_occluder_screen_size.is_finite() || self.min_occluder_screen_size < 0.0 {
            return Err(CullingError::InvalidConfig(format!(
                "min_occluder_screen_size must be finite and non-negative, got {}",
                self.min_occluder_screen_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CullingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unaligned_width() {
        let config = CullingConfig {
            buffer_width: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CullingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_height() {
        let config = CullingConfig {
            buffer_height: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
