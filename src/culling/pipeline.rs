/// Pipeline driver.
///
/// Runs the seven stages strictly in dependency order once per tick. The
/// data-parallel stages fan out over rayon's pool; the fork-join at the end
/// of each stage is the barrier that keeps a stage from reading its
/// predecessor's partial output. Results are returned as a borrow of the
/// pipeline's own storage, so a new frame cannot start until the caller has
/// released the previous frame's results.
use std::time::Instant;

use glam::Mat4;

use crate::camera::Camera;
use crate::config::CullingConfig;
use crate::culling::arena::FrameArena;
use crate::culling::coverage::CoverageBuffer;
use crate::culling::{classify, frustum, raster, transform, triangle, visibility};
use crate::culling::CullingItem;
use crate::error::CullingError;
use crate::perf::StageTimings;
use crate::scene::SceneObject;

/// Per-frame counters published alongside the visibility results.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    pub objects_in: usize,
    pub objects_in_frustum: usize,
    pub occluders: usize,
    pub occludees: usize,
    pub triangles_rasterized: usize,
    pub occludees_culled: usize,
}

/// Visibility verdicts for one frame, index-aligned to the occludee set.
pub struct CullingResults<'a> {
    occludees: &'a [CullingItem],
    visibility: &'a [bool],
    stats: PipelineStats,
}

impl CullingResults<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.visibility.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.visibility.is_empty()
    }

    /// Visibility per occludee slot; `true` means "not proven occluded".
    #[inline]
    pub fn visibility(&self) -> &[bool] {
        self.visibility
    }

    /// Iterate `(object_slot, visible)` pairs, where `object_slot` indexes
    /// the scene slice passed to `execute`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.occludees
            .iter()
            .zip(self.visibility)
            .map(|(item, visible)| (item.index, *visible))
    }

    #[inline]
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }
}

pub struct OcclusionPipeline {
    config: CullingConfig,
    arena: FrameArena,
    coverage: CoverageBuffer,
    stats: PipelineStats,
    timings: StageTimings,
}

impl OcclusionPipeline {
    /// Allocate the arena and coverage grid from the configuration. All
    /// per-frame storage is sized here, once.
    pub fn new(config: CullingConfig) -> Result<Self, CullingError> {
        config.validate()?;
        let arena = FrameArena::new(&config);
        let coverage = CoverageBuffer::new(config.buffer_width, config.buffer_height);
        Ok(Self {
            config,
            arena,
            coverage,
            stats: PipelineStats::default(),
            timings: StageTimings::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Timings of the most recent frame.
    #[inline]
    pub fn timings(&self) -> &StageTimings {
        &self.timings
    }

    /// Coverage grid of the most recent frame (read-only; useful for
    /// debugging and tests).
    #[inline]
    pub fn coverage(&self) -> &CoverageBuffer {
        &self.coverage
    }

    /// Run the full pipeline for one frame.
    ///
    /// Worst-case counts are validated against the configured capacities
    /// before any stage runs; the scratch buffers never grow mid-frame.
    pub fn execute<'a>(
        &'a mut self,
        camera: &Camera,
        objects: &[SceneObject],
    ) -> Result<CullingResults<'a>, CullingError> {
        self.validate_capacity(objects)?;

        let frame_start = Instant::now();
        self.arena.reset();
        self.coverage.clear();
        self.stats = PipelineStats {
            objects_in: objects.len(),
            ..Default::default()
        };

        let planes = camera.extract_frustum_planes();
        let view_projection = camera.view_projection_matrix();
        let projection = camera.projection_matrix();

        // Stage 1: frustum rejection.
        let stage_start = Instant::now();
        frustum::filter_objects(&planes, objects, &mut self.arena.items);
        self.timings.frustum_us = stage_start.elapsed().as_secs_f64() * 1e6;
        self.stats.objects_in_frustum = self.arena.items.len();

        // Stage 2: occluder/occludee classification.
        let stage_start = Instant::now();
        classify::classify_items(
            &self.config,
            camera.position,
            &projection,
            objects,
            &mut self.arena.items,
            &mut self.arena.occluders,
            &mut self.arena.occludees,
        );
        self.timings.classify_us = stage_start.elapsed().as_secs_f64() * 1e6;
        self.stats.occluders = self.arena.occluders.len();
        self.stats.occludees = self.arena.occludees.len();

        // Stage 3: batched geometry transform.
        let stage_start = Instant::now();
        self.transform_geometry(objects, &view_projection);
        self.timings.transform_us = stage_start.elapsed().as_secs_f64() * 1e6;

        // Stage 4: triangle setup + depth sort.
        let stage_start = Instant::now();
        triangle::process_occluder_triangles(
            &self.arena.occluder_triangles,
            &self.arena.occluder_clip,
            self.config.buffer_width,
            self.config.buffer_height,
            &mut self.arena.occluder_screen_tris,
        );
        triangle::process_occludees(
            &self.arena.occludee_clip,
            self.config.buffer_width,
            self.config.buffer_height,
            &mut self.arena.occludee_screen_tris,
        );
        self.timings.triangle_us = stage_start.elapsed().as_secs_f64() * 1e6;
        self.stats.triangles_rasterized = self.arena.occluder_screen_tris.len();

        // Stage 6: coverage rasterization (stage 5 is the buffer itself).
        let stage_start = Instant::now();
        raster::rasterize_triangles(&self.arena.occluder_screen_tris, &self.coverage);
        self.timings.raster_us = stage_start.elapsed().as_secs_f64() * 1e6;

        // Stage 7: occludee visibility test.
        let stage_start = Instant::now();
        visibility::test_occludees(
            &self.arena.occludee_screen_tris,
            &self.coverage,
            &mut self.arena.visibility,
        );
        self.timings.visibility_us = stage_start.elapsed().as_secs_f64() * 1e6;
        self.timings.total_us = frame_start.elapsed().as_secs_f64() * 1e6;

        self.stats.occludees_culled = self.arena.visibility.iter().filter(|v| !**v).count();

        log::debug!(
            "culling frame: {} objects, {} in frustum, {} occluders, {} triangles, {}/{} occludees culled",
            self.stats.objects_in,
            self.stats.objects_in_frustum,
            self.stats.occluders,
            self.stats.triangles_rasterized,
            self.stats.occludees_culled,
            self.stats.occludees,
        );

        Ok(CullingResults {
            occludees: &self.arena.occludees,
            visibility: &self.arena.visibility,
            stats: self.stats,
        })
    }

    fn transform_geometry(&mut self, objects: &[SceneObject], view_projection: &Mat4) {
        let arena = &mut self.arena;

        transform::collect_occluder_geometry(
            objects,
            &arena.occluders,
            &mut arena.occluder_vertices,
            &mut arena.occluder_triangles,
            &mut arena.occluder_matrices,
        );
        transform::collect_occludee_geometry(
            objects,
            &arena.occludees,
            &mut arena.occludee_vertices,
            &mut arena.occludee_matrices,
        );

        transform::build_mvp_table(view_projection, &arena.occluder_matrices, &mut arena.occluder_mvp);
        transform::build_mvp_table(view_projection, &arena.occludee_matrices, &mut arena.occludee_mvp);

        transform::transform_vertices(
            &arena.occluder_vertices,
            &arena.occluder_mvp,
            &mut arena.occluder_clip,
        );
        transform::transform_vertices(
            &arena.occludee_vertices,
            &arena.occludee_mvp,
            &mut arena.occludee_clip,
        );
    }

    /// Reject a frame whose worst-case counts exceed the configured scratch
    /// capacities; the fix is a caller configuration change, not a retry.
    fn validate_capacity(&self, objects: &[SceneObject]) -> Result<(), CullingError> {
        if objects.len() > self.config.max_objects {
            return Err(CullingError::ObjectCapacityExceeded {
                needed: objects.len(),
                limit: self.config.max_objects,
            });
        }

        let mut vertices = 0usize;
        let mut triangles = 0usize;
        for object in objects {
            if !object.occluder_capable {
                continue;
            }
            if let Some(mesh) = &object.mesh {
                vertices += mesh.vertices.len();
                triangles += mesh.triangle_count();
            }
        }

        if vertices > self.config.max_occluder_vertices {
            return Err(CullingError::VertexCapacityExceeded {
                needed: vertices,
                limit: self.config.max_occluder_vertices,
            });
        }
        if triangles > self.config.max_occluder_triangles {
            return Err(CullingError::TriangleCapacityExceeded {
                needed: triangles,
                limit: self.config.max_occluder_triangles,
            });
        }
        Ok(())
    }
}
