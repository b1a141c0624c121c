/// Stage 3: batched geometry transform.
///
/// Occluder mesh vertices and synthesized occludee AABB corners are
/// flattened into shared buffers, each vertex tagged with the index of its
/// object's model matrix. A single data-parallel map then projects every
/// vertex to clip space; the map is a pure element-wise operation, so the
/// only synchronization needed is the fork-join barrier before the triangle
/// stage reads the output.
use glam::{Mat4, Vec4};
use rayon::prelude::*;

use crate::culling::{CullingItem, TriangleRef, VertexRecord};
use crate::scene::SceneObject;

/// Flatten occluder mesh geometry: vertices, triangle index triples (offset
/// by the running vertex base), and the per-occluder model matrices.
pub fn collect_occluder_geometry(
    objects: &[SceneObject],
    occluders: &[CullingItem],
    vertices: &mut Vec<VertexRecord>,
    triangles: &mut Vec<TriangleRef>,
    matrices: &mut Vec<Mat4>,
) {
    for occluder in occluders {
        let object = &objects[occluder.index];
        // Classification guarantees occluders carry mesh data.
        let mesh = match &object.mesh {
            Some(mesh) => mesh,
            None => continue,
        };

        let matrix_index = matrices.len() as u32;
        let vertex_base = vertices.len() as u32;

        for triple in mesh.indices.chunks_exact(3) {
            triangles.push(TriangleRef {
                i0: triple[0],
                i1: triple[1],
                i2: triple[2],
                vertex_base,
            });
        }

        for position in &mesh.vertices {
            vertices.push(VertexRecord {
                position: *position,
                matrix_index,
            });
        }

        matrices.push(object.model_matrix);
    }
}

/// Synthesize the 8 bounding-box corners for every occludee and record the
/// per-occludee model matrices. Corners land in occludee order, 8 per slot.
pub fn collect_occludee_geometry(
    objects: &[SceneObject],
    occludees: &[CullingItem],
    vertices: &mut Vec<VertexRecord>,
    matrices: &mut Vec<Mat4>,
) {
    for occludee in occludees {
        let object = &objects[occludee.index];
        let matrix_index = matrices.len() as u32;

        for corner in object.local_bounds.corners() {
            vertices.push(VertexRecord {
                position: corner,
                matrix_index,
            });
        }

        matrices.push(object.model_matrix);
    }
}

/// Precompute `view_projection * model` for each recorded matrix.
pub fn build_mvp_table(view_projection: &Mat4, matrices: &[Mat4], mvp: &mut Vec<Mat4>) {
    mvp.extend(matrices.iter().map(|model| *view_projection * *model));
}

/// Project every vertex to clip space: `clip = mvp[owner] * (position, 1)`.
/// Output is index-aligned with the input records.
pub fn transform_vertices(records: &[VertexRecord], mvp: &[Mat4], clip: &mut Vec<Vec4>) {
    records
        .par_iter()
        .map(|record| mvp[record.matrix_index as usize] * record.position.extend(1.0))
        .collect_into_vec(clip);
}
