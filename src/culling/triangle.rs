/// Stage 4: triangle setup.
///
/// Occluder triangles are rejected against the clip-space frustum, divided,
/// mapped into coverage-buffer space, vertex-ordered for the scanline
/// rasterizer, and appended through a lock-free bounded sink (parallel
/// writers, atomic cursor, never resized mid-flight). Occludee proxies are
/// reduced from their 8 projected corners to an axis-aligned screen quad
/// plus a minimum depth. Finally occluder triangles are sorted by ascending
/// depth so near triangles rasterize first and saturate coverage rows early;
/// the sort affects only early-out efficiency, never the final grid.
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use glam::Vec4;
use rayon::prelude::*;

use crate::culling::{MidVertex, ScreenTriangle, TriangleRef};

/// Conservative clip-space frustum rejection: the triangle is discarded only
/// when all three vertices lie strictly outside the same half-space, using
/// `|w|` as the bound. No clipping or splitting is performed.
#[inline]
pub fn triangle_outside_frustum(a: Vec4, b: Vec4, c: Vec4) -> bool {
    let aw = a.w.abs();
    let bw = b.w.abs();
    let cw = c.w.abs();

    (a.x < -aw && b.x < -bw && c.x < -cw)
        || (a.x > aw && b.x > bw && c.x > cw)
        || (a.y < -aw && b.y < -bw && c.y < -cw)
        || (a.y > aw && b.y > bw && c.y > cw)
        || (a.z < -aw && b.z < -bw && c.z < -cw)
        || (a.z > aw && b.z > bw && c.z > cw)
}

/// Map an NDC position into coverage-buffer pixel space.
#[inline]
fn ndc_to_buffer(ndc: Vec4, width: f32, height: f32) -> Vec4 {
    Vec4::new(
        width * 0.5 * ndc.x + width * 0.5,
        height * 0.5 * ndc.y + height * 0.5,
        ndc.z,
        ndc.w,
    )
}

/// Lock-free bounded append into a pre-sized buffer.
///
/// Writers claim a slot with an atomic fetch-add and write it directly; the
/// buffer is never resized while the sink is live. Pushes past capacity are
/// dropped (the pipeline validates worst-case counts before the frame, so a
/// drop indicates a caller-configuration error, not a runtime condition).
struct TriangleSink {
    ptr: *mut ScreenTriangle,
    capacity: usize,
    cursor: AtomicUsize,
}

// Safety: writers only touch the distinct slot returned by the atomic
// cursor, and the backing Vec outlives the sink within the stage.
unsafe impl Send for TriangleSink {}
unsafe impl Sync for TriangleSink {}

impl TriangleSink {
    fn new(buffer: &mut Vec<ScreenTriangle>) -> Self {
        buffer.clear();
        Self {
            ptr: buffer.as_mut_ptr(),
            capacity: buffer.capacity(),
            cursor: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn push(&self, triangle: ScreenTriangle) -> bool {
        let slot = self.cursor.fetch_add(1, AtomicOrdering::Relaxed);
        if slot < self.capacity {
            unsafe { self.ptr.add(slot).write(triangle) };
            true
        } else {
            false
        }
    }

    fn committed(&self) -> usize {
        self.cursor.load(AtomicOrdering::Relaxed).min(self.capacity)
    }
}

/// Build the screen-space record for one occluder triangle, or `None` when
/// the triangle is frustum-rejected or degenerates under the divide.
fn setup_occluder_triangle(
    a: Vec4,
    b: Vec4,
    c: Vec4,
    width: f32,
    height: f32,
) -> Option<ScreenTriangle> {
    if triangle_outside_frustum(a, b, c) {
        return None;
    }

    let screen_a = ndc_to_buffer(a / a.w, width, height);
    let screen_b = ndc_to_buffer(b / b.w, width, height);
    let screen_c = ndc_to_buffer(c / c.w, width, height);

    // Ill-conditioned transforms (w near zero) produce NaN/Inf; such
    // triangles contribute nothing rather than poisoning the grid.
    if !(screen_a.is_finite() && screen_b.is_finite() && screen_c.is_finite()) {
        return None;
    }

    // v0 = lowest vertex by y.
    let mut v0 = screen_a;
    let mut v1;
    let mut v2;

    if screen_b.y < v0.y {
        v1 = v0;
        v0 = screen_b;
    } else {
        v1 = screen_b;
    }

    if screen_c.y < v0.y {
        v2 = v0;
        v0 = screen_c;
    } else {
        v2 = screen_c;
    }

    if v2.x > v1.x {
        std::mem::swap(&mut v1, &mut v2);
    }

    let mid = if v1.y < v2.y {
        MidVertex::V1
    } else {
        MidVertex::V2
    };

    let depth = v0.z.max(v1.z).max(v2.z);

    Some(ScreenTriangle {
        v0,
        v1,
        v2,
        depth,
        mid,
        degenerate: false,
    })
}

/// Process all occluder triangles in parallel and sort the surviving records
/// by ascending depth (ties broken by mid marker).
pub fn process_occluder_triangles(
    triangles: &[TriangleRef],
    clip: &[Vec4],
    buffer_width: usize,
    buffer_height: usize,
    out: &mut Vec<ScreenTriangle>,
) {
    let width = buffer_width as f32;
    let height = buffer_height as f32;

    let sink = TriangleSink::new(out);
    triangles.par_iter().for_each(|tri| {
        let base = tri.vertex_base as usize;
        let a = clip[base + tri.i0 as usize];
        let b = clip[base + tri.i1 as usize];
        let c = clip[base + tri.i2 as usize];

        if let Some(screen_tri) = setup_occluder_triangle(a, b, c, width, height) {
            sink.push(screen_tri);
        }
    });

    let committed = sink.committed();
    // Safety: slots 0..committed were initialized by the sink writers.
    unsafe { out.set_len(committed) };

    out.sort_unstable_by(|a, b| {
        a.depth
            .partial_cmp(&b.depth)
            .unwrap_or(Ordering::Equal)
            .then(a.mid.cmp(&b.mid))
    });
}

/// Reduce each occludee's 8 projected corners to an axis-aligned screen quad
/// plus the minimum depth. Output is index-aligned with the occludee list;
/// ill-conditioned projections are flagged degenerate (tested as visible).
pub fn process_occludees(
    clip: &[Vec4],
    buffer_width: usize,
    buffer_height: usize,
    out: &mut Vec<ScreenTriangle>,
) {
    const W_EPSILON: f32 = 1e-6;

    let width = buffer_width as f32;
    let height = buffer_height as f32;

    clip.par_chunks_exact(8)
        .map(|corners| {
            let mut min_x = f32::INFINITY;
            let mut min_y = f32::INFINITY;
            let mut max_x = f32::NEG_INFINITY;
            let mut max_y = f32::NEG_INFINITY;
            let mut min_depth = f32::INFINITY;
            let mut degenerate = false;

            for corner in corners {
                if corner.w.abs() < W_EPSILON {
                    degenerate = true;
                    break;
                }
                let screen = ndc_to_buffer(*corner / corner.w, width, height);
                if !screen.is_finite() {
                    degenerate = true;
                    break;
                }

                min_x = min_x.min(screen.x);
                min_y = min_y.min(screen.y);
                max_x = max_x.max(screen.x);
                max_y = max_y.max(screen.y);
                min_depth = min_depth.min(screen.z);
            }

            // A corner behind the eye plane makes the screen quad invalid;
            // the record stays conservatively visible.
            if corners.iter().any(|c| c.w < 0.0) {
                degenerate = true;
            }

            ScreenTriangle {
                v0: Vec4::new(min_x, min_y, 0.0, 0.0),
                v1: Vec4::new(max_x, min_y, 0.0, 0.0),
                v2: Vec4::new(max_x, max_y, 0.0, 0.0),
                depth: min_depth,
                mid: MidVertex::None,
                degenerate,
            }
        })
        .collect_into_vec(out);
}
