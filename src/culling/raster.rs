/// Stage 6: scanline rasterization into the coverage grid.
///
/// Each occluder triangle is split at its mid vertex's y into a lower and an
/// upper half (the split x on the long edge found via similar triangles);
/// each half is scan-converted with per-row left/right edge stepping. Row
/// spans are translated to per-band bitmasks and OR-merged into the
/// coverage words, skipping bands whose row word is already saturated.
/// Because every write is an OR, triangles can be rasterized in parallel in
/// any interleaving and the final grid is identical.
use rayon::prelude::*;

use crate::culling::coverage::{clip_span_to_band, span_mask, CoverageBuffer};
use crate::culling::ScreenTriangle;

const FLAT_EPSILON: f32 = 1e-6;

/// Rasterize the (depth-sorted) occluder triangles. Parallel across
/// triangles; shared row words are merged with atomic OR.
pub fn rasterize_triangles(triangles: &[ScreenTriangle], coverage: &CoverageBuffer) {
    triangles
        .par_iter()
        .for_each(|triangle| rasterize_triangle(triangle, coverage));
}

/// Scan-convert one triangle. Degenerate input (zero height, non-finite
/// coordinates) contributes no bits.
pub fn rasterize_triangle(triangle: &ScreenTriangle, coverage: &CoverageBuffer) {
    let (low, mid, high) = triangle.posed_vertices();

    if !(low.is_finite() && mid.is_finite() && high.is_finite()) {
        return;
    }

    let total_dy = high.y - low.y;
    if total_dy <= FLAT_EPSILON {
        return;
    }

    // x on the long edge (low -> high) level with the mid vertex's y; this
    // splits the triangle into a flat-top lower half and a flat-bottom
    // upper half sharing that row.
    let x_middle_other_side = low.x + (high.x - low.x) * (mid.y - low.y) / total_dy;

    scan_half(
        coverage,
        low.y,
        mid.y,
        (low.x, low.x),
        (mid.x, x_middle_other_side),
    );
    scan_half(
        coverage,
        mid.y,
        high.y,
        (mid.x, x_middle_other_side),
        (high.x, high.x),
    );
}

/// Scan one triangle half. The two bounding edges run from
/// `(start_x.0, y_start)` / `(start_x.1, y_start)` down to
/// `(end_x.0, y_end)` / `(end_x.1, y_end)`.
fn scan_half(
    coverage: &CoverageBuffer,
    y_start: f32,
    y_end: f32,
    start_x: (f32, f32),
    end_x: (f32, f32),
) {
    let dy = y_end - y_start;
    if dy <= FLAT_EPSILON {
        return;
    }

    // Per-row dx/dy slopes of the two edges.
    let slope_a = (end_x.0 - start_x.0) / dy;
    let slope_b = (end_x.1 - start_x.1) / dy;

    let height = coverage.height() as i64;
    let width = coverage.width() as i64;

    let row_first = (y_start.ceil() as i64).max(0);
    let row_last = (y_end.floor() as i64).min(height - 1);

    for row in row_first..=row_last {
        let t = row as f32 - y_start;
        let xa = start_x.0 + slope_a * t;
        let xb = start_x.1 + slope_b * t;

        let (left, right) = if xa <= xb { (xa, xb) } else { (xb, xa) };

        let col_min = left.floor() as i64;
        let col_max = right.ceil() as i64;
        if col_max < 0 || col_min >= width {
            continue;
        }
        let col_min = col_min.max(0);
        let col_max = col_max.min(width - 1);

        for band in 0..coverage.band_count() {
            if let Some((lo, hi)) = clip_span_to_band(band, col_min, col_max) {
                coverage.or_row(band, row as usize, span_mask(lo, hi));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::MidVertex;
    use glam::Vec4;

    fn screen_triangle(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32)) -> ScreenTriangle {
        // Build the record the way the triangle stage would: v0 lowest by y,
        // mid marker for the lower of the remaining two.
        let mut points = [v0, v1, v2];
        points.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let (low, mid, high) = (points[0], points[1], points[2]);
        ScreenTriangle {
            v0: Vec4::new(low.0, low.1, 0.5, 1.0),
            v1: Vec4::new(mid.0, mid.1, 0.5, 1.0),
            v2: Vec4::new(high.0, high.1, 0.5, 1.0),
            depth: 0.5,
            mid: MidVertex::V1,
            degenerate: false,
        }
    }

    #[test]
    fn covers_expected_rows() {
        let coverage = CoverageBuffer::new(128, 64);
        let tri = screen_triangle((10.0, 10.0), (30.0, 40.0), (50.0, 10.0));
        rasterize_triangle(&tri, &coverage);

        // Rows inside the triangle's vertical extent gained bits.
        assert!(coverage.row_word(0, 20) != 0);
        assert!(coverage.row_word(0, 39) != 0);
        // Rows outside stayed clear.
        assert_eq!(coverage.row_word(0, 5), 0);
        assert_eq!(coverage.row_word(0, 50), 0);
    }

    #[test]
    fn span_narrows_towards_the_apex() {
        let coverage = CoverageBuffer::new(128, 64);
        let tri = screen_triangle((10.0, 0.0), (60.0, 0.0), (35.0, 40.0));
        rasterize_triangle(&tri, &coverage);

        let base = coverage.row_word(0, 1).count_ones();
        let tip = coverage.row_word(0, 38).count_ones();
        assert!(base > tip);
        assert!(tip > 0);
    }

    #[test]
    fn zero_height_triangle_writes_nothing() {
        let coverage = CoverageBuffer::new(128, 64);
        let tri = screen_triangle((10.0, 20.0), (30.0, 20.0), (50.0, 20.0));
        rasterize_triangle(&tri, &coverage);
        assert_eq!(coverage.covered_cells(), 0);
    }

    #[test]
    fn triangle_outside_buffer_writes_nothing() {
        let coverage = CoverageBuffer::new(128, 64);
        let tri = screen_triangle((200.0, 100.0), (250.0, 150.0), (300.0, 100.0));
        rasterize_triangle(&tri, &coverage);
        assert_eq!(coverage.covered_cells(), 0);
    }

    #[test]
    fn rasterization_is_idempotent() {
        let coverage = CoverageBuffer::new(128, 64);
        let tri = screen_triangle((5.0, 5.0), (40.0, 50.0), (70.0, 10.0));

        rasterize_triangle(&tri, &coverage);
        let once = coverage.covered_cells();
        rasterize_triangle(&tri, &coverage);
        assert_eq!(coverage.covered_cells(), once);
    }

    #[test]
    fn parallel_and_sequential_rasterization_agree() {
        let triangles: Vec<ScreenTriangle> = (0..40)
            .map(|i| {
                let x = (i % 8) as f32 * 14.0;
                let y = (i / 8) as f32 * 11.0;
                screen_triangle((x, y), (x + 12.0, y + 10.0), (x + 20.0, y))
            })
            .collect();

        let sequential = CoverageBuffer::new(128, 64);
        for tri in &triangles {
            rasterize_triangle(tri, &sequential);
        }

        let parallel = CoverageBuffer::new(128, 64);
        rasterize_triangles(&triangles, &parallel);

        for band in 0..sequential.band_count() {
            for row in 0..sequential.height() {
                assert_eq!(
                    sequential.row_word(band, row),
                    parallel.row_word(band, row),
                    "band {} row {} differs",
                    band,
                    row
                );
            }
        }
    }

    #[test]
    fn spanning_triangle_crosses_band_boundaries() {
        let coverage = CoverageBuffer::new(256, 64);
        // Wide triangle covering columns across all 4 bands near its base.
        let tri = screen_triangle((0.0, 0.0), (255.0, 0.0), (128.0, 60.0));
        rasterize_triangle(&tri, &coverage);

        for band in 0..4 {
            assert!(
                coverage.row_word(band, 1) != 0,
                "band {} should have coverage",
                band
            );
        }
    }
}
