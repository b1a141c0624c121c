/// Stage 7: occludee visibility test.
///
/// Each occludee's screen quad is tested against the accumulated coverage:
/// any uncovered cell inside the footprint makes the occludee visible and
/// short-circuits the scan. Only a footprint whose every overlapped
/// band/row span is fully covered is classified occluded. Parts of the
/// footprint outside the buffer are clipped away; a footprint with no
/// coverage data at all defaults to visible.
///
/// Coverage cells record presence only, no depth, so the test implicitly
/// assumes occluders sit nearer than what they cover; an occluder farther
/// than an overlapped occludee is not detected. The failure mode of every
/// approximation here is "render more", never "cull something visible".
use rayon::prelude::*;

use crate::culling::coverage::{clip_span_to_band, span_mask, CoverageBuffer};
use crate::culling::ScreenTriangle;

/// Test every occludee quad; `out` is index-aligned with the occludee list,
/// `true` meaning "not proven occluded".
pub fn test_occludees(quads: &[ScreenTriangle], coverage: &CoverageBuffer, out: &mut Vec<bool>) {
    quads
        .par_iter()
        .map(|quad| is_visible(quad, coverage))
        .collect_into_vec(out);
}

/// True when the quad has at least one uncovered cell (or no testable
/// footprint at all).
pub fn is_visible(quad: &ScreenTriangle, coverage: &CoverageBuffer) -> bool {
    if quad.degenerate {
        return true;
    }

    let width = coverage.width() as i64;
    let height = coverage.height() as i64;

    let col_min = quad.v0.x.floor() as i64;
    let col_max = quad.v2.x.ceil() as i64;
    let row_min = quad.v0.y.floor() as i64;
    let row_max = quad.v2.y.ceil() as i64;

    if col_max < 0 || col_min >= width || row_max < 0 || row_min >= height {
        // Entirely off-buffer: no coverage data, conservatively visible.
        return true;
    }

    let row_first = row_min.max(0) as usize;
    let row_last = row_max.min(height - 1) as usize;

    for band in 0..coverage.band_count() {
        let (lo, hi) = match clip_span_to_band(band, col_min, col_max) {
            Some(span) => span,
            None => continue,
        };
        let mask = span_mask(lo, hi);

        for row in row_first..=row_last {
            if coverage.test_row(band, row, mask) {
                return true;
            }
        }
    }

    false
}
