/// Binary coverage framebuffer packed into 64-bit words.
///
/// The grid is split into vertical bands of 64 columns; one word holds a
/// full row of one band, so a triangle span ORs into at most `bands` words
/// per row. Coverage is presence-only: a set bit means "some occluder
/// triangle covered this cell this frame", with no depth attached. Bits are
/// monotone within a frame (OR-accumulated, never cleared until the next
/// frame's `clear`), which is what makes racy parallel writes benign: every
/// writer ORs, so interleavings are idempotent and order-independent.
use std::sync::atomic::{AtomicU64, Ordering};

/// Columns per band, fixed by the word width.
pub const COLUMNS_PER_BAND: usize = 64;

pub struct CoverageBuffer {
    width: usize,
    height: usize,
    bands: usize,
    /// `bands * height` words, band-major: `words[band * height + row]`.
    words: Vec<AtomicU64>,
}

impl CoverageBuffer {
    /// Create a zeroed coverage grid. `width` must be a multiple of 64.
    pub fn new(width: usize, height: usize) -> Self {
        debug_assert!(width % COLUMNS_PER_BAND == 0);
        let bands = width / COLUMNS_PER_BAND;
        let mut words = Vec::with_capacity(bands * height);
        words.resize_with(bands * height, || AtomicU64::new(0));
        Self {
            width,
            height,
            bands,
            words,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn band_count(&self) -> usize {
        self.bands
    }

    /// Zero every word. Must run once per frame before rasterization.
    pub fn clear(&mut self) {
        // Exclusive access: plain stores are enough.
        for word in self.words.iter_mut() {
            *word.get_mut() = 0;
        }
    }

    #[inline]
    fn word_index(&self, band: usize, row: usize) -> usize {
        debug_assert!(band < self.bands && row < self.height);
        band * self.height + row
    }

    /// OR a bitmask into one row of one band. Skipped entirely when the row
    /// word is already saturated (all ones), the common case once a large
    /// occluder has filled a region.
    #[inline]
    pub fn or_row(&self, band: usize, row: usize, mask: u64) {
        if mask == 0 {
            return;
        }
        let word = &self.words[self.word_index(band, row)];
        if word.load(Ordering::Relaxed) == u64::MAX {
            return;
        }
        word.fetch_or(mask, Ordering::Relaxed);
    }

    /// True iff any bit of `mask` is unset in the row word, i.e. the masked
    /// footprint has at least one uncovered cell.
    #[inline]
    pub fn test_row(&self, band: usize, row: usize, mask: u64) -> bool {
        let word = self.words[self.word_index(band, row)].load(Ordering::Relaxed);
        word & mask != mask
    }

    /// Raw row word, for tests and stats.
    #[inline]
    pub fn row_word(&self, band: usize, row: usize) -> u64 {
        self.words[self.word_index(band, row)].load(Ordering::Relaxed)
    }

    /// Number of covered cells across the whole grid.
    pub fn covered_cells(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }
}

/// Bitmask covering local columns `lo..=hi` of a band (both < 64).
#[inline]
pub fn span_mask(lo: usize, hi: usize) -> u64 {
    debug_assert!(lo <= hi && hi < COLUMNS_PER_BAND);
    let count = hi - lo + 1;
    if count == COLUMNS_PER_BAND {
        u64::MAX
    } else {
        ((1u64 << count) - 1) << lo
    }
}

/// Clip a global inclusive column span to one band's local columns.
/// Returns `None` when the span misses the band.
#[inline]
pub fn clip_span_to_band(band: usize, col_min: i64, col_max: i64) -> Option<(usize, usize)> {
    let band_start = (band * COLUMNS_PER_BAND) as i64;
    let lo = col_min.max(band_start) - band_start;
    let hi = col_max.min(band_start + COLUMNS_PER_BAND as i64 - 1) - band_start;
    if lo > hi {
        None
    } else {
        Some((lo as usize, hi as usize))
    }
}
