/// Performance measurement utilities
/// Each pipeline stage is timed and logged for optimization analysis
use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        log::trace!("[PERF] {}: {}us", self.name, elapsed.as_micros());
    }
}

/// Per-stage timing accumulator for one culling frame.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    pub frustum_us: f64,
    pub classify_us: f64,
    pub transform_us: f64,
    pub triangle_us: f64,
    pub raster_us: f64,
    pub visibility_us: f64,
    pub total_us: f64,
}

impl StageTimings {
    pub fn print_summary(&self) {
        println!("\n========== CULLING FRAME SUMMARY ==========");
        println!(
            "Frustum Filter:   {:8.2}us ({:5.1}%)",
            self.frustum_us,
            self.percent(self.frustum_us)
        );
        println!(
            "Classifier:       {:8.2}us ({:5.1}%)",
            self.classify_us,
            self.percent(self.classify_us)
        );
        println!(
            "Geometry:         {:8.2}us ({:5.1}%)",
            self.transform_us,
            self.percent(self.transform_us)
        );
        println!(
            "Triangle Setup:   {:8.2}us ({:5.1}%)",
            self.triangle_us,
            self.percent(self.triangle_us)
        );
        println!(
            "Rasterization:    {:8.2}us ({:5.1}%)",
            self.raster_us,
            self.percent(self.raster_us)
        );
        println!(
            "Visibility Test:  {:8.2}us ({:5.1}%)",
            self.visibility_us,
            self.percent(self.visibility_us)
        );
        println!("-------------------------------------------");
        println!("Total:            {:8.2}us", self.total_us);
        println!("===========================================\n");
    }

    #[inline]
    fn percent(&self, part: f64) -> f64 {
        if self.total_us > 0.0 {
            part / self.total_us * 100.0
        } else {
            0.0
        }
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
