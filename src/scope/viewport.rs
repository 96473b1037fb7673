//! Mutable view parameters with cached coordinate ratios.

use super::aggregate::AggregationMode;
use super::mapper::CoordinateMapper;

pub const DEFAULT_MAX_AMPLITUDE: f32 = 1.0;

/// Visible amplitude/time window and drawing-surface size.
///
/// Owned by the presentation thread. Every setter recomputes the cached
/// [`CoordinateMapper`] and bumps [`revision`](Self::revision), which
/// lets static layers know when to rebuild.
#[derive(Debug, Clone)]
pub struct ViewportConfig {
    amplitude_max: f32,
    min_sample_index: usize,
    /// Zero until a block size is known
    max_sample_index: usize,
    aggregation_mode: AggregationMode,
    /// Max block size of the attached source, if any
    block_size_limit: Option<usize>,
    width_px: u32,
    height_px: u32,
    mapper: CoordinateMapper,
    revision: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let mut viewport = Self {
            amplitude_max: DEFAULT_MAX_AMPLITUDE,
            min_sample_index: 0,
            max_sample_index: 0,
            aggregation_mode: AggregationMode::default(),
            block_size_limit: None,
            width_px: 0,
            height_px: 0,
            mapper: CoordinateMapper::new(DEFAULT_MAX_AMPLITUDE, 0, 0, 0, 0),
            revision: 0,
        };
        viewport.recalculate();
        viewport
    }
}

impl ViewportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the amplitude shown at the top edge.
    ///
    /// Non-positive or non-finite values are ignored.
    pub fn set_max_amplitude(&mut self, amplitude_max: f32) {
        if !(amplitude_max.is_finite() && amplitude_max > 0.0) {
            tracing::warn!("Ignoring invalid max amplitude {}", amplitude_max);
            return;
        }
        self.amplitude_max = amplitude_max;
        self.recalculate();
    }

    pub fn max_amplitude(&self) -> f32 {
        self.amplitude_max
    }

    /// Sets the first visible sample index.
    ///
    /// Pulled back to `max - 1` once a max index is known.
    pub fn set_min_sample_index(&mut self, index: usize) {
        self.min_sample_index = index;
        self.recalculate();
    }

    pub fn min_sample_index(&self) -> usize {
        self.min_sample_index
    }

    /// Sets the exclusive end of the visible sample range.
    ///
    /// Silently clamped to the attached source's block size. Zero resets
    /// to the full block.
    pub fn set_max_sample_index(&mut self, index: usize) {
        self.max_sample_index = index;
        self.recalculate();
    }

    pub fn max_sample_index(&self) -> usize {
        self.max_sample_index
    }

    pub fn set_aggregation_mode(&mut self, mode: AggregationMode) {
        self.aggregation_mode = mode;
        self.revision += 1;
    }

    pub fn aggregation_mode(&self) -> AggregationMode {
        self.aggregation_mode
    }

    /// Applies the block size of a newly attached source.
    ///
    /// An unset max index defaults to the full block.
    pub fn set_block_size_limit(&mut self, block_size: usize) {
        self.block_size_limit = Some(block_size);
        self.recalculate();
    }

    /// Resize notification from the drawing surface.
    pub fn resize(&mut self, width_px: u32, height_px: u32) {
        if (width_px, height_px) == (self.width_px, self.height_px) {
            return;
        }
        self.width_px = width_px;
        self.height_px = height_px;
        self.recalculate();
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn height_px(&self) -> u32 {
        self.height_px
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Increases on every change that affects drawing.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn recalculate(&mut self) {
        if let Some(limit) = self.block_size_limit {
            if self.max_sample_index == 0 {
                self.max_sample_index = limit;
            }
            self.max_sample_index = self.max_sample_index.min(limit);
        }
        // min < max whenever max is known
        if self.max_sample_index > 0 && self.min_sample_index >= self.max_sample_index {
            tracing::warn!(
                "Min sample index {} not below max {}; using {}",
                self.min_sample_index,
                self.max_sample_index,
                self.max_sample_index - 1
            );
            self.min_sample_index = self.max_sample_index - 1;
        }
        self.mapper = CoordinateMapper::new(
            self.amplitude_max,
            self.min_sample_index,
            self.max_sample_index,
            self.width_px,
            self.height_px,
        );
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_defaults() {
        let viewport = ViewportConfig::new();
        assert_eq!(viewport.max_amplitude(), 1.0);
        assert_eq!(viewport.min_sample_index(), 0);
        assert_eq!(viewport.max_sample_index(), 0);
        assert_eq!(viewport.aggregation_mode(), AggregationMode::PeakMagnitude);
    }

    #[test]
    fn test_block_size_sets_unset_max_index() {
        let mut viewport = ViewportConfig::new();
        viewport.set_block_size_limit(4096);
        assert_eq!(viewport.max_sample_index(), 4096);
    }

    #[test]
    fn test_max_index_clamped_to_block_size() {
        let mut viewport = ViewportConfig::new();
        viewport.set_block_size_limit(4096);
        viewport.set_max_sample_index(10_000);
        assert_eq!(viewport.max_sample_index(), 4096);

        viewport.set_max_sample_index(1024);
        assert_eq!(viewport.max_sample_index(), 1024);
    }

    #[test]
    fn test_max_index_set_before_attach_clamped_on_attach() {
        let mut viewport = ViewportConfig::new();
        viewport.set_max_sample_index(8192);
        assert_eq!(viewport.max_sample_index(), 8192);

        viewport.set_block_size_limit(2048);
        assert_eq!(viewport.max_sample_index(), 2048);
    }

    #[test]
    fn test_min_index_kept_below_max() {
        let mut viewport = ViewportConfig::new();
        viewport.set_block_size_limit(4096);
        viewport.resize(800, 200);

        viewport.set_min_sample_index(5000);
        assert_eq!(viewport.min_sample_index(), 4095);
        assert_eq!(viewport.max_sample_index(), 4096);

        viewport.set_min_sample_index(2048);
        viewport.set_max_sample_index(1024);
        assert_eq!(viewport.max_sample_index(), 1024);
        assert_eq!(viewport.min_sample_index(), 1023);
    }

    #[test]
    fn test_zero_max_index_resets_to_block() {
        let mut viewport = ViewportConfig::new();
        viewport.set_block_size_limit(4096);
        viewport.set_max_sample_index(1024);
        viewport.set_max_sample_index(0);
        assert_eq!(viewport.max_sample_index(), 4096);
        assert!(viewport.min_sample_index() < viewport.max_sample_index());
    }

    #[test]
    fn test_min_index_clamped_when_block_attached() {
        let mut viewport = ViewportConfig::new();
        viewport.set_min_sample_index(3000);
        assert_eq!(viewport.min_sample_index(), 3000);

        viewport.set_block_size_limit(2048);
        assert_eq!(viewport.max_sample_index(), 2048);
        assert_eq!(viewport.min_sample_index(), 2047);
    }

    #[test]
    fn test_ratios_follow_every_change() {
        let mut viewport = ViewportConfig::new();
        viewport.set_block_size_limit(4096);
        viewport.resize(800, 200);
        assert_abs_diff_eq!(viewport.mapper().x_ratio(), 800.0 / 4096.0);
        assert_abs_diff_eq!(viewport.mapper().y_ratio(), 100.0);

        viewport.set_max_amplitude(0.5);
        assert_abs_diff_eq!(viewport.mapper().y_ratio(), 200.0);

        viewport.set_min_sample_index(2048);
        assert_abs_diff_eq!(viewport.mapper().x_ratio(), 800.0 / 2048.0);

        viewport.set_max_sample_index(3072);
        assert_abs_diff_eq!(viewport.mapper().x_ratio(), 800.0 / 1024.0);

        viewport.resize(400, 100);
        assert_abs_diff_eq!(viewport.mapper().x_ratio(), 400.0 / 1024.0);
        assert_abs_diff_eq!(viewport.mapper().y_ratio(), 100.0);
    }

    #[test]
    fn test_invalid_amplitude_ignored() {
        let mut viewport = ViewportConfig::new();
        viewport.set_max_amplitude(0.0);
        viewport.set_max_amplitude(-1.0);
        viewport.set_max_amplitude(f32::NAN);
        assert_eq!(viewport.max_amplitude(), 1.0);
    }

    #[test]
    fn test_revision_changes_on_update() {
        let mut viewport = ViewportConfig::new();
        let before = viewport.revision();
        viewport.resize(10, 10);
        assert!(viewport.revision() > before);

        let after_resize = viewport.revision();
        viewport.resize(10, 10);
        assert_eq!(viewport.revision(), after_resize);

        viewport.set_aggregation_mode(AggregationMode::Average);
        assert!(viewport.revision() > after_resize);
    }
}
