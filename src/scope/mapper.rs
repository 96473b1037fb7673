//! Sample/amplitude space to pixel space conversions.
//!
//! Pixel origin is the top-left corner of the drawing surface, y grows
//! downwards. Amplitude `+amplitude_max` maps to the top edge and
//! `-amplitude_max` to the bottom edge.

/// Conversion parameters derived from a viewport.
///
/// Built by [`ViewportConfig`](super::viewport::ViewportConfig) whenever a
/// view parameter or the surface size changes, so the ratios are never
/// stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    amplitude_max: f32,
    min_sample_index: usize,
    x_ratio: f32,
    /// Samples per pixel, kept in f64 so tick positions land on whole indices
    x_ratio_inv: f64,
    y_ratio: f32,
    y_ratio_inv: f32,
}

impl CoordinateMapper {
    /// Derives ratios for the given view and surface size.
    ///
    /// Surface extents and the sample span are clamped to at least one so
    /// degenerate geometry never divides by zero.
    pub fn new(
        amplitude_max: f32,
        min_sample_index: usize,
        max_sample_index: usize,
        width_px: u32,
        height_px: u32,
    ) -> Self {
        let span = max_sample_index.saturating_sub(min_sample_index).max(1);
        let width = width_px.max(1) as f32;
        let height = height_px.max(1) as f32;

        let x_ratio = width / span as f32;
        let y_ratio = height / (amplitude_max * 2.0);

        Self {
            amplitude_max,
            min_sample_index,
            x_ratio,
            x_ratio_inv: span as f64 / width as f64,
            y_ratio,
            y_ratio_inv: 1.0 / y_ratio,
        }
    }

    /// Out-of-range amplitudes are clamped so they draw at the plot edge.
    pub fn pixel_y_from_amplitude(&self, amplitude: f32) -> f32 {
        (self.amplitude_max - amplitude.clamp(-self.amplitude_max, self.amplitude_max)) * self.y_ratio
    }

    /// Not clamped: a pointer outside the plot reports out-of-range values.
    pub fn amplitude_from_pixel_y(&self, y_px: f32) -> f32 {
        self.amplitude_max - y_px * self.y_ratio_inv
    }

    pub fn pixel_x_from_sample_index(&self, index: usize) -> f32 {
        (index as f32 - self.min_sample_index as f32) * self.x_ratio
    }

    pub fn sample_index_from_pixel_x(&self, x_px: f32) -> usize {
        (x_px as f64 * self.x_ratio_inv).floor().max(0.0) as usize + self.min_sample_index
    }

    /// Pixels per sample.
    pub fn x_ratio(&self) -> f32 {
        self.x_ratio
    }

    /// Pixels per unit of amplitude.
    pub fn y_ratio(&self) -> f32 {
        self.y_ratio
    }
}
