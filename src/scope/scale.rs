//! Background grid and axis labels.
//!
//! Each axis picks the largest tick count from a fixed candidate set that
//! keeps ticks at least `min_spacing_px` apart. Every tick gets a label;
//! every tick but the first gets a grid line, the first one coincides with
//! the plot border.

use super::viewport::ViewportConfig;

pub const DEFAULT_MIN_TICK_SPACING_PX: u32 = 25;

/// Amplitude axis: eighths, quarters or halves.
pub const AMPLITUDE_TICK_CANDIDATES: [u32; 3] = [8, 4, 2];
/// Time axis.
pub const TIME_TICK_CANDIDATES: [u32; 4] = [16, 8, 4, 2];

/// Largest candidate whose spacing stays at or above `min_spacing_px`,
/// falling back to the smallest candidate.
pub fn choose_tick_count(extent_px: u32, min_spacing_px: u32, candidates: &[u32]) -> u32 {
    let max_ticks = extent_px / min_spacing_px.max(1);
    candidates
        .iter()
        .copied()
        .find(|&candidate| max_ticks >= candidate)
        .or_else(|| candidates.iter().copied().min())
        .unwrap_or(1)
        .max(1)
}

/// Amplitude label text with one decimal.
pub fn format_amplitude(amplitude: f32) -> String {
    // Avoid "-0.0" for values that round to zero
    let amplitude = if amplitude.abs() < 0.05 { 0.0 } else { amplitude };
    format!("{amplitude:.1}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Offset along the axis: y for amplitude ticks, x for time ticks
    pub position_px: f32,
    pub label: String,
    pub draws_line: bool,
}

/// Grid geometry and labels for one viewport state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleLayout {
    pub width_px: u32,
    pub height_px: u32,
    pub amplitude_ticks: Vec<Tick>,
    pub time_ticks: Vec<Tick>,
}

impl ScaleLayout {
    pub fn compute(viewport: &ViewportConfig, min_spacing_px: u32) -> Self {
        let mapper = viewport.mapper();
        let width = viewport.width_px();
        let height = viewport.height_px();

        let amplitude_count = choose_tick_count(height, min_spacing_px, &AMPLITUDE_TICK_CANDIDATES);
        let amplitude_ticks = (0..amplitude_count)
            .map(|t| {
                let y = height as f32 / amplitude_count as f32 * t as f32;
                Tick {
                    position_px: y,
                    label: format_amplitude(mapper.amplitude_from_pixel_y(y)),
                    draws_line: t > 0,
                }
            })
            .collect();

        let time_count = choose_tick_count(width, min_spacing_px, &TIME_TICK_CANDIDATES);
        let time_ticks = (0..time_count)
            .map(|t| {
                let x = width as f32 / time_count as f32 * t as f32;
                Tick {
                    position_px: x,
                    label: mapper.sample_index_from_pixel_x(x).to_string(),
                    draws_line: t > 0,
                }
            })
            .collect();

        Self {
            width_px: width,
            height_px: height,
            amplitude_ticks,
            time_ticks,
        }
    }

    /// Positions of horizontal grid lines (y).
    pub fn horizontal_lines(&self) -> impl Iterator<Item = f32> + '_ {
        self.amplitude_ticks
            .iter()
            .filter(|tick| tick.draws_line)
            .map(|tick| tick.position_px)
    }

    /// Positions of vertical grid lines (x).
    pub fn vertical_lines(&self) -> impl Iterator<Item = f32> + '_ {
        self.time_ticks
            .iter()
            .filter(|tick| tick.draws_line)
            .map(|tick| tick.position_px)
    }
}

/// Static background layer, rebuilt only when the viewport changes.
#[derive(Debug, Default)]
pub struct ScaleCache {
    key: Option<(u64, u32)>,
    layout: ScaleLayout,
}

impl ScaleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&mut self, viewport: &ViewportConfig, min_spacing_px: u32) -> &ScaleLayout {
        let key = (viewport.revision(), min_spacing_px);
        if self.key != Some(key) {
            self.layout = ScaleLayout::compute(viewport, min_spacing_px);
            self.key = Some(key);
        }
        &self.layout
    }
}
