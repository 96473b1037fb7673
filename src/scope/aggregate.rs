//! Sub-pixel aggregation of sample blocks into per-channel polylines.
//!
//! When more than one sample falls into a pixel column the samples are
//! collapsed into one representative value. Each emitted point closes a
//! window of consecutive samples `(previous.sample_index, sample_index]`;
//! the first point is the seed sample on its own. When zoomed in far
//! enough that every sample has its own pixel, each window holds exactly
//! one sample.

use super::capture::FrameBlock;
use super::viewport::ViewportConfig;
use serde::{Deserialize, Serialize};

/// How samples sharing a pixel column are collapsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AggregationMode {
    /// Mean of the window. Smooth, but under-represents transient peaks.
    #[serde(rename = "average")]
    Average,
    /// Sample with the largest magnitude, sign preserved. Keeps the
    /// envelope intact.
    #[default]
    #[serde(rename = "peak")]
    PeakMagnitude,
}

impl AggregationMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Average => Self::PeakMagnitude,
            Self::PeakMagnitude => Self::Average,
        }
    }
}

impl std::fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Average => write!(f, "average"),
            Self::PeakMagnitude => write!(f, "peak"),
        }
    }
}

/// One vertex of a channel trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub x: f32,
    pub y: f32,
    /// Aggregated (unclamped) value drawn at this vertex
    pub amplitude: f32,
    /// Last sample index of the window this vertex closes
    pub sample_index: usize,
}

/// Builds the trace for one channel into `out`, replacing its contents.
///
/// Covers `[min_sample_index, max_sample_index)` of the viewport, cut to
/// the length of `samples`. Produces nothing for an empty range.
pub fn trace_channel(samples: &[f32], viewport: &ViewportConfig, out: &mut Vec<TracePoint>) {
    out.clear();

    let mapper = viewport.mapper();
    let mode = viewport.aggregation_mode();
    let start = viewport.min_sample_index();
    let end = viewport.max_sample_index().min(samples.len());
    if start >= end {
        return;
    }
    let last = end - 1;

    let mut i = start;
    let mut current_px = mapper.pixel_x_from_sample_index(i);
    out.push(TracePoint {
        x: current_px,
        y: mapper.pixel_y_from_amplitude(samples[i]),
        amplitude: samples[i],
        sample_index: i,
    });

    while i < last {
        let next_px = current_px + 1.0;
        let mut sum = 0.0f32;
        let mut count = 0u32;
        let mut peak = 0.0f32;

        loop {
            i += 1;
            current_px = mapper.pixel_x_from_sample_index(i);

            let sample = samples[i];
            match mode {
                AggregationMode::Average => {
                    sum += sample;
                    count += 1;
                }
                AggregationMode::PeakMagnitude => {
                    if count == 0 || sample.abs() > peak.abs() {
                        peak = sample;
                    }
                    count += 1;
                }
            }

            if i >= last || current_px >= next_px {
                break;
            }
        }

        let amplitude = match mode {
            AggregationMode::Average => sum / count as f32,
            AggregationMode::PeakMagnitude => peak,
        };
        out.push(TracePoint {
            x: current_px,
            y: mapper.pixel_y_from_amplitude(amplitude),
            amplitude,
            sample_index: i,
        });
    }
}

/// Per-channel traces for a whole snapshot, reusing point storage between
/// frames.
#[derive(Debug, Default)]
pub struct AggregationRenderer {
    traces: Vec<Vec<TracePoint>>,
}

impl AggregationRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds one trace per channel of `snapshot`.
    pub fn render(&mut self, snapshot: &FrameBlock, viewport: &ViewportConfig) -> &[Vec<TracePoint>] {
        let channel_count = snapshot.channel_count();
        self.traces.resize_with(channel_count, Vec::new);

        let capacity = viewport.width_px() as usize + 1;
        for (channel, trace) in self.traces.iter_mut().enumerate() {
            trace.reserve(capacity.saturating_sub(trace.len()));
            trace_channel(snapshot.channel(channel), viewport, trace);
        }

        &self.traces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn viewport(block_size: usize, width: u32, height: u32, mode: AggregationMode) -> ViewportConfig {
        let mut viewport = ViewportConfig::new();
        viewport.set_block_size_limit(block_size);
        viewport.resize(width, height);
        viewport.set_aggregation_mode(mode);
        viewport
    }

    /// Deterministic pseudo-random signal in [-1, 1].
    fn noise(len: usize) -> Vec<f32> {
        let mut state = 0x2545_f491u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    fn windows(points: &[TracePoint]) -> impl Iterator<Item = (std::ops::RangeInclusive<usize>, &TracePoint)> {
        points
            .windows(2)
            .map(|pair| (pair[0].sample_index + 1..=pair[1].sample_index, &pair[1]))
    }

    #[test]
    fn test_single_spike_survives_peak_aggregation() {
        let mut samples = vec![0.0f32; 4096];
        samples[2048] = 0.9;
        let viewport = viewport(4096, 800, 200, AggregationMode::PeakMagnitude);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);

        let spikes: Vec<_> = trace.iter().filter(|p| p.amplitude != 0.0).collect();
        assert_eq!(spikes.len(), 1);

        let spike = spikes[0];
        assert_eq!(spike.amplitude, 0.9);
        assert_abs_diff_eq!(spike.y, viewport.mapper().pixel_y_from_amplitude(0.9), epsilon = 1e-4);
        let spike_px = viewport.mapper().pixel_x_from_sample_index(2048);
        assert!(spike.x >= spike_px && spike.x < spike_px + 1.5, "spike drawn at {}", spike.x);

        let zero_y = viewport.mapper().pixel_y_from_amplitude(0.0);
        assert!(trace
            .iter()
            .filter(|p| p.amplitude == 0.0)
            .all(|p| (p.y - zero_y).abs() < 1e-4));
    }

    #[test]
    fn test_average_smooths_single_spike() {
        let mut samples = vec![0.0f32; 4096];
        samples[2048] = 0.9;
        let viewport = viewport(4096, 800, 200, AggregationMode::Average);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);

        let spike = trace.iter().find(|p| p.amplitude != 0.0).unwrap();
        assert!(spike.amplitude > 0.0 && spike.amplitude < 0.9);
    }

    #[test]
    fn test_every_sample_lands_in_exactly_one_window() {
        let samples = noise(4096);
        let viewport = viewport(4096, 777, 200, AggregationMode::PeakMagnitude);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);

        assert_eq!(trace.first().unwrap().sample_index, 0);
        assert_eq!(trace.last().unwrap().sample_index, 4095);
        assert!(trace.windows(2).all(|pair| pair[1].sample_index > pair[0].sample_index));
        assert!(trace.len() <= 777 + 2);
    }

    #[test]
    fn test_peak_window_value_dominates_inputs() {
        let samples = noise(4096);
        let viewport = viewport(4096, 300, 200, AggregationMode::PeakMagnitude);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);

        for (window, point) in windows(&trace) {
            let max_magnitude = samples[window.clone()].iter().fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(point.amplitude.abs() >= max_magnitude);
            assert!(samples[window].contains(&point.amplitude));
        }
    }

    #[test]
    fn test_average_window_value_within_bounds() {
        let samples = noise(4096);
        let viewport = viewport(4096, 300, 200, AggregationMode::Average);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);

        for (window, point) in windows(&trace) {
            let slice = &samples[window];
            let min = slice.iter().copied().fold(f32::INFINITY, f32::min);
            let max = slice.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            assert!(point.amplitude >= min - 1e-6 && point.amplitude <= max + 1e-6);
        }
    }

    #[test]
    fn test_zoomed_in_advances_one_sample_per_point() {
        let samples = noise(256);
        let mut viewport = viewport(256, 800, 200, AggregationMode::Average);
        viewport.set_min_sample_index(100);
        viewport.set_max_sample_index(140);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);

        assert_eq!(trace.len(), 40);
        for (offset, point) in trace.iter().enumerate() {
            assert_eq!(point.sample_index, 100 + offset);
            assert_eq!(point.amplitude, samples[100 + offset]);
        }
        assert_eq!(trace[0].x, 0.0);
        assert_abs_diff_eq!(trace[1].x, 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let mut snapshot = FrameBlock::new(2, 1024);
        snapshot.channel_mut(0).copy_from_slice(&noise(1024));
        snapshot.channel_mut(1).copy_from_slice(&noise(2048)[1024..]);
        let viewport = viewport(1024, 640, 200, AggregationMode::PeakMagnitude);

        let mut renderer = AggregationRenderer::new();
        let first = renderer.render(&snapshot, &viewport).to_vec();
        let second = renderer.render(&snapshot, &viewport).to_vec();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_range_produces_no_points() {
        // snapshot shorter than the visible range
        let samples = noise(32);
        let mut viewport = viewport(64, 100, 100, AggregationMode::PeakMagnitude);
        viewport.set_min_sample_index(40);

        let mut trace = vec![TracePoint { x: 1.0, y: 1.0, amplitude: 0.0, sample_index: 0 }];
        trace_channel(&samples, &viewport, &mut trace);
        assert!(trace.is_empty());
    }

    #[test]
    fn test_single_sample_range_is_one_point() {
        let samples = noise(64);
        let mut viewport = viewport(64, 100, 100, AggregationMode::PeakMagnitude);
        viewport.set_min_sample_index(10);
        viewport.set_max_sample_index(11);

        let mut trace = Vec::new();
        trace_channel(&samples, &viewport, &mut trace);
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].sample_index, 10);
    }

    #[test]
    fn test_mode_toggle_and_display() {
        assert_eq!(AggregationMode::Average.toggled(), AggregationMode::PeakMagnitude);
        assert_eq!(AggregationMode::PeakMagnitude.toggled(), AggregationMode::Average);
        assert_eq!(AggregationMode::PeakMagnitude.to_string(), "peak");
    }
}
