//! The oscilloscope widget: owns the view state and the capture hand-off
//! for one attached frame source.

use super::aggregate::{AggregationMode, AggregationRenderer, TracePoint};
use super::capture::{CaptureBuffer, CaptureListener, FrameBlock, RepaintSignal};
use super::readout::{PointerReadout, ReadoutLabel};
use super::scale::{ScaleCache, ScaleLayout, DEFAULT_MIN_TICK_SPACING_PX};
use super::viewport::ViewportConfig;
use crate::source::{FrameListener, FrameSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Attachment {
    source: Arc<dyn FrameSource>,
    capture: Arc<CaptureBuffer>,
    listener: Arc<dyn FrameListener>,
}

/// Everything needed to draw one frame.
pub struct ScopeFrame<'a> {
    pub width_px: u32,
    pub height_px: u32,
    pub scale: &'a ScaleLayout,
    pub traces: &'a [Vec<TracePoint>],
    pub readout: Option<ReadoutLabel>,
}

/// Multi-channel waveform display.
///
/// Holds the attached source between [`attach`](Self::attach) and
/// [`detach`](Self::detach). Reading or drawing the capture without an
/// attached source is a contract violation and panics.
pub struct Oscilloscope {
    viewport: ViewportConfig,
    readout: PointerReadout,
    attachment: Option<Attachment>,
    repaint: Arc<RepaintSignal>,
    hold: Arc<AtomicBool>,
    snapshot: FrameBlock,
    renderer: AggregationRenderer,
    scale: ScaleCache,
    min_tick_spacing_px: u32,
}

impl Default for Oscilloscope {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscilloscope {
    pub fn new() -> Self {
        Self {
            viewport: ViewportConfig::new(),
            readout: PointerReadout::new(),
            attachment: None,
            repaint: Arc::new(RepaintSignal::default()),
            hold: Arc::new(AtomicBool::new(false)),
            snapshot: FrameBlock::new(0, 0),
            renderer: AggregationRenderer::new(),
            scale: ScaleCache::new(),
            min_tick_spacing_px: DEFAULT_MIN_TICK_SPACING_PX,
        }
    }

    /// Starts listening to `source`, replacing any previous source.
    ///
    /// The capture buffer is sized from the source's channel count and
    /// block size, which must be final by now.
    pub fn attach(&mut self, source: Arc<dyn FrameSource>) {
        self.detach();

        let channel_count = source.channel_count();
        let block_size = source.max_block_size();
        let capture = Arc::new(CaptureBuffer::new(channel_count, block_size));
        let listener: Arc<dyn FrameListener> = Arc::new(CaptureListener::new(
            source.id(),
            Arc::clone(&capture),
            Arc::clone(&self.repaint),
            Arc::clone(&self.hold),
        ));

        source.register_frame_listener(Arc::clone(&listener));
        self.snapshot = capture.empty_snapshot();
        self.viewport.set_block_size_limit(block_size);
        self.repaint.request();

        tracing::info!(
            "Attached frame source: {} channels, block size {}",
            channel_count,
            block_size
        );

        self.attachment = Some(Attachment {
            source,
            capture,
            listener,
        });
    }

    /// Stops listening to the current source. No-op when detached.
    pub fn detach(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            attachment
                .source
                .deregister_frame_listener(&attachment.listener);
            tracing::info!("Detached frame source");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn set_max_amplitude(&mut self, amplitude_max: f32) {
        self.viewport.set_max_amplitude(amplitude_max);
    }

    pub fn max_amplitude(&self) -> f32 {
        self.viewport.max_amplitude()
    }

    pub fn set_min_sample_index(&mut self, index: usize) {
        self.viewport.set_min_sample_index(index);
    }

    pub fn min_sample_index(&self) -> usize {
        self.viewport.min_sample_index()
    }

    /// Clamped to the attached source's block size.
    pub fn set_max_sample_index(&mut self, index: usize) {
        self.viewport.set_max_sample_index(index);
    }

    pub fn max_sample_index(&self) -> usize {
        self.viewport.max_sample_index()
    }

    pub fn set_aggregation_mode(&mut self, mode: AggregationMode) {
        self.viewport.set_aggregation_mode(mode);
    }

    pub fn aggregation_mode(&self) -> AggregationMode {
        self.viewport.aggregation_mode()
    }

    pub fn set_min_tick_spacing_px(&mut self, spacing_px: u32) {
        self.min_tick_spacing_px = spacing_px.max(1);
    }

    /// Block size of the attached source, if any.
    pub fn block_size(&self) -> Option<usize> {
        self.attachment
            .as_ref()
            .map(|attachment| attachment.capture.block_size())
    }

    /// Freezes the trace on the last captured block.
    pub fn set_hold(&mut self, hold: bool) {
        self.hold.store(hold, Ordering::Relaxed);
        self.repaint.request();
    }

    pub fn is_held(&self) -> bool {
        self.hold.load(Ordering::Relaxed)
    }

    /// Returns whether a new frame arrived since the last call.
    pub fn take_repaint_request(&self) -> bool {
        self.repaint.take()
    }

    /// Resize notification, in surface pixels.
    pub fn resized(&mut self, width_px: u32, height_px: u32) {
        self.viewport.resize(width_px, height_px);
    }

    pub fn pointer_moved(&mut self, x_px: i32, y_px: i32) {
        self.readout.pointer_moved(x_px, y_px);
    }

    pub fn pointer_exited(&mut self) {
        self.readout.pointer_exited();
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    pub fn pointer_readout(&self) -> &PointerReadout {
        &self.readout
    }

    /// Copies the latest captured block into the private snapshot.
    ///
    /// # Panics
    ///
    /// When no source is attached.
    pub fn refresh_snapshot(&mut self) -> &FrameBlock {
        let Some(attachment) = &self.attachment else {
            panic!("Oscilloscope: cannot read capture without an attached frame source");
        };
        attachment.capture.read_latest_snapshot(&mut self.snapshot);
        &self.snapshot
    }

    /// Refreshes the snapshot and lays out scale, traces and readout.
    ///
    /// `char_width_px` and `line_height_px` are the text metrics used to
    /// keep the readout label on the surface.
    ///
    /// # Panics
    ///
    /// When no source is attached.
    pub fn prepare_frame(&mut self, char_width_px: f32, line_height_px: f32) -> ScopeFrame<'_> {
        let Some(attachment) = &self.attachment else {
            panic!("Oscilloscope: cannot draw without an attached frame source");
        };
        attachment.capture.read_latest_snapshot(&mut self.snapshot);

        let width_px = self.viewport.width_px();
        let height_px = self.viewport.height_px();
        let traces = self.renderer.render(&self.snapshot, &self.viewport);
        let scale = self.scale.layout(&self.viewport, self.min_tick_spacing_px);
        let readout = self.readout.label(
            self.viewport.mapper(),
            width_px,
            height_px,
            char_width_px,
            line_height_px,
        );

        ScopeFrame {
            width_px,
            height_px,
            scale,
            traces,
            readout,
        }
    }
}

impl Drop for Oscilloscope {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FrameProbe;

    fn attached(channels: usize, block_size: usize) -> (Oscilloscope, Arc<FrameProbe>, crate::source::ProbeWriter) {
        let (probe, writer) = FrameProbe::new(channels, block_size);
        let mut scope = Oscilloscope::new();
        scope.attach(probe.clone());
        scope.resized(800, 200);
        (scope, probe, writer)
    }

    #[test]
    fn test_max_index_clamped_to_block_size() {
        let (mut scope, _probe, _writer) = attached(2, 4096);
        assert_eq!(scope.max_sample_index(), 4096);

        scope.set_max_sample_index(10_000);
        assert_eq!(scope.max_sample_index(), 4096);

        scope.set_max_sample_index(1024);
        assert_eq!(scope.max_sample_index(), 1024);
    }

    #[test]
    fn test_sample_range_never_inverts() {
        let (mut scope, _probe, _writer) = attached(1, 4096);
        scope.set_min_sample_index(5000);
        assert_eq!(scope.min_sample_index(), 4095);

        scope.set_max_sample_index(0);
        assert_eq!(scope.max_sample_index(), 4096);
        assert!(scope.min_sample_index() < scope.max_sample_index());
    }

    #[test]
    fn test_attach_detach_is_symmetric() {
        let (mut scope, probe, _writer) = attached(1, 64);
        assert!(scope.is_attached());
        assert_eq!(probe.listener_count(), 1);

        scope.detach();
        assert!(!scope.is_attached());
        assert_eq!(probe.listener_count(), 0);

        // detaching twice is harmless
        scope.detach();
        assert_eq!(probe.listener_count(), 0);
    }

    #[test]
    fn test_reattach_drops_previous_listener() {
        let (mut scope, first, _first_writer) = attached(1, 64);
        let (second, _second_writer) = FrameProbe::new(2, 128);

        scope.attach(second.clone());
        assert_eq!(first.listener_count(), 0);
        assert_eq!(second.listener_count(), 1);
        assert_eq!(scope.block_size(), Some(128));
        assert_eq!(scope.refresh_snapshot().channel_count(), 2);
    }

    #[test]
    fn test_drop_deregisters() {
        let (scope, probe, _writer) = attached(1, 64);
        drop(scope);
        assert_eq!(probe.listener_count(), 0);
    }

    #[test]
    #[should_panic(expected = "without an attached frame source")]
    fn test_drawing_unattached_panics() {
        let mut scope = Oscilloscope::new();
        scope.resized(800, 200);
        let _ = scope.prepare_frame(2.0, 4.0);
    }

    #[test]
    #[should_panic(expected = "without an attached frame source")]
    fn test_reading_unattached_panics() {
        let mut scope = Oscilloscope::new();
        scope.refresh_snapshot();
    }

    #[test]
    fn test_frames_reach_snapshot_and_request_repaint() {
        let (mut scope, _probe, mut writer) = attached(2, 4);
        assert!(scope.take_repaint_request(), "attach requests a first paint");
        assert!(!scope.take_repaint_request());

        writer.push_interleaved(&[0.1f32, -0.1, 0.2, -0.2, 0.3, -0.3, 0.4, -0.4], |s| s);
        assert!(scope.take_repaint_request());

        let snapshot = scope.refresh_snapshot();
        assert_eq!(snapshot.channel(0), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(snapshot.channel(1), &[-0.1, -0.2, -0.3, -0.4]);
    }

    #[test]
    fn test_hold_freezes_snapshot() {
        let (mut scope, _probe, mut writer) = attached(1, 2);
        writer.push_interleaved(&[0.5f32, 0.5], |s| s);

        scope.set_hold(true);
        assert!(scope.is_held());
        scope.take_repaint_request();

        writer.push_interleaved(&[0.9f32, 0.9], |s| s);
        assert!(!scope.take_repaint_request());
        assert_eq!(scope.refresh_snapshot().channel(0), &[0.5, 0.5]);

        scope.set_hold(false);
        writer.push_interleaved(&[0.7f32, 0.7], |s| s);
        assert_eq!(scope.refresh_snapshot().channel(0), &[0.7, 0.7]);
    }

    #[test]
    fn test_prepare_frame_lays_out_everything() {
        let (mut scope, _probe, _writer) = attached(2, 4096);
        scope.pointer_moved(0, 0);

        let frame = scope.prepare_frame(2.0, 4.0);
        assert_eq!((frame.width_px, frame.height_px), (800, 200));
        assert_eq!(frame.traces.len(), 2);
        assert_eq!(frame.scale.amplitude_ticks.len(), 8);
        assert_eq!(frame.scale.time_ticks.len(), 16);
        assert_eq!(frame.readout.map(|label| label.text), Some("0, 1.0".to_string()));
    }

    #[test]
    fn test_setters_delegate_to_viewport() {
        let (mut scope, _probe, _writer) = attached(1, 4096);
        scope.set_max_amplitude(0.5);
        scope.set_min_sample_index(512);
        scope.set_aggregation_mode(AggregationMode::Average);

        assert_eq!(scope.max_amplitude(), 0.5);
        assert_eq!(scope.min_sample_index(), 512);
        assert_eq!(scope.aggregation_mode(), AggregationMode::Average);
        assert_eq!(scope.viewport().min_sample_index(), 512);
    }
}
