//! Lock-guarded staging buffer between the audio thread and the
//! presentation thread.
//!
//! The audio thread writes one channel's block at a time, holding the lock
//! only for the copy. The presentation thread takes a private copy of the
//! whole buffer under the same lock and draws from that copy. Neither side
//! allocates, formats, or logs while holding the lock.

use crate::source::{FrameListener, FrameSource, SourceId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fixed-size block of samples, one vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBlock {
    channels: Vec<Vec<f32>>,
}

impl FrameBlock {
    /// Zero-filled block.
    pub fn new(channel_count: usize, block_size: usize) -> Self {
        Self {
            channels: vec![vec![0.0; block_size]; channel_count],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn block_size(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel]
    }

    fn has_shape_of(&self, other: &FrameBlock) -> bool {
        self.channel_count() == other.channel_count() && self.block_size() == other.block_size()
    }
}

/// Latest block per channel, sized once when a source is attached.
pub struct CaptureBuffer {
    block: Mutex<FrameBlock>,
    channel_count: usize,
    block_size: usize,
}

impl CaptureBuffer {
    pub fn new(channel_count: usize, block_size: usize) -> Self {
        Self {
            block: Mutex::new(FrameBlock::new(channel_count, block_size)),
            channel_count,
            block_size,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Copies `data` into `channel`, truncated to the block size.
    pub fn write_channel_block(&self, channel: usize, data: &[f32]) {
        self.write_channel_with(channel, |destination| {
            let len = destination.len().min(data.len());
            destination[..len].copy_from_slice(&data[..len]);
        });
    }

    /// Runs `fill` on the storage of `channel` while holding the lock.
    ///
    /// Out-of-range channels are ignored.
    pub fn write_channel_with(&self, channel: usize, fill: impl FnOnce(&mut [f32])) {
        if channel >= self.channel_count {
            return;
        }
        let mut block = self.block.lock();
        fill(block.channel_mut(channel));
    }

    /// Copies the whole buffer into `destination`.
    ///
    /// `destination` should come from [`empty_snapshot`](Self::empty_snapshot)
    /// so the copy never allocates under the lock.
    pub fn read_latest_snapshot(&self, destination: &mut FrameBlock) {
        let block = self.block.lock();
        if destination.has_shape_of(&block) {
            for (dst, src) in destination.channels.iter_mut().zip(&block.channels) {
                dst.copy_from_slice(src);
            }
        } else {
            destination.clone_from(&block);
        }
    }

    /// A zeroed block with this buffer's shape.
    pub fn empty_snapshot(&self) -> FrameBlock {
        FrameBlock::new(self.channel_count, self.block_size)
    }
}

/// Coalescing "please redraw" flag.
///
/// Set once per accepted frame notification; the presentation loop
/// consumes it at its own pace.
#[derive(Debug, Default)]
pub struct RepaintSignal {
    requested: AtomicBool,
}

impl RepaintSignal {
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Returns whether a repaint was requested since the last call.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::Acquire)
    }
}

/// Copies fresh frames from one specific source into a [`CaptureBuffer`].
///
/// Registered with the source on attach and removed again on detach.
pub struct CaptureListener {
    source_id: SourceId,
    capture: Arc<CaptureBuffer>,
    repaint: Arc<RepaintSignal>,
    hold: Arc<AtomicBool>,
}

impl CaptureListener {
    pub fn new(
        source_id: SourceId,
        capture: Arc<CaptureBuffer>,
        repaint: Arc<RepaintSignal>,
        hold: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source_id,
            capture,
            repaint,
            hold,
        }
    }
}

impl FrameListener for CaptureListener {
    fn frame_ready(&self, source: &dyn FrameSource) {
        if source.id() != self.source_id || self.hold.load(Ordering::Relaxed) {
            return;
        }

        for channel in 0..self.capture.channel_count() {
            self.capture.write_channel_with(channel, |destination| {
                source.copy_samples_for_channel(destination, channel)
            });
        }
        self.repaint.request();
    }
}
