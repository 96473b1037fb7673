//! Block-latching frame source shared by every producer.
//!
//! The audio thread owns a [`ProbeWriter`] which de-interleaves incoming
//! samples into a private pending block. When the pending block is full it
//! is copied into the probe's shared storage under a short lock and the
//! registered listeners are notified. Readers only ever see complete
//! blocks.

use super::{FrameListener, FrameSource, SourceId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared half of a probe: latest complete block plus listener registry.
pub struct FrameProbe {
    id: SourceId,
    channel_count: usize,
    block_size: usize,
    /// Latest complete block, one `block_size` vector per channel
    latest: Mutex<Vec<Vec<f32>>>,
    listeners: RwLock<Vec<Arc<dyn FrameListener>>>,
    blocks_delivered: AtomicU64,
}

impl FrameProbe {
    /// Creates a probe and the writer half that feeds it.
    ///
    /// Zero channel counts or block sizes are raised to one so the storage
    /// is never empty.
    pub fn new(channel_count: usize, block_size: usize) -> (Arc<Self>, ProbeWriter) {
        let channel_count = channel_count.max(1);
        let block_size = block_size.max(1);

        let probe = Arc::new(FrameProbe {
            id: SourceId::next(),
            channel_count,
            block_size,
            latest: Mutex::new(vec![vec![0.0; block_size]; channel_count]),
            listeners: RwLock::new(Vec::new()),
            blocks_delivered: AtomicU64::new(0),
        });

        let writer = ProbeWriter {
            probe: Arc::clone(&probe),
            pending: vec![vec![0.0; block_size]; channel_count],
            fill: 0,
        };

        tracing::debug!(
            "Frame probe created: {} channels, block size {}",
            channel_count,
            block_size
        );

        (probe, writer)
    }

    /// Number of complete blocks latched since creation.
    pub fn blocks_delivered(&self) -> u64 {
        self.blocks_delivered.load(Ordering::Relaxed)
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl FrameSource for FrameProbe {
    fn id(&self) -> SourceId {
        self.id
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn max_block_size(&self) -> usize {
        self.block_size
    }

    fn register_frame_listener(&self, listener: Arc<dyn FrameListener>) {
        self.listeners.write().push(listener);
    }

    fn deregister_frame_listener(&self, listener: &Arc<dyn FrameListener>) {
        let target = Arc::as_ptr(listener) as *const ();
        self.listeners
            .write()
            .retain(|registered| Arc::as_ptr(registered) as *const () != target);
    }

    fn copy_samples_for_channel(&self, destination: &mut [f32], channel: usize) {
        let latest = self.latest.lock();
        if let Some(block) = latest.get(channel) {
            let len = destination.len().min(block.len());
            destination[..len].copy_from_slice(&block[..len]);
        }
    }
}

/// Audio-thread half of a [`FrameProbe`].
///
/// Never allocates after construction.
pub struct ProbeWriter {
    probe: Arc<FrameProbe>,
    pending: Vec<Vec<f32>>,
    fill: usize,
}

impl ProbeWriter {
    /// Appends interleaved frames, converting each sample with `convert`.
    ///
    /// A trailing partial frame is ignored.
    pub fn push_interleaved<T: Copy>(&mut self, data: &[T], convert: impl Fn(T) -> f32) {
        let channels = self.probe.channel_count;

        for frame in data.chunks_exact(channels) {
            for (channel, &sample) in frame.iter().enumerate() {
                self.pending[channel][self.fill] = convert(sample);
            }
            self.fill += 1;

            if self.fill == self.probe.block_size {
                self.latch();
                self.fill = 0;
            }
        }
    }

    /// Shared probe this writer feeds.
    pub fn probe(&self) -> &Arc<FrameProbe> {
        &self.probe
    }

    fn latch(&mut self) {
        {
            let mut latest = self.probe.latest.lock();
            for (dst, src) in latest.iter_mut().zip(&self.pending) {
                dst.copy_from_slice(src);
            }
        }
        self.probe.blocks_delivered.fetch_add(1, Ordering::Relaxed);

        // Skip this notification rather than wait on a registration in progress
        if let Some(listeners) = self.probe.listeners.try_read() {
            for listener in listeners.iter() {
                listener.frame_ready(&*self.probe);
            }
        }
    }
}
