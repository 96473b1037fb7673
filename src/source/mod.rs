//! Frame sources feeding the oscilloscope.
//!
//! A frame source produces fixed-size blocks of multi-channel audio on a
//! real-time thread and notifies registered listeners each time a new block
//! is ready. Listeners pull the block out one channel at a time with
//! [`FrameSource::copy_samples_for_channel`].
//!
//! Two producers are provided: [`InputSource`] captures from a cpal input
//! device and [`ToneSource`] synthesizes a deterministic test signal.

pub mod input;
pub mod probe;
pub mod tone;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use input::InputSource;
pub use probe::{FrameProbe, ProbeWriter};
pub use tone::ToneSource;

/// Identifies one source instance so a listener shared between several
/// sources can tell which one fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        SourceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Receives fresh-frame notifications.
///
/// Called on the audio thread: implementations must not block on anything
/// unbounded, allocate, or log.
pub trait FrameListener: Send + Sync {
    fn frame_ready(&self, source: &dyn FrameSource);
}

/// Producer of fixed-size multi-channel sample blocks.
///
/// `channel_count` and `max_block_size` are fixed for the lifetime of the
/// source.
pub trait FrameSource: Send + Sync {
    fn id(&self) -> SourceId;

    fn channel_count(&self) -> usize;

    fn max_block_size(&self) -> usize;

    fn register_frame_listener(&self, listener: Arc<dyn FrameListener>);

    /// Removes a listener previously registered with
    /// [`register_frame_listener`](Self::register_frame_listener). Unknown
    /// listeners are ignored.
    fn deregister_frame_listener(&self, listener: &Arc<dyn FrameListener>);

    /// Copies the latest block of `channel` into `destination`.
    ///
    /// Bounded-time and safe to call from the audio thread. Copies at most
    /// `min(destination.len(), max_block_size())` samples; an out-of-range
    /// channel leaves `destination` untouched.
    fn copy_samples_for_channel(&self, destination: &mut [f32], channel: usize);
}
