//! Synthetic test-tone source.
//!
//! Generates one sine per channel (channel `n` at `BASE_FREQUENCY * (n + 1)`)
//! plus a single-sample spike on channel 0 four times a second, paced in
//! real time on a background thread. Lets the scope run without audio
//! hardware.

use super::probe::{FrameProbe, ProbeWriter};
use super::FrameSource;
use anyhow::anyhow;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const BASE_FREQUENCY: f32 = 110.0;
const TONE_AMPLITUDE: f32 = 0.5;
const SPIKE_AMPLITUDE: f32 = 0.9;
const SPIKES_PER_SECOND: u32 = 4;
/// Frames generated per wake-up of the producer thread
const CHUNK_FRAMES: usize = 256;

/// Deterministic interleaved test-signal generator.
pub struct ToneGenerator {
    channel_count: usize,
    sample_rate: u32,
    frame_index: u64,
}

impl ToneGenerator {
    pub fn new(channel_count: usize, sample_rate: u32) -> Self {
        Self {
            channel_count: channel_count.max(1),
            sample_rate: sample_rate.max(1),
            frame_index: 0,
        }
    }

    /// Fills `out` with interleaved frames; a trailing partial frame is left
    /// untouched.
    pub fn fill(&mut self, out: &mut [f32]) {
        let spike_period = u64::from((self.sample_rate / SPIKES_PER_SECOND).max(1));
        let rate = self.sample_rate as f32;

        for frame in out.chunks_exact_mut(self.channel_count) {
            // Wrap the phase each second to keep f32 precision
            let t = (self.frame_index % u64::from(self.sample_rate)) as f32 / rate;
            for (channel, sample) in frame.iter_mut().enumerate() {
                let frequency = BASE_FREQUENCY * (channel + 1) as f32;
                *sample = TONE_AMPLITUDE * (TAU * frequency * t).sin();
            }
            if self.frame_index % spike_period == spike_period / 2 {
                frame[0] = SPIKE_AMPLITUDE;
            }
            self.frame_index += 1;
        }
    }
}

/// Frame source backed by a [`ToneGenerator`] running on its own thread.
pub struct ToneSource {
    probe: Arc<FrameProbe>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ToneSource {
    /// Starts the producer thread.
    ///
    /// # Errors
    /// - If the thread cannot be spawned
    pub fn start(channel_count: usize, block_size: usize, sample_rate: u32) -> anyhow::Result<Self> {
        let (probe, writer) = FrameProbe::new(channel_count, block_size);
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("wavescope-tone".to_string())
            .spawn(move || run_generator(writer, sample_rate, thread_running))
            .map_err(|e| anyhow!("Failed to start tone generator thread: {e}"))?;

        tracing::info!(
            "Tone source started: {} channels, {}Hz, block size {}",
            probe.channel_count(),
            sample_rate,
            probe.max_block_size()
        );

        Ok(Self {
            probe,
            running,
            handle: Some(handle),
        })
    }

    pub fn probe(&self) -> Arc<FrameProbe> {
        Arc::clone(&self.probe)
    }

    /// Stops the producer thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Tone generator thread panicked");
            }
            tracing::debug!("Tone source stopped");
        }
    }
}

impl Drop for ToneSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_generator(mut writer: ProbeWriter, sample_rate: u32, running: Arc<AtomicBool>) {
    let channel_count = writer.probe().channel_count();
    let mut generator = ToneGenerator::new(channel_count, sample_rate);
    let mut chunk = vec![0.0f32; CHUNK_FRAMES * channel_count];
    let chunk_duration = Duration::from_secs_f64(CHUNK_FRAMES as f64 / f64::from(sample_rate.max(1)));
    let mut deadline = Instant::now();

    while running.load(Ordering::Relaxed) {
        generator.fill(&mut chunk);
        writer.push_interleaved(&chunk, |s| s);

        deadline += chunk_duration;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        } else {
            // Fell behind; resynchronize instead of bursting
            deadline = now;
        }
    }
}
