//! Live capture from an audio input device.
//!
//! Opens a cpal input stream on the configured device at its native format
//! and feeds every callback buffer into a [`FrameProbe`]. The callback only
//! converts samples and copies them into pre-allocated storage.

use super::probe::{FrameProbe, ProbeWriter};
use super::FrameSource;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::Arc;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Frame source capturing from a specified or default input device.
///
/// The stream stays open for as long as this value lives.
pub struct InputSource {
    probe: Arc<FrameProbe>,
    /// Active input stream (kept alive while capturing)
    _stream: cpal::Stream,
    device_name: String,
    sample_rate: u32,
}

impl InputSource {
    /// Opens the device and starts streaming into a new probe.
    ///
    /// # Arguments
    /// * `device_spec` - "default", a device name, or a numeric index from `wavescope list-devices`
    /// * `block_size` - Samples per channel in each delivered block
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If the device reports an unsupported sample format
    /// - If audio stream creation fails
    pub fn open(device_spec: &str, block_size: usize) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if device_spec == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let sample_format = device_config.sample_format();
        let num_channels = device_config.channels() as usize;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {}",
            sample_rate,
            num_channels,
            sample_format
        );

        let (probe, writer) = FrameProbe::new(num_channels, block_size);
        let stream_config: cpal::StreamConfig = device_config.into();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, writer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, writer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, writer)?,
            other => return Err(anyhow!("Unsupported input sample format: {other}")),
        };

        stream.play()?;
        tracing::debug!(
            "Input stream started: {} channels, block size {}",
            probe.channel_count(),
            probe.max_block_size()
        );

        Ok(Self {
            probe,
            _stream: stream,
            device_name,
            sample_rate,
        })
    }

    pub fn probe(&self) -> Arc<FrameProbe> {
        Arc::clone(&self.probe)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Native sample rate of the device.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut writer: ProbeWriter,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            writer.push_interleaved(data, |s| s.to_sample::<f32>());
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();
        let count = devices.len();

        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'wavescope list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// No ALSA on other platforms, so nothing to suppress.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
