//! List available audio input devices.

use crate::source::input::suppress_alsa_warnings;
use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

/// Lists all audio input devices with the index accepted by `--device`.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let (default_name, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .collect();
        Ok((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    println!("Available audio input devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_indicator = if default_name.as_ref() == Some(&device_name) {
            " [DEFAULT]"
        } else {
            ""
        };

        let config_info = match device.default_input_config() {
            Ok(config) => format!(
                "{}Hz, {} channels, {}",
                config.sample_rate().0,
                config.channels(),
                config.sample_format()
            ),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {device_name}{default_indicator}");
        println!("    Config: {config_info}");
        println!();
    }

    println!("Select one with `wavescope scope --device <ID or name>`.");
    Ok(())
}
