//! Live oscilloscope view.
//!
//! Attaches a frame source to an [`Oscilloscope`] and runs the terminal
//! loop: input is handled as it arrives, and redraws are paced at the
//! configured refresh rate so bursts of frame notifications collapse into
//! one redraw.

use crate::config::{DisplayConfig, ScopeConfig};
use crate::scope::Oscilloscope;
use crate::source::{FrameSource, InputSource, ToneSource};
use crate::ui::{show_error_screen, ScopeCommand, ScopeTui};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Channels synthesized by the demo source.
const DEMO_CHANNELS: usize = 2;

const MIN_AMPLITUDE: f32 = 1.0 / 64.0;
const MAX_AMPLITUDE: f32 = 64.0;
/// Narrowest visible sample span reachable by zooming.
const MIN_SAMPLE_SPAN: usize = 16;

/// Result of applying one command to the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Idle,
    Redraw,
    Quit,
}

/// Runs the scope on an audio input device.
///
/// `device` overrides `audio.device` from the config file.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the audio device cannot be opened
/// - If the terminal fails
pub fn handle_scope(device: Option<String>) -> anyhow::Result<()> {
    tracing::info!("=== wavescope started ===");
    let config = load_config()?;
    let device = device.unwrap_or_else(|| config.audio.device.clone());

    let input = match InputSource::open(&device, config.audio.block_size) {
        Ok(input) => input,
        Err(e) => {
            tracing::error!("Failed to open audio input '{}': {}", device, e);
            show_error_screen(
                "Audio Device Error",
                &format!("{e}\n\nRun 'wavescope list-devices' to see available devices."),
            )?;
            return Err(e);
        }
    };

    let label = format!("{} @ {}Hz", input.device_name(), input.sample_rate());
    run_scope(input.probe(), &label, &config.display)?;

    tracing::info!("=== wavescope exited ===");
    Ok(())
}

/// Runs the scope on the synthetic test tone.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the tone thread cannot be started
/// - If the terminal fails
pub fn handle_demo() -> anyhow::Result<()> {
    tracing::info!("=== wavescope demo started ===");
    let config = load_config()?;

    let mut tone = ToneSource::start(
        DEMO_CHANNELS,
        config.audio.block_size,
        config.audio.sample_rate,
    )?;
    let label = format!("demo tone @ {}Hz", config.audio.sample_rate);
    let result = run_scope(tone.probe(), &label, &config.display);
    tone.stop();

    tracing::info!("=== wavescope demo exited ===");
    result
}

/// Loads the config, showing the error screen when it is malformed.
fn load_config() -> anyhow::Result<ScopeConfig> {
    match ScopeConfig::load() {
        Ok(config) => {
            tracing::info!(
                "Configuration loaded: device={}, block_size={}, aggregation={}, refresh={}Hz",
                config.audio.device,
                config.audio.block_size,
                config.display.aggregation,
                config.display.refresh_rate_hz
            );
            Ok(config)
        }
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            show_error_screen(
                "Configuration Error",
                &format!("{err:#}\n\nPlease check ~/.config/wavescope/wavescope.toml."),
            )?;
            Err(err.context("Configuration error"))
        }
    }
}

/// Applies the `[display]` settings to a freshly attached scope.
pub fn configure(scope: &mut Oscilloscope, display: &DisplayConfig) {
    scope.set_max_amplitude(display.max_amplitude);
    scope.set_min_sample_index(display.min_sample_index);
    if let Some(max_sample_index) = display.max_sample_index {
        scope.set_max_sample_index(max_sample_index);
    }
    scope.set_aggregation_mode(display.aggregation);
    scope.set_min_tick_spacing_px(display.min_tick_spacing_px);
}

/// Applies one UI command.
pub fn apply_command(scope: &mut Oscilloscope, command: ScopeCommand) -> Outcome {
    let block_size = scope.block_size().unwrap_or_else(|| scope.max_sample_index());
    let step = (block_size / 8).max(1);
    let min = scope.min_sample_index();
    let span = scope.max_sample_index().saturating_sub(min);

    match command {
        ScopeCommand::Continue => return Outcome::Idle,
        ScopeCommand::Quit => return Outcome::Quit,
        ScopeCommand::ToggleMode => {
            let mode = scope.aggregation_mode().toggled();
            scope.set_aggregation_mode(mode);
            tracing::info!("Aggregation mode: {}", mode);
        }
        ScopeCommand::AmplitudeZoomIn => {
            scope.set_max_amplitude((scope.max_amplitude() / 2.0).max(MIN_AMPLITUDE));
        }
        ScopeCommand::AmplitudeZoomOut => {
            scope.set_max_amplitude((scope.max_amplitude() * 2.0).min(MAX_AMPLITUDE));
        }
        ScopeCommand::TimeZoomIn => {
            let new_span = (span / 2).max(MIN_SAMPLE_SPAN.min(span));
            scope.set_max_sample_index(min + new_span);
        }
        ScopeCommand::TimeZoomOut => {
            scope.set_max_sample_index(min + (span * 2).max(1));
        }
        ScopeCommand::ScrollBack => {
            scope.set_min_sample_index(min.saturating_sub(step));
        }
        ScopeCommand::ScrollForward => {
            if min + step >= scope.max_sample_index() {
                return Outcome::Idle;
            }
            scope.set_min_sample_index(min + step);
        }
        ScopeCommand::ToggleHold => {
            let hold = !scope.is_held();
            scope.set_hold(hold);
            tracing::info!("Hold {}", if hold { "on" } else { "off" });
        }
        ScopeCommand::PointerMoved { x_px, y_px } => scope.pointer_moved(x_px, y_px),
        ScopeCommand::PointerExited => scope.pointer_exited(),
        ScopeCommand::Redraw => {}
    }
    Outcome::Redraw
}

fn run_scope(source: Arc<dyn FrameSource>, label: &str, display: &DisplayConfig) -> anyhow::Result<()> {
    let mut scope = Oscilloscope::new();
    scope.attach(source);
    configure(&mut scope, display);

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(display.refresh_rate_hz.max(1)));
    let mut tui = ScopeTui::new()?;
    let mut last_draw: Option<Instant> = None;
    let mut pending = true;
    let mut draws = 0u64;

    tracing::debug!("Entering scope loop at {:?} per frame", frame_interval);

    loop {
        let due = last_draw.map_or(true, |at| at.elapsed() >= frame_interval);
        if due && (std::mem::take(&mut pending) | scope.take_repaint_request()) {
            if let Err(e) = tui.draw(&mut scope, label) {
                tui.cleanup().ok();
                return Err(e.context("Render failed"));
            }
            last_draw = Some(Instant::now());
            draws += 1;
            if draws.is_multiple_of(600) {
                tracing::debug!("{} frames drawn", draws);
            }
        }

        let timeout = match last_draw {
            Some(at) if !due => frame_interval.saturating_sub(at.elapsed()),
            _ => frame_interval,
        };

        match tui.handle_input(timeout) {
            Ok(command) => match apply_command(&mut scope, command) {
                Outcome::Quit => break,
                Outcome::Redraw => pending = true,
                Outcome::Idle => {}
            },
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                tui.cleanup().ok();
                return Err(e.context("Input handling error"));
            }
        }
    }

    scope.detach();
    tui.cleanup()?;
    tracing::info!("Scope closed after {} frames", draws);
    Ok(())
}
