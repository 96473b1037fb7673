//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

/// A terminal oscilloscope for live audio input
#[derive(Parser)]
#[command(name = "wavescope")]
#[command(version)]
#[command(about = "A terminal oscilloscope for live audio input")]
#[command(long_about = "A terminal oscilloscope for live audio input.\n\nShows every input channel as a waveform on a braille grid, with amplitude and\nsample-index axes and a mouse cursor readout.\n\nDEFAULT COMMAND:\n    If no command is specified, 'scope' is used by default.\n\nKEYS:\n    q / Esc / Ctrl+C    quit\n    m                   toggle peak / average aggregation\n    Up / Down           halve / double the amplitude range\n    Left / Right        halve / double the visible sample span\n    [ / ]               move the first visible sample\n    Space               hold / release the trace\n\nEXAMPLES:\n    # Scope the default input device\n    $ wavescope\n\n    # Scope device #2 from list-devices\n    $ wavescope scope --device 2\n\n    # Try it without audio hardware\n    $ wavescope demo")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wavescope/wavescope.toml\n    Logs:               ~/.local/state/wavescope/wavescope.log.*"
)]
struct Cli {
    /// Input device: name, index from list-devices, or "default"
    #[arg(short, long, value_name = "DEVICE", global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show live input from an audio device (default)
    #[command(visible_alias = "s")]
    Scope,

    /// Show a synthetic test tone, no audio hardware needed
    Demo,

    /// Open configuration file in your preferred editor
    ///
    /// Writes the default configuration first if none exists.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and native formats to help configure
    /// the input device in wavescope.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   wavescope completions bash > wavescope.bash
    ///   wavescope completions zsh > _wavescope
    ///   wavescope completions fish > wavescope.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that print to the terminal and need no logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "wavescope", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Scope) => commands::handle_scope(cli.device),
        Some(Commands::Demo) => commands::handle_demo(),
        Some(Commands::Config) => commands::handle_config(),
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }
}
