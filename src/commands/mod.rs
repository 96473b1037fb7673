//! Application command handlers for wavescope.
//!
//! # Commands
//! - `scope`: Live oscilloscope on an audio input device (default)
//! - `demo`: Oscilloscope fed by a synthetic test tone
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod scope;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use scope::{handle_demo, handle_scope};
