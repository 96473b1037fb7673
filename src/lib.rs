//! wavescope: a terminal oscilloscope for live multi-channel audio.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;
pub mod scope;
pub mod source;
pub mod ui;
