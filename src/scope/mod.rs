//! Real-time waveform oscilloscope.
//!
//! Data flows from a [`FrameSource`](crate::source::FrameSource) through the
//! lock-guarded [`CaptureBuffer`] into a private snapshot on the
//! presentation thread, which the [`AggregationRenderer`] turns into one
//! polyline per channel. [`ViewportConfig`] owns the view parameters and the
//! cached [`CoordinateMapper`] shared by traces, scale and pointer readout.

pub mod aggregate;
pub mod capture;
pub mod mapper;
pub mod readout;
pub mod render;
pub mod scale;
pub mod viewport;
pub mod widget;

pub use aggregate::{AggregationMode, AggregationRenderer, TracePoint};
pub use capture::{CaptureBuffer, CaptureListener, FrameBlock, RepaintSignal};
pub use mapper::CoordinateMapper;
pub use readout::{PointerReadout, PointerState};
pub use render::{cell_to_pixel, channel_color, render_scope};
pub use scale::{ScaleCache, ScaleLayout};
pub use viewport::ViewportConfig;
pub use widget::Oscilloscope;
