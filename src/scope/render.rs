//! Terminal drawing of the oscilloscope.
//!
//! Uses a braille [`Canvas`] so one braille dot is one surface pixel: a
//! cell is [`CELL_WIDTH_PX`] wide and [`CELL_HEIGHT_PX`] tall. Canvas y
//! grows upwards, so every pixel y is flipped before drawing.

use super::aggregate::TracePoint;
use super::scale::ScaleLayout;
use super::widget::Oscilloscope;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Painter, Shape};
use ratatui::widgets::Widget;

pub const CELL_WIDTH_PX: u32 = 2;
pub const CELL_HEIGHT_PX: u32 = 4;

/// Trace colours, cycled by channel index.
const CHANNEL_COLORS: [Color; 6] = [
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Cyan,
    Color::Rgb(255, 165, 0),
    Color::Magenta,
];

const BACKGROUND_COLOR: Color = Color::Black;
const BORDER_COLOR: Color = Color::Gray;
const GRID_COLOR: Color = Color::DarkGray;
const LABEL_COLOR: Color = Color::Gray;
const READOUT_COLOR: Color = Color::White;

pub fn channel_color(channel: usize) -> Color {
    CHANNEL_COLORS[channel % CHANNEL_COLORS.len()]
}

/// Surface size in pixels for a cell area.
pub fn surface_size(area: Rect) -> (u32, u32) {
    (
        u32::from(area.width) * CELL_WIDTH_PX,
        u32::from(area.height) * CELL_HEIGHT_PX,
    )
}

/// Pixel position of a terminal cell relative to `area`, or `None` when the
/// cell is outside it.
pub fn cell_to_pixel(area: Rect, column: u16, row: u16) -> Option<(i32, i32)> {
    let inside = column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height);
    inside.then(|| {
        (
            i32::from(column - area.x) * CELL_WIDTH_PX as i32,
            i32::from(row - area.y) * CELL_HEIGHT_PX as i32,
        )
    })
}

/// Maps surface pixels onto canvas coordinates.
#[derive(Debug, Clone, Copy)]
struct Surface {
    max_x: f64,
    max_y: f64,
}

impl Surface {
    fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            max_x: f64::from(width_px.max(2) - 1),
            max_y: f64::from(height_px.max(2) - 1),
        }
    }

    fn x(&self, x_px: f32) -> f64 {
        f64::from(x_px).clamp(0.0, self.max_x)
    }

    fn y(&self, y_px: f32) -> f64 {
        (self.max_y - f64::from(y_px)).clamp(0.0, self.max_y)
    }

    fn segment(&self, from: (f32, f32), to: (f32, f32), color: Color) -> CanvasLine {
        CanvasLine {
            x1: self.x(from.0),
            y1: self.y(from.1),
            x2: self.x(to.0),
            y2: self.y(to.1),
            color,
        }
    }
}

/// Border and grid lines.
struct ScaleLayer<'a> {
    layout: &'a ScaleLayout,
    surface: Surface,
}

impl Shape for ScaleLayer<'_> {
    fn draw(&self, painter: &mut Painter) {
        let s = self.surface;
        let (right, bottom) = (s.max_x as f32, s.max_y as f32);

        for x in self.layout.vertical_lines() {
            s.segment((x, 0.0), (x, bottom), GRID_COLOR).draw(painter);
        }
        for y in self.layout.horizontal_lines() {
            s.segment((0.0, y), (right, y), GRID_COLOR).draw(painter);
        }

        let corners = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
        for (i, &from) in corners.iter().enumerate() {
            let to = corners[(i + 1) % corners.len()];
            s.segment(from, to, BORDER_COLOR).draw(painter);
        }
    }
}

/// One channel's polyline.
struct TraceLayer<'a> {
    points: &'a [TracePoint],
    color: Color,
    surface: Surface,
}

impl Shape for TraceLayer<'_> {
    fn draw(&self, painter: &mut Painter) {
        if let [only] = self.points {
            if let Some((x, y)) = painter.get_point(self.surface.x(only.x), self.surface.y(only.y)) {
                painter.paint(x, y, self.color);
            }
            return;
        }
        for pair in self.points.windows(2) {
            self.surface
                .segment((pair[0].x, pair[0].y), (pair[1].x, pair[1].y), self.color)
                .draw(painter);
        }
    }
}

/// Draws the oscilloscope into `area`.
///
/// Resizes the viewport to the area first, so the caller only has to pick
/// the area.
///
/// # Panics
///
/// When no frame source is attached to `scope`.
pub fn render_scope(scope: &mut Oscilloscope, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }

    let (width_px, height_px) = surface_size(area);
    scope.resized(width_px, height_px);
    let frame = scope.prepare_frame(CELL_WIDTH_PX as f32, CELL_HEIGHT_PX as f32);
    let surface = Surface::new(width_px, height_px);
    let label_style = Style::default().fg(LABEL_COLOR);

    Canvas::default()
        .background_color(BACKGROUND_COLOR)
        .marker(Marker::Braille)
        .x_bounds([0.0, surface.max_x])
        .y_bounds([0.0, surface.max_y])
        .paint(|ctx| {
            ctx.draw(&ScaleLayer {
                layout: frame.scale,
                surface,
            });

            for tick in &frame.scale.amplitude_ticks {
                ctx.print(
                    surface.x(CELL_WIDTH_PX as f32),
                    surface.y(tick.position_px),
                    Span::styled(tick.label.clone(), label_style),
                );
            }
            // Time labels sit on the bottom row, right of their grid line
            for tick in &frame.scale.time_ticks {
                ctx.print(
                    surface.x(tick.position_px + CELL_WIDTH_PX as f32),
                    0.0,
                    Span::styled(tick.label.clone(), label_style),
                );
            }

            ctx.layer();

            for (channel, trace) in frame.traces.iter().enumerate() {
                ctx.draw(&TraceLayer {
                    points: trace,
                    color: channel_color(channel),
                    surface,
                });
            }

            if let Some(label) = &frame.readout {
                ctx.print(
                    surface.x(label.x_px),
                    surface.y(label.y_px),
                    Span::styled(label.text.clone(), Style::default().fg(READOUT_COLOR)),
                );
            }
        })
        .render(area, buf);
}
