//! Terminal session for the live oscilloscope view.
//!
//! Owns the alternate screen with mouse capture and focus reporting,
//! draws the scope plus a one-line status footer, and turns terminal
//! events into [`ScopeCommand`]s.

use crate::scope::{cell_to_pixel, render_scope, Oscilloscope};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

const FOOTER_HEIGHT: u16 = 1;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeCommand {
    /// Nothing happened
    Continue,
    /// Leave the scope ('q', Escape or Ctrl+C)
    Quit,
    /// Switch between peak and average aggregation ('m')
    ToggleMode,
    /// Halve the max amplitude (Up)
    AmplitudeZoomIn,
    /// Double the max amplitude (Down)
    AmplitudeZoomOut,
    /// Halve the visible sample span (Left)
    TimeZoomIn,
    /// Double the visible sample span (Right)
    TimeZoomOut,
    /// Move the first visible sample back ('[')
    ScrollBack,
    /// Move the first visible sample forward (']')
    ScrollForward,
    /// Freeze or unfreeze the trace (Space)
    ToggleHold,
    /// Pointer over the scope, in surface pixels
    PointerMoved { x_px: i32, y_px: i32 },
    /// Pointer left the scope or the terminal lost focus
    PointerExited,
    /// Terminal was resized
    Redraw,
}

/// Maps a key press to a command.
pub fn command_for_key(key: KeyEvent) -> ScopeCommand {
    if key.kind == KeyEventKind::Release {
        return ScopeCommand::Continue;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => ScopeCommand::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => ScopeCommand::Quit,
        KeyCode::Char('m') => ScopeCommand::ToggleMode,
        KeyCode::Up => ScopeCommand::AmplitudeZoomIn,
        KeyCode::Down => ScopeCommand::AmplitudeZoomOut,
        KeyCode::Left => ScopeCommand::TimeZoomIn,
        KeyCode::Right => ScopeCommand::TimeZoomOut,
        KeyCode::Char('[') => ScopeCommand::ScrollBack,
        KeyCode::Char(']') => ScopeCommand::ScrollForward,
        KeyCode::Char(' ') => ScopeCommand::ToggleHold,
        _ => ScopeCommand::Continue,
    }
}

/// Maps a mouse event over `scope_area` to a pointer command.
pub fn command_for_mouse(mouse: MouseEvent, scope_area: Rect) -> ScopeCommand {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            match cell_to_pixel(scope_area, mouse.column, mouse.row) {
                Some((x_px, y_px)) => ScopeCommand::PointerMoved { x_px, y_px },
                None => ScopeCommand::PointerExited,
            }
        }
        _ => ScopeCommand::Continue,
    }
}

/// Status line: mode, amplitude, sample range, hold state.
pub fn footer_line(scope: &Oscilloscope, source_label: &str) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let hold = if scope.is_held() {
        Span::styled("HOLD ", Style::default().fg(Color::Black).bg(Color::Yellow))
    } else {
        Span::styled("LIVE ", Style::default().fg(Color::Green))
    };

    Line::from(vec![
        hold,
        Span::raw(format!("{source_label}  ")),
        Span::raw(format!("mode {}", scope.aggregation_mode())),
        Span::styled(" / ", dim),
        Span::raw(format!("±{}", scope.max_amplitude())),
        Span::styled(" / ", dim),
        Span::raw(format!(
            "samples {}..{}",
            scope.min_sample_index(),
            scope.max_sample_index()
        )),
        Span::styled("   q quit  m mode  ↑↓ amp  ←→ span  [ ] scroll  space hold", dim),
    ])
}

/// Splits the terminal into scope area and footer.
fn layout(area: Rect) -> (Rect, Rect) {
    let footer_height = FOOTER_HEIGHT.min(area.height);
    let scope_area = Rect {
        height: area.height - footer_height,
        ..area
    };
    let footer_area = Rect {
        y: area.y + scope_area.height,
        height: footer_height,
        ..area
    };
    (scope_area, footer_area)
}

/// Terminal UI hosting one [`Oscilloscope`].
pub struct ScopeTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Where the scope was last drawn, for mouse mapping
    scope_area: Rect,
    active: bool,
}

impl ScopeTui {
    /// Enters the alternate screen with mouse capture enabled.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange
        )?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ScopeTui {
            terminal,
            scope_area: Rect::default(),
            active: true,
        })
    }

    /// Draws the scope and footer.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, scope: &mut Oscilloscope, source_label: &str) -> anyhow::Result<()> {
        let mut drawn_area = self.scope_area;
        self.terminal.draw(|frame| {
            let (scope_area, footer_area) = layout(frame.area());
            render_scope(scope, scope_area, frame.buffer_mut());

            let footer = Paragraph::new(footer_line(scope, source_label))
                .style(Style::default().fg(Color::Gray).bg(Color::Black));
            frame.render_widget(footer, footer_area);

            drawn_area = scope_area;
        })?;
        self.scope_area = drawn_area;
        Ok(())
    }

    /// Waits up to `timeout` for one terminal event.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<ScopeCommand> {
        if !event::poll(timeout)? {
            return Ok(ScopeCommand::Continue);
        }

        let command = match event::read()? {
            Event::Key(key) => command_for_key(key),
            Event::Mouse(mouse) => command_for_mouse(mouse, self.scope_area),
            Event::FocusLost => ScopeCommand::PointerExited,
            Event::Resize(_, _) => ScopeCommand::Redraw,
            _ => ScopeCommand::Continue,
        };

        if !matches!(
            command,
            ScopeCommand::Continue | ScopeCommand::PointerMoved { .. }
        ) {
            tracing::debug!("Input command: {:?}", command);
        }
        Ok(command)
    }

    /// Restores the terminal. Safe to call more than once.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ScopeTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::AggregationMode;
    use crate::source::FrameProbe;
    use crossterm::event::MouseButton;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(command_for_key(key(KeyCode::Char('q'))), ScopeCommand::Quit);
        assert_eq!(command_for_key(key(KeyCode::Esc)), ScopeCommand::Quit);
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            ScopeCommand::Quit
        );
        assert_eq!(command_for_key(key(KeyCode::Char('c'))), ScopeCommand::Continue);
        assert_eq!(command_for_key(key(KeyCode::Char('m'))), ScopeCommand::ToggleMode);
        assert_eq!(command_for_key(key(KeyCode::Up)), ScopeCommand::AmplitudeZoomIn);
        assert_eq!(command_for_key(key(KeyCode::Right)), ScopeCommand::TimeZoomOut);
        assert_eq!(command_for_key(key(KeyCode::Char('['))), ScopeCommand::ScrollBack);
        assert_eq!(command_for_key(key(KeyCode::Char(' '))), ScopeCommand::ToggleHold);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(command_for_key(release), ScopeCommand::Continue);
    }

    #[test]
    fn test_mouse_maps_to_surface_pixels() {
        let area = Rect::new(0, 0, 80, 23);
        assert_eq!(
            command_for_mouse(mouse(MouseEventKind::Moved, 10, 5), area),
            ScopeCommand::PointerMoved { x_px: 20, y_px: 20 }
        );
        assert_eq!(
            command_for_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 0, 0), area),
            ScopeCommand::PointerMoved { x_px: 0, y_px: 0 }
        );
        // footer row is outside the scope
        assert_eq!(
            command_for_mouse(mouse(MouseEventKind::Moved, 10, 23), area),
            ScopeCommand::PointerExited
        );
        assert_eq!(
            command_for_mouse(mouse(MouseEventKind::ScrollUp, 10, 5), area),
            ScopeCommand::Continue
        );
    }

    #[test]
    fn test_layout_reserves_footer() {
        let (scope_area, footer_area) = layout(Rect::new(0, 0, 80, 24));
        assert_eq!(scope_area, Rect::new(0, 0, 80, 23));
        assert_eq!(footer_area, Rect::new(0, 23, 80, 1));

        let (scope_area, footer_area) = layout(Rect::new(0, 0, 80, 0));
        assert_eq!((scope_area.height, footer_area.height), (0, 0));
    }

    #[test]
    fn test_footer_shows_state() {
        let (probe, _writer) = FrameProbe::new(1, 4096);
        let mut scope = Oscilloscope::new();
        scope.attach(probe);
        scope.set_aggregation_mode(AggregationMode::Average);
        scope.set_hold(true);

        let text: String = footer_line(&scope, "demo")
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert!(text.starts_with("HOLD demo"));
        assert!(text.contains("mode average"));
        assert!(text.contains("samples 0..4096"));
    }
}
