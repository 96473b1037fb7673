//! Full-screen error display for startup failures.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BACKGROUND: Color = Color::Rgb(160, 0, 0);
const ERROR_FOREGROUND: Color = Color::Rgb(255, 255, 255);

/// Red full-screen message shown until a key is pressed.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Enters the alternate screen in raw mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ErrorScreen {
            terminal,
            active: true,
        })
    }

    /// Shows `title` and `error` and waits for any key.
    ///
    /// # Errors
    /// - If terminal rendering or event polling fails
    pub fn show_error(&mut self, title: &str, error: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                render_error(title, error, area, frame.buffer_mut());
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }
        Ok(())
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
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Shows an error full screen, then restores the terminal.
pub fn show_error_screen(title: &str, error: &str) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show_error(title, error)?;
    screen.cleanup()
}

/// Draws the error message centred on a red background.
pub fn render_error(title: &str, error: &str, area: Rect, buf: &mut Buffer) {
    let style = Style::default().fg(ERROR_FOREGROUND).bg(ERROR_BACKGROUND);
    buf.set_style(area, style);

    let text = Text::from(vec![
        Line::from(Span::styled(title.to_string(), style.add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(error.to_string()),
        Line::from(""),
        Line::from("Press any key to exit"),
    ]);

    let text_width = area.width / 10 * 8;
    let text_area = Rect {
        x: area.x + (area.width - text_width) / 2,
        y: area.y + area.height / 3,
        width: text_width,
        height: area.height - area.height / 3,
    };

    Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(text_area, buf);
}
