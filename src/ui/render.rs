//! Render dispatch for the TUI.

use crate::app::{App, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{favorites_list, help, movies, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 6;

/// Draw the active view, the status bar and any overlay.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        // Nothing drawn, so the sentinel is not on screen
        app.feed_viewport = Default::default();
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::Feed => movies::render(f, app, chunks[0]),
        View::Favorites => favorites_list::render(f, app, chunks[0]),
    }
    status::render(f, app, chunks[1]);

    if app.show_help {
        help::render(f, app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::{backend::TestBackend, Terminal};

    async fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_too_small_hides_sentinel() {
        let mut app = test_app().await;
        let screen = draw(&mut app, 30, 4).await;
        assert!(screen.to_lowercase().contains("too small"));
        assert!(!app.feed_viewport.sentinel_visible(0));
    }

    #[tokio::test]
    async fn test_feed_layout_with_status_bar() {
        let mut app = test_app().await;
        let screen = draw(&mut app, 80, 12).await;
        assert!(screen.contains("Popular movies (0)"));
        assert!(screen.contains("[F]avorites"));
        // Empty feed: the sentinel is the first row and is visible
        assert!(app.feed_viewport.sentinel_visible(0));
    }

    #[tokio::test]
    async fn test_help_overlay_drawn() {
        let mut app = test_app().await;
        app.show_help = true;
        let screen = draw(&mut app, 80, 24).await;
        assert!(screen.contains("Help"));
        assert!(screen.contains("General"));
    }
}
