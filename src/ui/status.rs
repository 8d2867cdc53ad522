use crate::app::{App, View};
use crate::catalog::MovieSummary;
use crate::util::{sanitize_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const FEED_HINTS: &str = "[j/k]move [f]avorite [F]avorites [o]pen [r]eload [?]help [q]uit";
const FAVORITES_HINTS: &str = "[j/k]move [f]unfavorite [o]pen [Esc]back [?]help [q]uit";

/// Title, year and overview of the movie under the cursor.
fn movie_summary(movie: &MovieSummary) -> String {
    let mut line = sanitize_line(&movie.title).into_owned();
    if let Some(year) = movie.release_year() {
        line.push_str(&format!(" ({})", year));
    }
    if let Some(overview) = movie.overview.as_deref().filter(|o| !o.trim().is_empty()) {
        line.push_str(": ");
        line.push_str(&sanitize_line(overview));
    }
    line
}

/// Status bar text: a pending message, the page being loaded, the selected
/// movie, or key hints, in that order.
fn status_text(app: &App) -> Cow<'_, str> {
    if let Some((msg, _)) = &app.status_message {
        return Cow::Borrowed(msg.as_ref());
    }
    if app.view == View::Feed && app.feed.in_flight().is_some() {
        return Cow::Owned(format!("Loading page {}...", app.feed.cursor()));
    }
    match (app.selected_movie(), app.view) {
        (Some(movie), _) => Cow::Owned(movie_summary(movie)),
        (None, View::Feed) => Cow::Borrowed(FEED_HINTS),
        (None, View::Favorites) => Cow::Borrowed(FAVORITES_HINTS),
    }
}

/// Render the status bar.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text = status_text(app);
    let text = truncate_to_width(&text, area.width as usize).into_owned();

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{movie, test_app};
    use crate::feed::PageResult;

    #[tokio::test]
    async fn test_hints_when_nothing_selected() {
        let mut app = test_app().await;
        assert_eq!(status_text(&app), FEED_HINTS);
        app.view = View::Favorites;
        assert_eq!(status_text(&app), FAVORITES_HINTS);
    }

    #[tokio::test]
    async fn test_message_wins() {
        let mut app = test_app().await;
        app.set_status("Saved");
        assert_eq!(status_text(&app), "Saved");
    }

    #[tokio::test]
    async fn test_loading_then_selected_movie() {
        let mut app = test_app().await;
        let ticket = app.feed.begin_next_page().unwrap();
        assert_eq!(status_text(&app), "Loading page 1...");

        let mut heat = movie(1, "Heat");
        heat.overview = Some("A heist\nin LA.".to_string());
        app.feed.complete(PageResult {
            ticket,
            result: Ok(vec![heat]),
        });
        assert_eq!(status_text(&app), "Heat (1999): A heist in LA.");
    }
}
