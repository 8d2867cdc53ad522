//! Feed view: the paginated movie list with favorite markers and the
//! trailing sentinel row that drives loading.

use crate::app::App;
use crate::catalog::{CatalogError, MovieSummary};
use crate::feed::FeedState;
use crate::favorites::FavoritesStore;
use crate::util::{display_width, format_rating, sanitize_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};
use std::borrow::Cow;

use super::helpers::feed_viewport;

const FAVORITE_GLYPH: &str = "♥";
const NOT_FAVORITE_GLYPH: &str = "♡";

/// Columns taken by the year and rating on the right of each row.
const META_WIDTH: usize = 12;

/// Text of the sentinel row for the current feed state.
///
/// `scrollable` says whether the list is long enough for the sentinel to
/// leave the screen. When it is not, only Esc can retry a failed page.
pub(super) fn sentinel_text(
    state: FeedState,
    last_error: Option<&CatalogError>,
    cursor: u32,
    scrollable: bool,
) -> Cow<'static, str> {
    match state {
        FeedState::Fetching => Cow::Borrowed("Loading more movies..."),
        FeedState::Idle => Cow::Borrowed("Scroll to load more"),
        FeedState::Exhausted => Cow::Borrowed("End of catalog"),
        FeedState::Error { .. } => {
            let page = last_error.and_then(CatalogError::page).unwrap_or(cursor);
            let hint = if scrollable { "scroll or Esc" } else { "Esc" };
            Cow::Owned(format!("Failed to load page {} ({} to retry)", page, hint))
        }
    }
}

/// One list row: glyph, title, then year and rating.
pub(super) fn movie_line(movie: &MovieSummary, favorite: bool, width: usize, selected: bool) -> Line<'static> {
    let glyph = if favorite {
        Span::styled(
            format!("{} ", FAVORITE_GLYPH),
            Style::default().fg(Color::Red),
        )
    } else {
        Span::styled(
            format!("{} ", NOT_FAVORITE_GLYPH),
            Style::default().fg(Color::DarkGray),
        )
    };

    let title_width = width.saturating_sub(2 + META_WIDTH);
    let clean = sanitize_line(&movie.title);
    let title = truncate_to_width(&clean, title_width);
    let padding = title_width.saturating_sub(display_width(&title));

    let year = movie
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    let meta = format!("  {:>4}  {:>4}", year, format_rating(movie.rating));

    let title_style = if selected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    };

    Line::from(vec![
        glyph,
        Span::styled(format!("{}{}", title, " ".repeat(padding)), title_style),
        Span::styled(meta, Style::default().fg(Color::Gray)),
    ])
}

/// Rows for `movies[offset..offset + rows]`.
pub(super) fn movie_rows(
    movies: &[MovieSummary],
    favorites: &FavoritesStore,
    offset: usize,
    rows: usize,
    selected: usize,
    width: usize,
) -> Vec<ListItem<'static>> {
    movies
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, movie)| {
            ListItem::new(movie_line(
                movie,
                favorites.is_favorite(movie.id),
                width,
                i == selected,
            ))
        })
        .collect()
}

/// Render the feed list and record the drawn window for the scroll trigger.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let total_rows = app.feed.items().len() + 1;

    let viewport = feed_viewport(
        app.feed_cursor.selected,
        app.feed_cursor.offset,
        rows,
        total_rows,
    );
    app.feed_cursor.offset = viewport.offset;
    app.feed_viewport = viewport;
    app.list_rows = rows;

    let mut items = movie_rows(
        app.feed.items(),
        &app.favorites,
        viewport.offset,
        rows,
        app.feed_cursor.selected,
        width,
    );

    if viewport.sentinel_visible(app.feed.items().len()) {
        // A fetch from before a reload still holds the request slot
        let state = match app.feed.in_flight() {
            Some(_) => FeedState::Fetching,
            None => app.feed.state(),
        };
        let scrollable = app.feed.items().len() >= rows;
        let text = sentinel_text(state, app.feed.last_error(), app.feed.cursor(), scrollable);
        let style = match state {
            FeedState::Error { .. } => Style::default().fg(Color::Red),
            _ => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        };
        items.push(ListItem::new(Line::from(Span::styled(text, style))));
    }

    let title = format!(
        " Popular movies ({}) ",
        app.feed.items().len()
    );
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    f.render_widget(list, area);
}
