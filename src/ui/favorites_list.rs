//! Favorites view: every favorited movie, resolved from the catalog.

use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use super::helpers::scroll_into_view;
use super::movies::movie_rows;

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    app.list_rows = rows;

    let view = &mut app.favorites_view;
    let total = view.movies.len();
    view.cursor.offset = scroll_into_view(view.cursor.selected, view.cursor.offset, rows, total);

    let items: Vec<ListItem> = if view.loading && view.movies.is_empty() {
        vec![placeholder("Loading favorites...")]
    } else if view.movies.is_empty() {
        vec![placeholder("No favorites yet.")]
    } else {
        movie_rows(
            &view.movies,
            &app.favorites,
            view.cursor.offset,
            rows,
            view.cursor.selected,
            width,
        )
    };

    let title = format!(" Favorites ({}) ", app.favorites.len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(title),
    );

    f.render_widget(list, area);
}

fn placeholder(text: &'static str) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{movie, test_app};
    use ratatui::{backend::TestBackend, Terminal};

    async fn screen_of(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(50, 8)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                render(f, app, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_favorites_message() {
        let mut app = test_app().await;
        assert!(screen_of(&mut app).await.contains("No favorites yet."));

        app.favorites_view.loading = true;
        assert!(screen_of(&mut app).await.contains("Loading favorites..."));
    }

    #[tokio::test]
    async fn test_lists_favorited_movies() {
        let mut app = test_app().await;
        app.favorites.toggle(7).await.unwrap();
        app.favorites_view.movies = vec![movie(7, "Stalker")];

        let screen = screen_of(&mut app).await;
        assert!(screen.contains("♥ Stalker"));
        assert!(screen.contains("Favorites (1)"));
    }
}
