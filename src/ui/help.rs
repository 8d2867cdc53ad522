//! Help overlay: scrollable keybinding table.
//!
//! Shows the bindings in effect, user overrides included, grouped by the
//! view they apply to.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

const CONTEXT_ORDER: [(Context, &str); 3] = [
    (Context::Global, "General"),
    (Context::Feed, "Popular Feed"),
    (Context::Favorites, "Favorites"),
];

/// Rows of the binding table, grouped by context with blank separators.
fn binding_rows(app: &App) -> Vec<Row<'static>> {
    let bindings = app.keybindings.all_bindings();
    let mut rows: Vec<Row> = Vec::new();

    for (ctx, label) in &CONTEXT_ORDER {
        let group: Vec<_> = bindings.iter().filter(|(c, _, _, _)| c == ctx).collect();
        if group.is_empty() {
            continue;
        }

        rows.push(Row::new(vec![
            Line::from(Span::styled(
                format!("-- {} --", label),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ]));

        for (_, key_str, _, description) in group {
            rows.push(Row::new(vec![
                format!("  {}", key_str),
                description.to_string(),
            ]));
        }

        rows.push(Row::new(vec![String::new(), String::new()]));
    }

    rows.pop();
    rows
}

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let rows = binding_rows(app);
    // Border and header take three lines
    let window = ScrollWindow::new(rows.len(), overlay.height.saturating_sub(3) as usize, app.help_scroll_offset);
    let visible_rows: Vec<Row> = rows.into_iter().skip(window.first).take(window.height).collect();

    let table = Table::new(
        visible_rows,
        [Constraint::Length(16), Constraint::Min(20)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(window.title()),
    )
    .header(
        Row::new(vec!["Key", "Action"])
            .style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::UNDERLINED),
            )
            .bottom_margin(1),
    );

    f.render_widget(table, overlay);

    if window.has_more_below() {
        let hint = Line::from(Span::styled(
            " j/k to scroll, ? or Esc to close ",
            Style::default().fg(Color::DarkGray),
        ));
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(hint), hint_area);
    }
}

/// Visible slice of the binding table.
#[derive(Debug, PartialEq, Eq)]
struct ScrollWindow {
    first: usize,
    height: usize,
    last_start: usize,
}

impl ScrollWindow {
    /// Clamp the requested `offset` so the window never scrolls past the end.
    fn new(total: usize, height: usize, offset: usize) -> Self {
        let last_start = total.saturating_sub(height);
        Self {
            first: offset.min(last_start),
            height,
            last_start,
        }
    }

    fn has_more_below(&self) -> bool {
        self.first < self.last_start
    }

    fn title(&self) -> String {
        if self.last_start == 0 {
            " Help (? to close) ".to_string()
        } else {
            format!(" Help ({}/{}) ", self.first + 1, self.last_start + 1)
        }
    }
}

/// Centered rectangle covering the given percentage of `area`.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
