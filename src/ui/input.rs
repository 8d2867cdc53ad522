//! Input handling for the TUI.
//!
//! Maps key presses to actions through the keybinding registry and applies
//! them to the current view.

use crate::app::{App, AppEvent, View};
use crate::feed::FeedState;
use crate::keybindings::Action as KbAction;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{spawn_favorite_toggle, spawn_favorites_load};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // Help overlay captures all keys while visible
    if app.show_help {
        handle_help_input(app, code);
        return Action::Continue;
    }

    let context = app.view.context();
    let Some(action) = app.keybindings.action_for_key(code, modifiers, context) else {
        return Action::Continue;
    };

    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::NavDown => app.nav_down(1),
        KbAction::NavUp => app.nav_up(1),
        KbAction::PageDown => {
            let by = app.page_size();
            app.nav_down(by);
        }
        KbAction::PageUp => {
            let by = app.page_size();
            app.nav_up(by);
        }
        KbAction::ToggleFavorite => {
            if let Some(movie_id) = app.selected_movie().map(|m| m.id) {
                spawn_favorite_toggle(app, movie_id, event_tx);
            }
        }
        KbAction::ToggleFavoritesView => match app.view {
            View::Feed => {
                app.view = View::Favorites;
                app.favorites_view.cursor = Default::default();
                spawn_favorites_load(app, event_tx);
            }
            View::Favorites => app.view = View::Feed,
        },
        KbAction::Reload => {
            if app.view == View::Feed {
                tracing::info!("Reloading feed");
                app.feed.reset();
                app.feed_cursor = Default::default();
                app.trigger.rearm();
                app.set_status("Reloading...");
            }
        }
        KbAction::OpenInBrowser => {
            if let Some(movie) = app.selected_movie() {
                let url = movie.web_url();
                let title = movie.title.clone();
                match open::that(&url) {
                    Ok(()) => app.set_status(format!("Opening {}...", title)),
                    Err(e) => app.set_status(format!("Failed to open browser: {}", e)),
                }
            }
        }
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::Back => handle_back(app),
    }

    Action::Continue
}

/// Esc: leave the favorites view, or clear a failed page so it is retried.
fn handle_back(app: &mut App) {
    match app.view {
        View::Favorites => app.view = View::Feed,
        View::Feed => {
            if let FeedState::Error { .. } = app.feed.state() {
                if let Some(err) = app.feed.acknowledge_error() {
                    tracing::debug!(error = %err, "Retrying failed page");
                }
                app.trigger.rearm();
            }
        }
    }
}

/// Help overlay: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
}
