//! Application event handling.
//!
//! Applies results reported by background tasks: feed pages, favorite
//! toggles and favorites-view loads. All state changes happen here, on the
//! event loop.

use crate::app::{App, AppEvent, View};
use crate::feed::{PageOutcome, PageResult};

/// Process one event from a background task.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::PageLoaded(done) => handle_page_loaded(app, done),
        AppEvent::FavoriteToggled { movie_id, favorite } => {
            handle_favorite_toggled(app, movie_id, favorite);
        }
        AppEvent::FavoriteToggleFailed { movie_id, error } => {
            tracing::warn!(movie_id, error = %error, "Favorite toggle rejected");
            app.set_status(format!("Favorite not saved: {}", error));
        }
        AppEvent::FavoritesLoaded {
            generation,
            movies,
            failed,
        } => {
            if generation != app.favorites_view.generation {
                tracing::debug!(generation, current = app.favorites_view.generation, "Discarding stale favorites load");
                return;
            }
            app.remember_movies(&movies);
            // Toggles that landed while loading win over the snapshot
            let favorites = &app.favorites;
            app.favorites_view.movies = movies
                .into_iter()
                .filter(|m| favorites.is_favorite(m.id))
                .collect();
            app.favorites_view.loading = false;
            app.clamp_selections();
            if failed > 0 {
                app.set_status(format!("{} favorite(s) could not be loaded", failed));
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            if task == "favorites_load" {
                app.favorites_view.loading = false;
            }
            app.set_status(format!("Internal error in {} task", task));
        }
    }
    app.needs_redraw = true;
}

fn handle_page_loaded(app: &mut App, done: PageResult) {
    let Some(outcome) = app.feed.complete(done) else {
        // A result from before a reload frees the request slot; a sentinel
        // still on screen can now fetch for the new session
        if app.feed.in_flight().is_none() {
            app.trigger.rearm();
        }
        return;
    };

    match outcome {
        PageOutcome::Appended { count, .. } => {
            let items = app.feed.items();
            for movie in &items[items.len() - count..] {
                app.movie_cache.put(movie.id, movie.clone());
            }
            // A sentinel that is still on screen should pull the next page
            app.trigger.rearm();
        }
        PageOutcome::Exhausted { page } => {
            tracing::info!(page, "Reached end of catalog");
        }
        PageOutcome::Failed(e) => {
            app.set_status(e.to_string());
        }
    }
    app.clamp_selections();
}

fn handle_favorite_toggled(app: &mut App, movie_id: i64, favorite: bool) {
    let title = app
        .movie_title(movie_id)
        .unwrap_or_else(|| format!("Movie {}", movie_id));

    if favorite {
        app.set_status(format!("Added \"{}\" to favorites", title));
    } else {
        app.set_status(format!("Removed \"{}\" from favorites", title));
        if app.view == View::Favorites {
            app.remove_from_favorites_view(movie_id);
        }
    }
}
