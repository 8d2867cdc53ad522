//! Helper functions shared across the UI layer: background task spawning,
//! panic capture and list scrolling.

use crate::app::{App, AppEvent};
use crate::catalog::{CatalogError, MovieSummary};
use crate::feed::{PageResult, Viewport};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Spawned tasks report a panic as `Err(message)` instead of vanishing, so the
/// event loop can surface it and repair any state waiting on the task.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Send an event to the loop, logging when the receiver is gone (app exiting).
async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent, name: &'static str) {
    if let Err(e) = tx.send(event).await {
        tracing::debug!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

// ============================================================================
// Scrolling
// ============================================================================

/// Scroll offset that keeps `selected` and the row after it on screen.
///
/// `total_rows` counts every row of the list, including trailing rows that
/// cannot be selected (the feed's sentinel). Keeping the next row visible is
/// what brings the sentinel into view when the cursor reaches the last item.
pub(super) fn scroll_into_view(selected: usize, offset: usize, rows: usize, total_rows: usize) -> usize {
    if rows == 0 || total_rows == 0 {
        return 0;
    }

    let lookahead = (selected + 1).min(total_rows - 1);
    let mut offset = offset.min(total_rows.saturating_sub(rows));

    if selected < offset {
        offset = selected;
    }
    if lookahead >= offset + rows {
        offset = lookahead + 1 - rows;
    }
    offset.min(selected)
}

/// Viewport of a list after scrolling `selected` into view.
pub(super) fn feed_viewport(selected: usize, offset: usize, rows: usize, total_rows: usize) -> Viewport {
    Viewport {
        offset: scroll_into_view(selected, offset, rows, total_rows),
        rows,
    }
}

// ============================================================================
// Background Tasks
// ============================================================================

/// Start fetching the next feed page, if the controller allows a request.
///
/// Returns whether a fetch was started.
pub(super) fn spawn_page_fetch(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    let Some(ticket) = app.feed.begin_next_page() else {
        return false;
    };

    let fetch = app.feed.fetch(ticket);
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(fetch).await {
            Ok(done) => send_event(&tx, AppEvent::PageLoaded(done), "PageLoaded").await,
            Err(panic_msg) => {
                tracing::error!(task = "page_fetch", page = ticket.page, error = %panic_msg, "Background task panicked");
                // Release the in-flight slot so the feed can retry
                let failed = PageResult {
                    ticket,
                    result: Err(CatalogError::UpstreamUnavailable {
                        page: ticket.page,
                        reason: "internal error".to_string(),
                    }),
                };
                send_event(&tx, AppEvent::PageLoaded(failed), "PageLoaded").await;
                send_event(
                    &tx,
                    AppEvent::TaskPanicked {
                        task: "page_fetch",
                        error: panic_msg,
                    },
                    "TaskPanicked",
                )
                .await;
            }
        }
    });

    app.needs_redraw = true;
    true
}

/// Persist a favorite toggle in the background.
///
/// The on-screen glyph changes only when the toggle has been written.
pub(super) fn spawn_favorite_toggle(app: &mut App, movie_id: i64, event_tx: &mpsc::Sender<AppEvent>) {
    let favorites = app.favorites.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let outcome = catch_task_panic(favorites.toggle(movie_id)).await;
        let event = match outcome {
            Ok(Ok(favorite)) => AppEvent::FavoriteToggled { movie_id, favorite },
            Ok(Err(e)) => AppEvent::FavoriteToggleFailed {
                movie_id,
                error: e.to_string(),
            },
            Err(panic_msg) => {
                tracing::error!(task = "favorite_toggle", movie_id, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task: "favorite_toggle",
                    error: panic_msg,
                }
            }
        };
        send_event(&tx, event, "FavoriteToggle").await;
    });
}

/// Resolve every favorite id to a movie for the favorites view.
///
/// Movies seen in the feed come from the cache; the rest are looked up.
pub fn spawn_favorites_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.begin_favorites_load();

    let mut movies: Vec<MovieSummary> = Vec::new();
    let mut missing: Vec<i64> = Vec::new();
    for id in app.favorites.ids() {
        match app.movie_cache.get(&id) {
            Some(movie) => movies.push(movie.clone()),
            None => missing.push(id),
        }
    }

    tracing::debug!(
        generation,
        cached = movies.len(),
        missing = missing.len(),
        "Loading favorites view"
    );

    let catalog = app.catalog.clone();
    let concurrency = app.favorites_concurrency;
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let lookup = catch_task_panic(catalog.fetch_movies(missing, concurrency)).await;
        let event = match lookup {
            Ok(results) => {
                let mut failed = 0;
                for (id, result) in results {
                    match result {
                        Ok(movie) => movies.push(movie),
                        Err(e) => {
                            tracing::warn!(movie_id = id, error = %e, "Dropping unresolvable favorite");
                            failed += 1;
                        }
                    }
                }
                sort_by_title(&mut movies);
                AppEvent::FavoritesLoaded {
                    generation,
                    movies,
                    failed,
                }
            }
            Err(panic_msg) => {
                tracing::error!(task = "favorites_load", error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task: "favorites_load",
                    error: panic_msg,
                }
            }
        };
        send_event(&tx, event, "FavoritesLoaded").await;
    });
}

/// Case-insensitive title order, ties broken by id for a stable listing.
pub(super) fn sort_by_title(movies: &mut [MovieSummary]) {
    movies.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
}
