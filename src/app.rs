use std::borrow::Cow;
use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::time::Instant;

use crate::catalog::{CatalogClient, MovieSummary};
use crate::favorites::FavoritesStore;
use crate::feed::{FeedController, PageResult, ScrollTrigger, Viewport};
use crate::keybindings::{Context, KeybindingRegistry};

/// Movies remembered from the feed so the favorites view can skip lookups.
const MOVIE_CACHE_CAPACITY: usize = 1024;

/// How long a status message stays on screen.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// View State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Paginated popular-movies feed.
    Feed,
    /// Movies the user has favorited.
    Favorites,
}

impl View {
    pub fn context(self) -> Context {
        match self {
            View::Feed => Context::Feed,
            View::Favorites => Context::Favorites,
        }
    }
}

/// Cursor and scroll position of a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCursor {
    pub selected: usize,
    pub offset: usize,
}

impl ListCursor {
    pub fn down(&mut self, by: usize, len: usize) {
        if len > 0 {
            self.selected = self.selected.saturating_add(by).min(len - 1);
        }
    }

    pub fn up(&mut self, by: usize) {
        self.selected = self.selected.saturating_sub(by);
    }

    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Favorites listing, resolved from ids to movies in the background.
#[derive(Debug, Default)]
pub struct FavoritesViewState {
    pub movies: Vec<MovieSummary>,
    pub loading: bool,
    /// Incremented per load; results from older loads are dropped.
    pub generation: u64,
    pub cursor: ListCursor,
}

// ============================================================================
// Events
// ============================================================================

/// Results reported back to the event loop by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// A feed page fetch finished (successfully or not).
    PageLoaded(PageResult),
    /// A favorite toggle was persisted.
    FavoriteToggled { movie_id: i64, favorite: bool },
    /// A favorite toggle could not be persisted; nothing changed.
    FavoriteToggleFailed { movie_id: i64, error: String },
    /// The favorites view finished resolving ids.
    FavoritesLoaded {
        generation: u64,
        movies: Vec<MovieSummary>,
        failed: usize,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state, owned by the event loop.
pub struct App {
    pub catalog: CatalogClient,
    pub favorites: FavoritesStore,
    pub feed: FeedController<CatalogClient>,
    pub trigger: ScrollTrigger,
    pub keybindings: KeybindingRegistry,

    pub view: View,
    pub feed_cursor: ListCursor,
    /// Window of the feed list drawn in the last frame, sentinel row included.
    pub feed_viewport: Viewport,
    pub favorites_view: FavoritesViewState,
    /// Rows visible in whichever list was drawn last, for paging.
    pub list_rows: usize,

    pub movie_cache: LruCache<i64, MovieSummary>,
    pub favorites_concurrency: usize,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub show_help: bool,
    pub help_scroll_offset: usize,
}

impl App {
    pub fn new(
        catalog: CatalogClient,
        favorites: FavoritesStore,
        keybindings: KeybindingRegistry,
        favorites_concurrency: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(MOVIE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);

        Self {
            feed: FeedController::new(catalog.clone()),
            catalog,
            favorites,
            trigger: ScrollTrigger::new(),
            keybindings,
            view: View::Feed,
            feed_cursor: ListCursor::default(),
            feed_viewport: Viewport::default(),
            favorites_view: FavoritesViewState::default(),
            list_rows: 0,
            movie_cache: LruCache::new(capacity),
            favorites_concurrency,
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
        }
    }

    /// Movie under the cursor in the current view.
    pub fn selected_movie(&self) -> Option<&MovieSummary> {
        match self.view {
            View::Feed => self.feed.items().get(self.feed_cursor.selected),
            View::Favorites => self
                .favorites_view
                .movies
                .get(self.favorites_view.cursor.selected),
        }
    }

    fn current_list(&mut self) -> (&mut ListCursor, usize) {
        match self.view {
            View::Feed => (&mut self.feed_cursor, self.feed.items().len()),
            View::Favorites => (
                &mut self.favorites_view.cursor,
                self.favorites_view.movies.len(),
            ),
        }
    }

    pub fn nav_down(&mut self, by: usize) {
        let (cursor, len) = self.current_list();
        cursor.down(by, len);
    }

    pub fn nav_up(&mut self, by: usize) {
        let (cursor, _) = self.current_list();
        cursor.up(by);
    }

    /// Rows to move for a page jump, keeping one row of context.
    pub fn page_size(&self) -> usize {
        self.list_rows.saturating_sub(1).max(1)
    }

    /// Keep both cursors inside their lists after the lists change.
    pub fn clamp_selections(&mut self) {
        self.feed_cursor.clamp(self.feed.items().len());
        let len = self.favorites_view.movies.len();
        self.favorites_view.cursor.clamp(len);
    }

    /// Remember fetched movies for the favorites view.
    pub fn remember_movies<'a>(&mut self, movies: impl IntoIterator<Item = &'a MovieSummary>) {
        for movie in movies {
            self.movie_cache.put(movie.id, movie.clone());
        }
    }

    /// Drop a movie from the favorites listing once it is no longer a favorite.
    pub fn remove_from_favorites_view(&mut self, movie_id: i64) {
        let before = self.favorites_view.movies.len();
        self.favorites_view.movies.retain(|m| m.id != movie_id);
        if self.favorites_view.movies.len() != before {
            self.clamp_selections();
        }
    }

    /// Title for status messages, from whatever list still has the movie.
    pub fn movie_title(&self, movie_id: i64) -> Option<String> {
        self.feed
            .items()
            .iter()
            .chain(self.favorites_view.movies.iter())
            .find(|m| m.id == movie_id)
            .map(|m| m.title.clone())
            .or_else(|| self.movie_cache.peek(&movie_id).map(|m| m.title.clone()))
    }

    /// Start a new favorites load and return its generation.
    pub fn begin_favorites_load(&mut self) -> u64 {
        self.favorites_view.generation = self.favorites_view.generation.wrapping_add(1);
        self.favorites_view.loading = true;
        self.favorites_view.generation
    }

    /// Set status message (expires after 3 seconds).
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message if it expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
