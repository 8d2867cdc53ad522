use std::future::Future;

use crate::catalog::{CatalogError, MovieSummary, PageSource};

// ============================================================================
// State
// ============================================================================

/// Where the feed is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Ready to fetch the page at the cursor.
    Idle,
    /// A page request is in flight. Further requests are refused.
    Fetching,
    /// A fetched page came back empty. Terminal for the session.
    Exhausted,
    /// The last fetch failed. The cursor did not move; the next request
    /// retries the same page.
    Error { retryable: bool },
}

/// Permission to fetch one page, issued by [`FeedController::begin_next_page`].
///
/// Tickets are bound to the controller session that issued them, so a result
/// arriving after [`FeedController::reset`] is recognized and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub session: u64,
    pub page: u32,
}

/// A finished fetch, ready to be handed back to [`FeedController::complete`].
#[derive(Debug, Clone)]
pub struct PageResult {
    pub ticket: PageTicket,
    pub result: Result<Vec<MovieSummary>, CatalogError>,
}

/// What a completed fetch did to the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// `count` items were appended from `page`; the cursor moved past it.
    Appended { page: u32, count: usize },
    /// `page` was empty; no further pages will be requested.
    Exhausted { page: u32 },
    /// The fetch failed; `page` stays at the cursor.
    Failed(CatalogError),
}

// ============================================================================
// FeedController
// ============================================================================

/// Owns the growing movie list and the page cursor.
///
/// At most one page request is in flight at any time: every request path goes
/// through [`begin_next_page`](Self::begin_next_page), which refuses while a
/// fetch is outstanding or the feed is exhausted. The outstanding ticket is
/// tracked across [`reset`](Self::reset), so a new session cannot start a
/// second request until the old one has been handed to
/// [`complete`](Self::complete).
///
/// The I/O itself is split from the state change so the event loop can run
/// [`fetch`](Self::fetch) in a background task and apply the result later
/// with [`complete`](Self::complete). [`request_next_page`](Self::request_next_page)
/// runs all three steps inline.
#[derive(Debug)]
pub struct FeedController<S: PageSource> {
    source: S,
    session: u64,
    items: Vec<MovieSummary>,
    cursor: u32,
    state: FeedState,
    last_error: Option<CatalogError>,
    in_flight: Option<PageTicket>,
}

impl<S: PageSource> FeedController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            session: 0,
            items: Vec::new(),
            cursor: 1,
            state: FeedState::Idle,
            last_error: None,
            in_flight: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Everything fetched this session, in fetch order.
    pub fn items(&self) -> &[MovieSummary] {
        &self.items
    }

    /// Next page to fetch.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == FeedState::Fetching
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == FeedState::Exhausted
    }

    /// Error from the most recent failed fetch, while in [`FeedState::Error`].
    pub fn last_error(&self) -> Option<&CatalogError> {
        self.last_error.as_ref()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Ticket of the request not yet completed, possibly from an earlier
    /// session.
    pub fn in_flight(&self) -> Option<PageTicket> {
        self.in_flight
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Claim the right to fetch the page at the cursor.
    ///
    /// Returns `None` while a fetch is in flight (this session or an earlier
    /// one) or once the feed is exhausted. From `Idle` or `Error` the state
    /// moves to `Fetching`.
    pub fn begin_next_page(&mut self) -> Option<PageTicket> {
        if let Some(pending) = self.in_flight {
            tracing::trace!(
                page = pending.page,
                session = pending.session,
                "Ignoring page request, previous fetch outstanding"
            );
            return None;
        }
        match self.state {
            FeedState::Fetching | FeedState::Exhausted => {
                tracing::trace!(state = ?self.state, "Ignoring page request");
                None
            }
            FeedState::Idle | FeedState::Error { .. } => {
                self.state = FeedState::Fetching;
                self.last_error = None;
                let ticket = PageTicket {
                    session: self.session,
                    page: self.cursor,
                };
                self.in_flight = Some(ticket);
                tracing::debug!(page = ticket.page, session = ticket.session, "Requesting page");
                Some(ticket)
            }
        }
    }

    /// Fetch the ticket's page from the source.
    ///
    /// The returned future owns a clone of the source and does not borrow the
    /// controller, so it can be spawned.
    pub fn fetch(&self, ticket: PageTicket) -> impl Future<Output = PageResult> + Send + 'static {
        let source = self.source.clone();
        async move {
            let result = source.fetch_page(ticket.page).await;
            PageResult { ticket, result }
        }
    }

    /// Apply a finished fetch.
    ///
    /// Returns `None` and leaves the feed untouched when the result is stale:
    /// issued by an earlier session, or not the page currently in flight. A
    /// stale result for the outstanding ticket still frees the request slot.
    pub fn complete(&mut self, done: PageResult) -> Option<PageOutcome> {
        let PageResult { ticket, result } = done;

        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        if ticket.session != self.session
            || self.state != FeedState::Fetching
            || ticket.page != self.cursor
        {
            tracing::debug!(
                page = ticket.page,
                session = ticket.session,
                current_session = self.session,
                "Discarding stale page result"
            );
            return None;
        }

        let outcome = match result {
            Ok(movies) if movies.is_empty() => {
                self.state = FeedState::Exhausted;
                tracing::info!(page = ticket.page, total = self.items.len(), "Feed exhausted");
                PageOutcome::Exhausted { page: ticket.page }
            }
            Ok(movies) => {
                let count = movies.len();
                self.items.extend(movies);
                self.cursor += 1;
                self.state = FeedState::Idle;
                tracing::debug!(page = ticket.page, count, total = self.items.len(), "Page appended");
                PageOutcome::Appended {
                    page: ticket.page,
                    count,
                }
            }
            Err(e) => {
                tracing::warn!(page = ticket.page, error = %e, "Page fetch failed");
                self.state = FeedState::Error { retryable: true };
                self.last_error = Some(e.clone());
                PageOutcome::Failed(e)
            }
        };

        Some(outcome)
    }

    /// Fetch the next page inline and apply it.
    ///
    /// `None` when the request was refused (in flight or exhausted).
    pub async fn request_next_page(&mut self) -> Option<PageOutcome> {
        let ticket = self.begin_next_page()?;
        let done = self.fetch(ticket).await;
        self.complete(done)
    }

    /// Take the error of a failed fetch and return to `Idle`.
    pub fn acknowledge_error(&mut self) -> Option<CatalogError> {
        if let FeedState::Error { .. } = self.state {
            self.state = FeedState::Idle;
            self.last_error.take()
        } else {
            None
        }
    }

    /// Start a new session from page 1.
    ///
    /// Results of fetches issued before the reset will be discarded. A fetch
    /// still outstanding keeps blocking new requests until it completes.
    pub fn reset(&mut self) {
        self.session = self.session.wrapping_add(1);
        self.items.clear();
        self.cursor = 1;
        self.state = FeedState::Idle;
        self.last_error = None;
        tracing::debug!(session = self.session, "Feed reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Source that is never actually awaited by these tests.
    #[derive(Clone)]
    struct NullSource;

    impl PageSource for NullSource {
        async fn fetch_page(&self, _page: u32) -> Result<Vec<MovieSummary>, CatalogError> {
            Ok(Vec::new())
        }
    }

    fn movie(id: i64) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {}", id),
            rating: 7.0,
            poster_path: None,
            release_date: None,
            overview: None,
        }
    }

    fn page(ids: std::ops::Range<i64>) -> Vec<MovieSummary> {
        ids.map(movie).collect()
    }

    fn ok(ticket: PageTicket, movies: Vec<MovieSummary>) -> PageResult {
        PageResult {
            ticket,
            result: Ok(movies),
        }
    }

    fn failed(ticket: PageTicket) -> PageResult {
        PageResult {
            ticket,
            result: Err(CatalogError::UpstreamUnavailable {
                page: ticket.page,
                reason: "HTTP 500".to_string(),
            }),
        }
    }

    fn ids(c: &FeedController<NullSource>) -> Vec<i64> {
        c.items().iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_initial_state() {
        let c = FeedController::new(NullSource);
        assert_eq!(c.state(), FeedState::Idle);
        assert_eq!(c.cursor(), 1);
        assert!(c.items().is_empty());
        assert!(!c.is_loading());
        assert!(!c.is_exhausted());
    }

    #[test]
    fn test_second_request_refused_while_fetching() {
        let mut c = FeedController::new(NullSource);
        let ticket = c.begin_next_page().unwrap();
        assert_eq!(ticket.page, 1);
        assert!(c.is_loading());

        assert_eq!(c.begin_next_page(), None);
        assert_eq!(c.begin_next_page(), None);
    }

    #[test]
    fn test_nonempty_page_appends_and_advances() {
        let mut c = FeedController::new(NullSource);
        let t1 = c.begin_next_page().unwrap();
        assert_eq!(
            c.complete(ok(t1, page(1..21))),
            Some(PageOutcome::Appended { page: 1, count: 20 })
        );
        assert_eq!(c.cursor(), 2);
        assert_eq!(c.state(), FeedState::Idle);

        let t2 = c.begin_next_page().unwrap();
        assert_eq!(t2.page, 2);
        c.complete(ok(t2, page(21..41)));

        assert_eq!(c.items().len(), 40);
        assert_eq!(ids(&c), (1..41).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_page_exhausts_permanently() {
        let mut c = FeedController::new(NullSource);
        let t = c.begin_next_page().unwrap();
        c.complete(ok(t, page(1..4)));

        let t = c.begin_next_page().unwrap();
        assert_eq!(
            c.complete(ok(t, Vec::new())),
            Some(PageOutcome::Exhausted { page: 2 })
        );
        assert!(c.is_exhausted());
        assert_eq!(c.cursor(), 2);

        for _ in 0..5 {
            assert_eq!(c.begin_next_page(), None);
        }
        assert_eq!(c.items().len(), 3);
    }

    #[test]
    fn test_failure_keeps_cursor_and_allows_retry() {
        let mut c = FeedController::new(NullSource);
        let t = c.begin_next_page().unwrap();
        c.complete(ok(t, page(1..21)));

        let t = c.begin_next_page().unwrap();
        let outcome = c.complete(failed(t)).unwrap();
        assert!(matches!(outcome, PageOutcome::Failed(_)));
        assert_eq!(c.state(), FeedState::Error { retryable: true });
        assert_eq!(c.cursor(), 2);
        assert_eq!(c.items().len(), 20);
        assert_eq!(c.last_error().and_then(CatalogError::page), Some(2));

        let retry = c.begin_next_page().unwrap();
        assert_eq!(retry.page, 2);
        assert!(c.last_error().is_none());
        c.complete(ok(retry, page(21..41)));
        assert_eq!(c.cursor(), 3);
        assert_eq!(c.items().len(), 40);
    }

    #[test]
    fn test_acknowledge_error_returns_to_idle() {
        let mut c = FeedController::new(NullSource);
        let t = c.begin_next_page().unwrap();
        c.complete(failed(t));

        let err = c.acknowledge_error().unwrap();
        assert_eq!(err.page(), Some(1));
        assert_eq!(c.state(), FeedState::Idle);
        assert_eq!(c.acknowledge_error(), None);
    }

    #[test]
    fn test_acknowledge_error_outside_error_state_is_noop() {
        let mut c = FeedController::new(NullSource);
        let _t = c.begin_next_page().unwrap();
        assert_eq!(c.acknowledge_error(), None);
        assert!(c.is_loading());
    }

    #[test]
    fn test_duplicate_ids_across_pages_are_kept() {
        let mut c = FeedController::new(NullSource);
        let t = c.begin_next_page().unwrap();
        c.complete(ok(t, page(1..4)));
        let t = c.begin_next_page().unwrap();
        c.complete(ok(t, page(3..6)));

        assert_eq!(ids(&c), vec![1, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn test_result_from_previous_session_is_ignored() {
        let mut c = FeedController::new(NullSource);
        let old = c.begin_next_page().unwrap();
        c.reset();
        assert_eq!(c.session(), old.session + 1);
        assert_eq!(c.in_flight(), Some(old));

        // Still outstanding, so the new session waits
        assert_eq!(c.begin_next_page(), None);

        assert_eq!(c.complete(ok(old, page(1..21))), None);
        assert!(c.items().is_empty());
        assert_eq!(c.state(), FeedState::Idle);
        assert_eq!(c.in_flight(), None);

        let fresh = c.begin_next_page().unwrap();
        assert_eq!(fresh.page, 1);
        assert_ne!(fresh, old);
    }

    #[test]
    fn test_repeated_reset_mid_fetch_keeps_one_request() {
        let mut c = FeedController::new(NullSource);
        let old = c.begin_next_page().unwrap();
        for _ in 0..5 {
            c.reset();
            assert_eq!(c.begin_next_page(), None);
        }
        assert_eq!(c.in_flight(), Some(old));

        assert_eq!(c.complete(failed(old)), None);
        assert_eq!(c.state(), FeedState::Idle);
        assert!(c.last_error().is_none());
        assert!(c.begin_next_page().is_some());
    }

    #[test]
    fn test_completion_without_request_is_ignored() {
        let mut c = FeedController::new(NullSource);
        let forged = PageTicket {
            session: c.session(),
            page: 1,
        };
        assert_eq!(c.complete(ok(forged, page(1..3))), None);
        assert!(c.items().is_empty());

        let real = c.begin_next_page().unwrap();
        let wrong_page = PageTicket { page: 7, ..real };
        assert_eq!(c.complete(ok(wrong_page, page(1..3))), None);
        assert_eq!(c.in_flight(), Some(real));
    }

    #[test]
    fn test_reset_clears_exhaustion() {
        let mut c = FeedController::new(NullSource);
        let t = c.begin_next_page().unwrap();
        c.complete(ok(t, Vec::new()));
        assert!(c.is_exhausted());

        c.reset();
        assert_eq!(c.state(), FeedState::Idle);
        assert_eq!(c.cursor(), 1);
        assert!(c.begin_next_page().is_some());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Trigger,
        CompleteWith(usize),
        CompleteEmpty,
        CompleteFailed,
        Acknowledge,
        Reset,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => Just(Op::Trigger),
            3 => (1usize..5).prop_map(Op::CompleteWith),
            1 => Just(Op::CompleteEmpty),
            2 => Just(Op::CompleteFailed),
            1 => Just(Op::Acknowledge),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn prop_at_most_one_request_in_flight(ops in proptest::collection::vec(arb_op(), 1..80)) {
            let mut c = FeedController::new(NullSource);
            let mut outstanding: Vec<PageTicket> = Vec::new();
            let mut next_id = 0i64;

            for op in ops {
                let before_len = c.items().len();
                let before_cursor = c.cursor();
                let before_session = c.session();

                match op {
                    Op::Trigger => {
                        if let Some(t) = c.begin_next_page() {
                            outstanding.push(t);
                        }
                    }
                    Op::CompleteWith(n) => {
                        if let Some(t) = outstanding.pop() {
                            let movies = (0..n).map(|_| { next_id += 1; movie(next_id) }).collect();
                            c.complete(ok(t, movies));
                        }
                    }
                    Op::CompleteEmpty => {
                        if let Some(t) = outstanding.pop() {
                            c.complete(ok(t, Vec::new()));
                        }
                    }
                    Op::CompleteFailed => {
                        if let Some(t) = outstanding.pop() {
                            c.complete(failed(t));
                        }
                    }
                    Op::Acknowledge => {
                        c.acknowledge_error();
                    }
                    Op::Reset => c.reset(),
                }

                prop_assert!(outstanding.len() <= 1, "{} requests in flight", outstanding.len());
                prop_assert_eq!(c.in_flight(), outstanding.last().copied());
                let live = outstanding.iter().filter(|t| t.session == c.session()).count();
                prop_assert_eq!(c.is_loading(), live == 1);

                if c.session() == before_session {
                    prop_assert!(c.items().len() >= before_len);
                    prop_assert!(c.cursor() == before_cursor || c.cursor() == before_cursor + 1);
                }
                if c.is_exhausted() {
                    prop_assert!(c.begin_next_page().is_none());
                }
            }
        }
    }
}
