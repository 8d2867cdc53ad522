//! Incremental feed loading.
//!
//! - [`controller`] - Page cursor, accumulated items and the fetch state machine
//! - [`trigger`] - Edge-triggered "load more" signal from sentinel visibility
//!
//! The controller is driven from the UI event loop: the trigger decides *when*
//! to ask for more, the controller decides *whether* a request may start and
//! owns everything fetched so far.

mod controller;
mod trigger;

pub use controller::{FeedController, FeedState, PageOutcome, PageResult, PageTicket};
pub use trigger::{ScrollTrigger, Viewport};
