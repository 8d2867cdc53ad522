//! Text helpers for rendering catalog data in the terminal.
//!
//! Titles and overviews come from a third-party service, so everything shown
//! on screen goes through [`sanitize_line`] first, then gets fitted to the
//! available columns with [`truncate_to_width`].

mod text;

pub use text::{display_width, format_rating, sanitize_line, truncate_to_width};
