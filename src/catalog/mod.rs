//! Client for the external movie catalog service.
//!
//! - [`client`] - HTTP requests against the catalog API and the [`PageSource`] seam
//! - [`types`] - Movie summaries, wire payloads and errors
//!
//! The client is stateless: it fetches exactly what it is asked for and never
//! retries. Pagination state lives in [`crate::feed::FeedController`].

mod client;
mod types;

pub use client::{build_http_client, CatalogClient, PageSource, DEFAULT_BASE_URL};
pub use types::{CatalogError, MovieSummary};
