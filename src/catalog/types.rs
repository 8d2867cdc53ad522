use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Base URL for poster images served by the catalog's image CDN.
const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Public web page for a movie, used by "open in browser".
const WEB_BASE_URL: &str = "https://www.themoviedb.org/movie";

// ============================================================================
// Error Types
// ============================================================================

/// Errors returned by the catalog client.
///
/// Every failure of a page fetch collapses into `UpstreamUnavailable` carrying
/// the page number that was attempted. Retry policy belongs to the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    /// Transport failure, timeout, non-2xx status or undecodable body.
    #[error("Catalog unavailable for page {page}: {reason}")]
    UpstreamUnavailable { page: u32, reason: String },

    /// Pages are numbered from 1.
    #[error("Invalid page number {0}: pages start at 1")]
    InvalidPage(u32),

    /// Single-movie lookup failed.
    #[error("Movie {id} unavailable: {reason}")]
    MovieUnavailable { id: i64, reason: String },
}

impl CatalogError {
    /// Page number carried by a page-level failure.
    pub fn page(&self) -> Option<u32> {
        match self {
            CatalogError::UpstreamUnavailable { page, .. } => Some(*page),
            CatalogError::InvalidPage(page) => Some(*page),
            CatalogError::MovieUnavailable { .. } => None,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// One entry of the popular-movies feed.
///
/// Immutable once fetched. Equality compares identifiers only, so two
/// summaries of the same movie fetched at different times are equal.
///
/// Only `id` is required on the wire. A missing or null `title` or
/// `vote_average` decodes as empty or zero rather than failing the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Average vote on a 0-10 scale.
    #[serde(rename = "vote_average", default, deserialize_with = "null_as_default")]
    pub rating: f64,
    /// Opaque path relative to the image CDN, e.g. `/abc123.jpg`.
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl PartialEq for MovieSummary {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MovieSummary {}

impl MovieSummary {
    /// Full poster URL for the given CDN size (e.g. `w500`), if the movie has one.
    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}/{}{}", IMAGE_BASE_URL, size, p))
    }

    /// Public catalog page for this movie.
    pub fn web_url(&self) -> String {
        format!("{}/{}", WEB_BASE_URL, self.id)
    }

    /// Release year parsed from `release_date` (`YYYY-MM-DD`).
    ///
    /// Empty or malformed dates yield `None`; the catalog sends `""` for
    /// unreleased titles.
    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;

        let date = self.release_date.as_deref()?;
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Wire shape of `GET /movie/popular`.
///
/// Only `results` is consumed; the catalog's own `page`/`total_pages` fields
/// are ignored because pagination is driven by a local page counter.
#[derive(Debug, Deserialize)]
pub(crate) struct PopularPage {
    #[serde(default)]
    pub results: Vec<MovieSummary>,
}
