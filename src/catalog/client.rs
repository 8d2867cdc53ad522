use super::types::{CatalogError, MovieSummary, PopularPage};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default catalog endpoint (TMDB v3).
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

// ============================================================================
// Page Source
// ============================================================================

/// Anything that can produce one page of the popular-movies feed.
///
/// The feed controller only depends on this seam, so tests can drive it with
/// scripted sources while the application uses [`CatalogClient`].
pub trait PageSource: Clone + Send + Sync + 'static {
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Vec<MovieSummary>, CatalogError>> + Send;
}

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Create a redirect policy with loop detection and limited hops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        // Log without the query string: it carries the API key
        tracing::debug!(
            to = %format!("{}{}", url.host_str().unwrap_or(""), url.path()),
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Build the shared HTTP client used for every catalog request.
///
/// `timeout` is a transport-level limit; a request exceeding it surfaces as
/// an ordinary upstream failure for the page being fetched.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .build()
}

// ============================================================================
// Catalog Client
// ============================================================================

struct Inner {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

/// Stateless client for the external movie catalog.
///
/// Cheap to clone: all clones share one connection pool. The client never
/// retries on its own; every failure is reported to the caller.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl CatalogClient {
    /// Create a client for `base_url`.
    ///
    /// HTTPS is required so the API key never travels in clear text; plain
    /// HTTP is accepted for localhost only (mock servers in tests).
    pub fn new(http: reqwest::Client, base_url: &str, api_key: SecretString) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("Invalid catalog base URL '{}'", trimmed))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                let is_localhost = matches!(parsed.host_str(), Some("127.0.0.1" | "localhost"));
                if !is_localhost {
                    anyhow::bail!(
                        "Insecure catalog base URL '{}': HTTPS required (except localhost)",
                        trimmed
                    );
                }
                tracing::warn!(base_url = %trimmed, "Using non-HTTPS catalog base URL (localhost only)");
            }
            other => anyhow::bail!("Unsupported catalog URL scheme '{}'", other),
        }

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: trimmed.to_string(),
                api_key,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Fetch one page of popular movies.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidPage`] for page 0, without touching the network
    /// - [`CatalogError::UpstreamUnavailable`] for transport errors, timeouts,
    ///   non-2xx statuses, oversized or undecodable bodies
    ///
    /// An empty `results` array is a successful, empty page.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<MovieSummary>, CatalogError> {
        if page == 0 {
            return Err(CatalogError::InvalidPage(page));
        }

        let unavailable = |reason: String| CatalogError::UpstreamUnavailable { page, reason };

        let url = self
            .endpoint("movie/popular", &[("page", &page.to_string())])
            .map_err(unavailable)?;
        let bytes = self.get_bytes(url).await.map_err(unavailable)?;
        let parsed: PopularPage = serde_json::from_slice(&bytes)
            .map_err(|e| unavailable(format!("Invalid response body: {}", e)))?;

        tracing::debug!(page, count = parsed.results.len(), "Fetched catalog page");
        Ok(parsed.results)
    }

    /// Look up a single movie by identifier.
    pub async fn fetch_movie(&self, id: i64) -> Result<MovieSummary, CatalogError> {
        let unavailable = |reason: String| CatalogError::MovieUnavailable { id, reason };

        let url = self
            .endpoint(&format!("movie/{}", id), &[])
            .map_err(unavailable)?;
        let bytes = self.get_bytes(url).await.map_err(unavailable)?;
        let movie: MovieSummary = serde_json::from_slice(&bytes)
            .map_err(|e| unavailable(format!("Invalid response body: {}", e)))?;

        Ok(movie)
    }

    /// Look up several movies, at most `concurrency` requests at a time.
    ///
    /// Results arrive in completion order, each paired with its id.
    pub async fn fetch_movies(
        &self,
        ids: Vec<i64>,
        concurrency: usize,
    ) -> Vec<(i64, Result<MovieSummary, CatalogError>)> {
        futures::stream::iter(ids)
            .map(|id| {
                let client = self.clone();
                async move { (id, client.fetch_movie(id).await) }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    /// Build `{base}/{path}?api_key=..&{query}`.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, String> {
        let mut url = Url::parse(&format!("{}/{}", self.inner.base_url, path))
            .map_err(|e| format!("Invalid request URL: {}", e))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", self.inner.api_key.expose_secret());
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET `url` and return the body, mapping every failure to a message.
    ///
    /// Messages never include the request URL, which carries the API key.
    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, String> {
        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Catalog returned non-success status");
            return Err(format!("HTTP {}", status.as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }
}

impl PageSource for CatalogClient {
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Vec<MovieSummary>, CatalogError>> + Send {
        CatalogClient::fetch_page(self, page)
    }
}

fn describe_transport_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else {
        format!("Request failed: {}", err.without_url())
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, String> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(format!("Response too large ({} bytes)", len));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(describe_transport_error)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err("Response too large".to_string());
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> Result<CatalogClient> {
        CatalogClient::new(
            reqwest::Client::new(),
            base,
            SecretString::from("test-key".to_string()),
        )
    }

    #[test]
    fn test_https_base_accepted_and_trimmed() {
        let c = client("https://api.themoviedb.org/3/").unwrap();
        assert_eq!(c.base_url(), "https://api.themoviedb.org/3");
    }

    #[test]
    fn test_http_localhost_accepted() {
        assert!(client("http://127.0.0.1:8080").is_ok());
        assert!(client("http://localhost:8080/3").is_ok());
    }

    #[test]
    fn test_http_remote_rejected() {
        let err = client("http://api.themoviedb.org/3").unwrap_err();
        assert!(err.to_string().contains("HTTPS required"));
    }

    #[test]
    fn test_garbage_base_rejected() {
        assert!(client("not a url").is_err());
        assert!(client("ftp://example.com").is_err());
    }

    #[test]
    fn test_endpoint_carries_key_and_page() {
        let c = client("https://api.themoviedb.org/3").unwrap();
        let url = c.endpoint("movie/popular", &[("page", "7")]).unwrap();
        assert_eq!(url.path(), "/3/movie/popular");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("api_key".to_string(), "test-key".to_string()),
                ("page".to_string(), "7".to_string())
            ]
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let c = client("https://api.themoviedb.org/3").unwrap();
        let debug = format!("{:?}", c);
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_page_zero_rejected_without_network() {
        // Unroutable base: any network attempt would fail differently
        let c = client("https://unreachable.invalid").unwrap();
        assert_eq!(c.fetch_page(0).await, Err(CatalogError::InvalidPage(0)));
    }
}
