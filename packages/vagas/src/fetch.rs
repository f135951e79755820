//! Page fetcher: two-step search handshake plus snapshot decorator.
//!
//! The site only serves the full results page to a POST that carries an
//! anti-forgery token scraped from the landing page, and the token is tied
//! to the session cookie, so both requests must share one cookie jar.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::source::ListingSource;

/// CSS selector for the search form on the landing page
const SEARCH_FORM_SELECTOR: &str = "form.form-search-home";

/// Name of the hidden anti-forgery token field
const TOKEN_FIELD: &str = "__RequestVerificationToken";

/// Name of the search-query form field; empty value means "all listings"
const QUERY_FIELD: &str = "Expressao";

/// Live fetcher performing the GET → token → POST handshake.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSource {
    /// Create a fetcher for the given site origin.
    pub fn new(base_url: Url) -> FetchResult<Self> {
        // Browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self { client, base_url })
    }

    async fn get_landing_page(&self) -> FetchResult<String> {
        debug!(url = %self.base_url, "Fetching landing page");
        let response = self
            .client
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.base_url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))
    }

    async fn post_search(&self, action: &Url, token: &str) -> FetchResult<String> {
        debug!(url = %action, "Posting search form");
        let form = [(TOKEN_FIELD, token), (QUERY_FIELD, "")];
        let response = self
            .client
            .post(action.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: action.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))
    }
}

#[async_trait]
impl ListingSource for HttpSource {
    async fn fetch(&self) -> FetchResult<String> {
        let landing = self.get_landing_page().await?;
        let form = extract_search_form(&landing)?;
        let action = self.base_url.join(&form.action)?;

        let body = self.post_search(&action, &form.token).await?;
        info!(
            url = %action,
            content_length = body.len(),
            "Fetched search results"
        );
        Ok(body)
    }
}

/// Search-form fields scraped from the landing page.
#[derive(Debug)]
struct SearchForm {
    /// `action` attribute, usually a relative path
    action: String,
    /// Anti-forgery token value
    token: String,
}

/// Locate the search form and pull out its action and token.
///
/// Synchronous on purpose: `scraper::Html` is not `Send`, so it must not
/// live across an await point.
fn extract_search_form(html: &str) -> FetchResult<SearchForm> {
    let form_selector = Selector::parse(SEARCH_FORM_SELECTOR).unwrap();
    let token_selector = Selector::parse(&format!("input[name=\"{}\"]", TOKEN_FIELD)).unwrap();

    let document = Html::parse_document(html);
    let form = document
        .select(&form_selector)
        .next()
        .ok_or(FetchError::FormNotFound)?;

    let action = form
        .value()
        .attr("action")
        .ok_or(FetchError::FormNotFound)?
        .to_string();

    let token = form
        .select(&token_selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .ok_or(FetchError::TokenNotFound)?
        .to_string();

    Ok(SearchForm { action, token })
}

/// Sandbox decorator: serve a locally cached HTML snapshot when present,
/// and cache the live response for future runs otherwise.
///
/// A debugging aid for repeatable runs without live network access, in the
/// same decorator shape as the other source wrappers.
pub struct SnapshotSource<S> {
    inner: S,
    path: PathBuf,
}

impl<S> SnapshotSource<S> {
    pub fn new(inner: S, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

#[async_trait]
impl<S: ListingSource> ListingSource for SnapshotSource<S> {
    async fn fetch(&self) -> FetchResult<String> {
        if self.path.exists() {
            info!(path = %self.path.display(), "Using HTML snapshot instead of live fetch");
            return std::fs::read_to_string(&self.path).map_err(FetchError::Snapshot);
        }

        let html = self.inner.fetch().await?;

        // Best effort: a failed snapshot write must not fail the run
        if let Err(e) = std::fs::write(&self.path, &html) {
            warn!(path = %self.path.display(), error = %e, "Failed to cache HTML snapshot");
        } else {
            debug!(path = %self.path.display(), "Cached HTML snapshot");
        }

        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSource;

    const LANDING: &str = r#"
        <html><body>
          <form class="form-search-home" action="/Vaga/Pesquisar" method="post">
            <input name="__RequestVerificationToken" type="hidden" value="tok-123">
            <input name="Expressao" type="text">
          </form>
        </body></html>
    "#;

    #[test]
    fn extracts_action_and_token() {
        let form = extract_search_form(LANDING).unwrap();
        assert_eq!(form.action, "/Vaga/Pesquisar");
        assert_eq!(form.token, "tok-123");
    }

    #[test]
    fn missing_form_is_an_error() {
        let err = extract_search_form("<html><body>nothing here</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::FormNotFound));
    }

    #[test]
    fn missing_token_is_an_error() {
        let html = r#"<form class="form-search-home" action="/x"></form>"#;
        let err = extract_search_form(html).unwrap_err();
        assert!(matches!(err, FetchError::TokenNotFound));
    }

    #[test]
    fn form_action_resolves_against_origin() {
        let base = Url::parse("https://www.curitibati.com.br").unwrap();
        let form = extract_search_form(LANDING).unwrap();
        let action = base.join(&form.action).unwrap();
        assert_eq!(action.as_str(), "https://www.curitibati.com.br/Vaga/Pesquisar");
    }

    #[tokio::test]
    async fn snapshot_returns_cached_file_without_live_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.html");
        std::fs::write(&path, "<html>cached</html>").unwrap();

        let inner = MockSource::new("<html>live</html>");
        let source = SnapshotSource::new(inner, &path);

        let html = source.fetch().await.unwrap();
        assert_eq!(html, "<html>cached</html>");
        assert_eq!(source.inner.calls(), 0);
    }

    #[tokio::test]
    async fn snapshot_caches_live_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.html");

        let inner = MockSource::new("<html>live</html>");
        let source = SnapshotSource::new(inner, &path);

        let html = source.fetch().await.unwrap();
        assert_eq!(html, "<html>live</html>");
        assert_eq!(source.inner.calls(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>live</html>");

        // Second fetch is served from the snapshot
        let again = source.fetch().await.unwrap();
        assert_eq!(again, "<html>live</html>");
        assert_eq!(source.inner.calls(), 1);
    }
}
