use std::time::Duration;

use reqwest::{IntoUrl, Method, RequestBuilder};
use url::Url;

use crate::constants::{DEFAULT_TITLE_SEARCH_MAX_PAGES, Endpoints};
use crate::errors::BuildError;

const DEFAULT_USER_AGENT: &str = concat!("pdsls-redirect", "@", env!("CARGO_PKG_VERSION"),);

/// Per-request timeout applied unless overridden.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
#[must_use]
/// Configures a [`RedirectHttpClient`] before construction.
///
/// # Defaults
/// - Endpoints: production hosts, see [`Endpoints::default`]
/// - HTTP request timeout: [`DEFAULT_REQUEST_TIMEOUT`]
/// - User-agent: `pdsls-redirect@<crate-version>` plus any [`Self::user_agent_extra`]
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// # use pdsls_redirect::RedirectHttpClient;
/// let client = RedirectHttpClient::builder()
///     .request_timeout(Duration::from_secs(5))
///     .user_agent_extra("my-extension/1.0")
///     .build()?;
/// # Ok::<_, pdsls_redirect::BuildError>(())
/// ```
pub struct RedirectHttpClientBuilder {
    endpoints: Endpoints,
    http_request_timeout: Option<Duration>,
    title_search_max_pages: usize,

    /// Optional user-agent segment appended to the default UA.
    user_agent_extra: Option<String>,

    /// Origin serving every `did:web` document, for local test setups.
    did_web_origin: Option<Url>,
}

impl Default for RedirectHttpClientBuilder {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            http_request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            title_search_max_pages: DEFAULT_TITLE_SEARCH_MAX_PAGES,
            user_agent_extra: None,
            did_web_origin: None,
        }
    }
}

impl RedirectHttpClientBuilder {
    /// Replace the upstream endpoints.
    pub fn endpoints(&mut self, endpoints: Endpoints) -> &mut Self {
        self.endpoints = endpoints;
        self
    }

    /// Set HTTP requests timeout. `None` disables it.
    pub fn request_timeout(&mut self, timeout: impl Into<Option<Duration>>) -> &mut Self {
        self.http_request_timeout = timeout.into();
        self
    }

    /// Cap on pages read by a single title search.
    pub fn title_search_max_pages(&mut self, pages: usize) -> &mut Self {
        self.title_search_max_pages = pages.max(1);
        self
    }

    /// Append an extra user-agent segment after the default `pdsls-redirect@<version>`.
    pub fn user_agent_extra<S: Into<String>>(&mut self, extra: S) -> &mut Self {
        self.user_agent_extra = Some(extra.into());
        self
    }

    /// Fetch every `did:web` document from `<origin>/.well-known/did.json`
    /// instead of the domain named in the DID.
    ///
    /// Meant for local networks where the DID domains are not reachable over https.
    pub fn did_web_origin(&mut self, origin: Url) -> &mut Self {
        self.did_web_origin = Some(origin);
        self
    }

    /// Build [`RedirectHttpClient`]
    pub fn build(&self) -> Result<RedirectHttpClient, BuildError> {
        let user_agent = match &self.user_agent_extra {
            Some(extra) if !extra.trim().is_empty() => {
                format!("{DEFAULT_USER_AGENT} {}", extra.trim())
            }
            _ => DEFAULT_USER_AGENT.to_string(),
        };

        #[cfg_attr(target_arch = "wasm32", allow(unused_mut, reason = "no timeout on wasm"))]
        let mut http_builder = reqwest::Client::builder().user_agent(user_agent);

        // reqwest has no timeout on wasm; the browser's own limits apply there.
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.http_request_timeout {
            http_builder = http_builder.timeout(timeout);
        }

        Ok(RedirectHttpClient {
            http: http_builder.build()?,
            endpoints: self.endpoints.clone(),
            title_search_max_pages: self.title_search_max_pages,
            did_web_origin: self.did_web_origin.clone(),
        })
    }
}

/// Shared transport for every upstream call of a translation.
///
/// Cheap to clone: the inner reqwest client is reference counted, so the
/// identity resolver, the record store and the translator all hold their own
/// clone of the same connection pool.
#[derive(Clone, Debug)]
pub struct RedirectHttpClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    title_search_max_pages: usize,
    did_web_origin: Option<Url>,
}

impl RedirectHttpClient {
    /// Creates a client for the production hosts.
    pub fn new() -> Result<RedirectHttpClient, BuildError> {
        Self::builder().build()
    }

    /// Returns a builder to edit settings before creating [`RedirectHttpClient`].
    pub fn builder() -> RedirectHttpClientBuilder {
        RedirectHttpClientBuilder::default()
    }

    /// Upstream endpoints this client was built with.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn title_search_max_pages(&self) -> usize {
        self.title_search_max_pages
    }

    pub(crate) fn did_web_origin(&self) -> Option<&Url> {
        self.did_web_origin.as_ref()
    }

    /// Start building a request with the given `method` and `url`.
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.http.request(method, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_endpoints() {
        let endpoints =
            Endpoints::new("http://127.0.0.1:1", "http://127.0.0.1:2", "https://viewer.test")
                .unwrap();
        let client = RedirectHttpClient::builder()
            .endpoints(endpoints.clone())
            .title_search_max_pages(0)
            .build()
            .unwrap();
        assert_eq!(client.endpoints(), &endpoints);
        assert_eq!(client.title_search_max_pages(), 1);
    }
}
