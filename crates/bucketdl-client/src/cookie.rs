//! Cookie acquisition from an auxiliary site.
//!
//! The listing and download endpoints authorize requests through cookies that
//! are handed out by a separate URL. Every top-level operation fetches them
//! anew and replays them through its own [`Jar`], so no authentication state is
//! shared between operations.

use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::error::{Error, Result};

/// Tracing target for cookie acquisition.
pub const TRACING_TARGET: &str = "bucketdl_client::cookie";

/// Cookies returned by a cookie-source response, kept as raw `Set-Cookie` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    set_cookie: Vec<String>,
}

impl SessionCookies {
    /// Collects every `Set-Cookie` header from a response.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let set_cookie = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect();

        Self { set_cookie }
    }

    /// Creates a cookie set from raw `Set-Cookie` values.
    pub fn from_set_cookie<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            set_cookie: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of cookies.
    #[inline]
    pub fn len(&self) -> usize {
        self.set_cookie.len()
    }

    /// Returns whether no cookies were handed out.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set_cookie.is_empty()
    }

    /// Builds a fresh jar holding these cookies as if `url` had set them.
    pub fn jar_for(&self, url: &Url) -> Jar {
        let jar = Jar::default();
        for cookie in &self.set_cookie {
            jar.add_cookie_str(cookie, url);
        }
        jar
    }
}

/// Attaches the jar's cookies for `url` to a request.
pub(crate) fn authorize(request: RequestBuilder, jar: &Jar, url: &Url) -> RequestBuilder {
    match jar.cookies(url) {
        Some(value) => request.header(COOKIE, value),
        None => request,
    }
}

/// Performs unauthenticated GETs against a cookie-source URL.
#[derive(Debug, Clone)]
pub struct CookieAcquirer {
    http: Client,
    timeout: Duration,
}

impl CookieAcquirer {
    /// Creates an acquirer on top of an existing HTTP client.
    pub fn new(http: Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Fetches the cookies set by `cookie_url`.
    ///
    /// An empty URL yields an empty set without any request. A non-2xx answer
    /// is not an error: whatever cookies it carries are returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CookieFetch`] when the request cannot be completed.
    pub async fn acquire(&self, cookie_url: &str) -> Result<SessionCookies> {
        if cookie_url.is_empty() {
            tracing::trace!(
                target: TRACING_TARGET,
                "No cookie url configured, continuing without cookies"
            );
            return Ok(SessionCookies::default());
        }

        let response = self
            .http
            .get(cookie_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| Error::CookieFetch {
                url: cookie_url.to_owned(),
                source,
            })?;

        let status = response.status();
        let cookies = SessionCookies::from_headers(response.headers());

        if status.is_success() {
            tracing::debug!(
                target: TRACING_TARGET,
                url = %cookie_url,
                status = status.as_u16(),
                count = cookies.len(),
                "Acquired cookies"
            );
        } else {
            tracing::warn!(
                target: TRACING_TARGET,
                url = %cookie_url,
                status = status.as_u16(),
                count = cookies.len(),
                "Cookie source answered with an error status"
            );
        }

        Ok(cookies)
    }
}

/// Returns the `Cookie` header a jar would send to `url`, for diagnostics and tests.
pub fn cookie_header(jar: &Jar, url: &Url) -> Option<HeaderValue> {
    jar.cookies(url)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn acquirer() -> CookieAcquirer {
        CookieAcquirer::new(Client::new(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_empty_url_makes_no_request() {
        let cookies = acquirer().acquire("").await.unwrap();
        assert!(cookies.is_empty());
    }

    #[tokio::test]
    async fn test_collects_every_set_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("Set-Cookie", "session=abc; Path=/")
                    .append_header("Set-Cookie", "policy=xyz; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cookies = acquirer()
            .acquire(&format!("{}/login", server.uri()))
            .await
            .unwrap();
        assert_eq!(cookies.len(), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).append_header("Set-Cookie", "session=abc; Path=/"),
            )
            .mount(&server)
            .await;

        let cookies = acquirer().acquire(&server.uri()).await.unwrap();
        assert_eq!(cookies.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_source_is_cookie_fetch_error() {
        let err = acquirer()
            .acquire("http://127.0.0.1:9/unreachable")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CookieFetch { .. }));
    }

    #[test]
    fn test_jar_replays_cookies_for_url() {
        let cookies = SessionCookies::from_set_cookie(["session=abc; Path=/", "policy=xyz; Path=/"]);
        let url = Url::parse("http://bucket.example.com/listing/").unwrap();
        let jar = cookies.jar_for(&url);

        let header = cookie_header(&jar, &url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("session=abc"));
        assert!(header.contains("policy=xyz"));
    }
}
