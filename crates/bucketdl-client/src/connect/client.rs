//! Reqwest-based client for listing buckets and downloading their objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;

use super::ClientConfig;
use crate::cookie::CookieAcquirer;
use crate::download::{self, DownloadPipeline, Downloaded, PipelineHandle};
use crate::error::{Error, Result};
use crate::listing::{KeyFilter, ListingWalk, Paginator};
use crate::resource::ResourceUrl;

/// Tracing target for bucket client operations.
pub const TRACING_TARGET: &str = "bucketdl_client::client";

/// Inner client that holds the HTTP client and configuration.
struct BucketClientInner {
    http: Client,
    cookies: CookieAcquirer,
    config: ClientConfig,
}

/// Client for one bucket-listing endpoint and the objects it lists.
///
/// Cloning is cheap; clones share the underlying connection pool. Cookies are
/// never shared: each listing walk and each download acquires its own.
///
/// # Examples
///
/// ```rust,ignore
/// use bucketdl_client::{BucketClient, ClientConfig, build_query};
///
/// let client = BucketClient::new(ClientConfig::default())?;
/// let query = build_query("photos/", "");
/// let resources = client
///     .search_bucket("https://cdn.example.com/", &query, "https://example.com/", r"\.tmp$")
///     .await?;
///
/// let mut pipeline = client.download_all(resources, "https://example.com/", "resources/photos");
/// while let Some(event) = pipeline.next_event().await {
///     println!("{}", event.index());
/// }
/// ```
#[derive(Clone)]
pub struct BucketClient {
    inner: Arc<BucketClientInner>,
}

impl std::fmt::Debug for BucketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl BucketClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let user_agent = config.effective_user_agent();
        tracing::debug!(
            target: TRACING_TARGET,
            request_timeout_ms = config.request_timeout().as_millis(),
            cookie_timeout_ms = config.cookie_timeout().as_millis(),
            pagination = %config.pagination,
            "Creating bucket client"
        );

        let http = Client::builder()
            .user_agent(&user_agent)
            .build()
            .map_err(|err| Error::Config(format!("failed to create HTTP client: {err}")))?;

        let cookies = CookieAcquirer::new(http.clone(), config.cookie_timeout());
        let inner = BucketClientInner {
            http,
            cookies,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Walks the listing at `base_url + query`, keeping partial results on failure.
    ///
    /// Cookies from `cookie_url` are fetched once and replayed on every page.
    /// Keys matching `ignore_pattern` are left out.
    pub async fn walk_listing(
        &self,
        base_url: &str,
        query: &str,
        cookie_url: &str,
        ignore_pattern: &str,
    ) -> ListingWalk {
        tracing::info!(
            target: TRACING_TARGET,
            url = %format!("{base_url}{query}"),
            ignore = ignore_pattern,
            "Searching bucket"
        );

        let cookies = match self.inner.cookies.acquire(cookie_url).await {
            Ok(cookies) => cookies,
            Err(err) => return ListingWalk::failed(err),
        };

        let filter = KeyFilter::new(ignore_pattern);
        Paginator::new(&self.inner.http, &self.inner.config)
            .walk(base_url, query, &cookies, &filter)
            .await
    }

    /// Lists the bucket and returns the download URLs of every accepted key.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the walk; see [`Error::aborts_listing`].
    pub async fn search_bucket(
        &self,
        base_url: &str,
        query: &str,
        cookie_url: &str,
        ignore_pattern: &str,
    ) -> Result<Vec<ResourceUrl>> {
        self.walk_listing(base_url, query, cookie_url, ignore_pattern)
            .await
            .into_result()
    }

    /// Downloads one resource into `dest_dir`.
    ///
    /// An existing file with the sanitized name is left untouched and reported
    /// as [`Downloaded::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns an item-scoped error: [`Error::Download`], [`Error::Decode`] or
    /// [`Error::InvalidUrl`].
    pub async fn download_resource(
        &self,
        resource: &ResourceUrl,
        cookie_url: &str,
        dest_dir: &Path,
    ) -> Result<Downloaded> {
        download::fetch_resource(
            &self.inner.http,
            &self.inner.config,
            &self.inner.cookies,
            resource,
            cookie_url,
            dest_dir,
        )
        .await
    }

    /// Spawns a [`DownloadPipeline`] over `resources` and returns its consumer handle.
    pub fn download_all(
        &self,
        resources: Vec<ResourceUrl>,
        cookie_url: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
    ) -> PipelineHandle {
        DownloadPipeline::new(self.clone(), resources, cookie_url, dest_dir).spawn()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::listing::build_query;

    const LISTING: &str = "<ListBucketResult><Name>media</Name><IsTruncated>false</IsTruncated>\
        <Contents><Key>a.jpg</Key></Contents><Contents><Key>b.tmp</Key></Contents></ListBucketResult>";

    #[test]
    fn test_client_creation() {
        let client = BucketClient::new(ClientConfig::default()).unwrap();
        assert!(client.config().user_agent.is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = BucketClient::new(ClientConfig::default().with_max_pages(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_search_then_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cookies"))
            .respond_with(ResponseTemplate::new(200).append_header("Set-Cookie", "auth=1; Path=/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bucket/"))
            .and(header("cookie", "auth=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bucket/a.jpg"))
            .and(header("cookie", "auth=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("image"))
            .expect(1)
            .mount(&server)
            .await;

        let client = BucketClient::new(ClientConfig::default()).unwrap();
        let base_url = format!("{}/bucket/", server.uri());
        let cookie_url = format!("{}/cookies", server.uri());

        let resources = client
            .search_bucket(&base_url, &build_query("", ""), &cookie_url, r"\.tmp$")
            .await
            .unwrap();
        assert_eq!(resources, [ResourceUrl::new(format!("{base_url}a.jpg"))]);

        let dir = tempfile::tempdir().unwrap();
        let downloaded = client
            .download_resource(&resources[0], &cookie_url, dir.path())
            .await
            .unwrap();
        assert_eq!(downloaded.path(), dir.path().join("a.jpg"));
    }

    #[tokio::test]
    async fn test_cookie_failure_aborts_search() {
        let client = BucketClient::new(ClientConfig::default()).unwrap();
        let walk = client
            .walk_listing("http://127.0.0.1:9/bucket/", "?prefix=&marker=", "http://127.0.0.1:9/c", "")
            .await;

        assert_eq!(walk.pages, 0);
        assert!(matches!(walk.error, Some(Error::CookieFetch { .. })));
    }
}
