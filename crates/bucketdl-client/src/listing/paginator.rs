//! Walking a paginated listing to completion.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use reqwest::Client;
use reqwest::cookie::Jar;
use url::Url;

use super::filter::KeyFilter;
use super::page::{ListingBody, ListingPage};
use super::TRACING_TARGET;
use crate::connect::{ClientConfig, PaginationPolicy};
use crate::cookie::{self, SessionCookies};
use crate::error::{Error, Result};
use crate::resource::{ResourceUrl, query_escape};

static MARKER_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[?&])marker=[^&]*").expect("marker pattern is valid"));

/// Builds the initial listing query from a prefix and a start marker.
pub fn build_query(prefix: &str, marker: &str) -> String {
    format!("?prefix={}&marker={}", query_escape(prefix), query_escape(marker))
}

/// Points the `marker=` parameter of `query` at `key`.
///
/// The parameter name is matched case-insensitively and its previous value,
/// empty or not, is replaced. A query without the parameter gets one appended.
pub fn rewrite_marker(query: &str, key: &str) -> String {
    let escaped = query_escape(key);
    if MARKER_PARAM.is_match(query) {
        return MARKER_PARAM
            .replace_all(query, |caps: &Captures<'_>| format!("{}marker={escaped}", &caps[1]))
            .into_owned();
    }

    if query.is_empty() {
        format!("?marker={escaped}")
    } else {
        format!("{query}&marker={escaped}")
    }
}

/// Result of one listing walk.
///
/// Resources accumulated before a failure are kept alongside the error.
#[derive(Debug, Default)]
pub struct ListingWalk {
    /// Accepted resources in listing order.
    pub resources: Vec<ResourceUrl>,
    /// Number of pages read successfully.
    pub pages: usize,
    /// Number of entries dropped by the ignore pattern.
    pub ignored: usize,
    /// The error that ended the walk, if any.
    pub error: Option<Error>,
}

impl ListingWalk {
    /// Creates a walk that failed before reading any page.
    pub(crate) fn failed(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Returns whether the walk ran to completion.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Converts the walk into a plain result, discarding partial resources on error.
    pub fn into_result(self) -> Result<Vec<ResourceUrl>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.resources),
        }
    }
}

/// Issues successive listing requests and collects accepted keys.
pub(crate) struct Paginator<'a> {
    http: &'a Client,
    config: &'a ClientConfig,
}

impl<'a> Paginator<'a> {
    pub(crate) fn new(http: &'a Client, config: &'a ClientConfig) -> Self {
        Self { http, config }
    }

    /// Walks the listing starting at `base_url + query`.
    pub(crate) async fn walk(
        &self,
        base_url: &str,
        query: &str,
        cookies: &SessionCookies,
        filter: &KeyFilter,
    ) -> ListingWalk {
        let mut walk = ListingWalk::default();
        let mut query = query.to_owned();
        let mut cookie_jar: Option<Jar> = None;
        let mut previous_cursor: Option<String> = None;

        loop {
            if walk.pages >= self.config.max_pages {
                tracing::warn!(
                    target: TRACING_TARGET,
                    pages = walk.pages,
                    max_pages = self.config.max_pages,
                    "Page limit reached, stopping listing walk"
                );
                break;
            }

            let target = match parse_target(base_url, &query) {
                Ok(target) => target,
                Err(err) => {
                    walk.error = Some(err);
                    break;
                }
            };
            let jar = cookie_jar.get_or_insert_with(|| cookies.jar_for(&target));

            let page = match self.fetch_page(&target, jar).await {
                Ok(page) => page,
                Err(err) => {
                    walk.error = Some(err);
                    break;
                }
            };
            walk.pages += 1;

            let Some(last_key) = page.last_key().map(str::to_owned) else {
                walk.error = Some(Error::EmptyResult {
                    url: target.to_string(),
                });
                break;
            };

            // A repeated cursor means this page was already collected.
            if previous_cursor.as_deref() == Some(last_key.as_str()) {
                walk.error = Some(Error::StalledCursor { key: last_key });
                break;
            }

            let before = walk.resources.len();
            for entry in &page.entries {
                if filter.accept(&entry.key) {
                    walk.resources.push(ResourceUrl::from_key(base_url, &entry.key));
                } else {
                    tracing::trace!(target: TRACING_TARGET, key = %entry.key, "Ignoring key");
                    walk.ignored += 1;
                }
            }

            tracing::debug!(
                target: TRACING_TARGET,
                page = walk.pages,
                entries = page.entries.len(),
                accepted = walk.resources.len() - before,
                truncated = page.is_truncated(),
                "Read listing page"
            );

            query = rewrite_marker(&query, &last_key);

            let more = match self.config.pagination {
                PaginationPolicy::SinglePage => false,
                PaginationPolicy::MultiPage => page.is_truncated(),
            };
            if !more {
                break;
            }
            previous_cursor = Some(last_key);
        }

        tracing::info!(
            target: TRACING_TARGET,
            pages = walk.pages,
            resources = walk.resources.len(),
            ignored = walk.ignored,
            complete = walk.is_complete(),
            "Listing walk finished"
        );

        walk
    }

    /// Fetches and parses a single page.
    async fn fetch_page(&self, target: &Url, jar: &Jar) -> Result<ListingPage> {
        let request = self
            .http
            .get(target.clone())
            .timeout(self.config.request_timeout());
        let request = cookie::authorize(request, jar, target);

        let url = target.to_string();
        let response = request.send().await.map_err(|source| Error::Http {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Http {
            url: url.clone(),
            source,
        })?;

        let parsed = ListingBody::parse(&body);

        // A missing-key error wins over the status code.
        if let Some(error) = parsed.as_ref().ok().and_then(ListingBody::missing_key) {
            return Err(Error::Auth {
                url,
                code: error.code.clone(),
                message: error.message.clone(),
            });
        }

        if status.as_u16() >= 400 {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        match parsed {
            Ok(ListingBody::Page(page)) => Ok(page),
            Ok(ListingBody::Error(error)) => Err(Error::Parse {
                url,
                reason: format!(
                    "expected a listing page, got error {}: {}",
                    error.code, error.message
                ),
            }),
            Err(reason) => Err(Error::Parse { url, reason }),
        }
    }
}

fn parse_target(base_url: &str, query: &str) -> Result<Url> {
    let raw = format!("{base_url}{query}");
    Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })
}
