//! Bucket listing: XML documents, key filtering and the paginated walk.
//!
//! ## Flow
//!
//! 1. [`build_query`] turns a prefix and a start marker into the first query.
//! 2. Each page is fetched with the walk's cookie jar and parsed as a
//!    [`ListingBody`]; a `MissingKey` error is reported before the status code.
//! 3. Accepted keys become [`ResourceUrl`](crate::ResourceUrl)s in page order.
//! 4. The `marker=` parameter moves to the last key of the page, and the walk
//!    continues only under [`PaginationPolicy::MultiPage`](crate::PaginationPolicy).

/// Tracing target for listing operations.
pub const TRACING_TARGET: &str = "bucketdl_client::listing";

mod filter;
mod page;
mod paginator;

pub use filter::{KeyFilter, accept};
pub use page::{Entry, ListingBody, ListingError, ListingPage, MISSING_KEY_CODE};
pub(crate) use paginator::Paginator;
pub use paginator::{ListingWalk, build_query, rewrite_marker};
