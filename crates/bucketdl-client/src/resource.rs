//! Download URLs derived from listed keys.

use std::fmt;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::error::{Error, Result};

/// A fully-qualified download URL built from a listing base URL and an escaped key.
///
/// The position of a resource in the sequence returned by a listing walk is the
/// order in which the download pipeline visits it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl(String);

impl ResourceUrl {
    /// Builds the download URL for `key` under `base_url`.
    ///
    /// The key is form-escaped, so `/` inside the key becomes `%2F` and the
    /// whole key forms the final path segment.
    pub fn from_key(base_url: &str, key: &str) -> Self {
        Self(format!("{base_url}{}", query_escape(key)))
    }

    /// Wraps an already-built URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the escaped final path segment of the URL.
    ///
    /// Trailing slashes are ignored; a URL made only of slashes yields `/`.
    pub fn escaped_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/";
        }
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Consumes the resource and returns the URL string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ResourceUrl> for String {
    fn from(resource: ResourceUrl) -> Self {
        resource.0
    }
}

/// Escapes a value for use inside a query string or path segment.
///
/// Spaces become `+` and every reserved character is percent-encoded.
pub fn query_escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Reverses [`query_escape`], rejecting malformed percent-encoding.
///
/// # Errors
///
/// Returns [`Error::Decode`] when a `%` is not followed by two hex digits or
/// when the decoded bytes are not valid UTF-8.
pub fn query_unescape(value: &str) -> Result<String> {
    let bytes = value.as_bytes();
    for (index, _) in value.match_indices('%') {
        let well_formed = matches!(
            (bytes.get(index + 1), bytes.get(index + 2)),
            (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
        );
        if !well_formed {
            let end = (index + 3).min(value.len());
            return Err(Error::Decode {
                key: value.to_owned(),
                reason: format!(
                    "invalid escape {:?}",
                    String::from_utf8_lossy(&bytes[index..end])
                ),
            });
        }
    }

    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|err| Error::Decode {
            key: value.to_owned(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_escapes_slashes_and_spaces() {
        let resource = ResourceUrl::from_key("https://cdn.example.com/bucket/", "photos/summer trip.jpg");
        assert_eq!(
            resource.as_str(),
            "https://cdn.example.com/bucket/photos%2Fsummer+trip.jpg"
        );
        assert_eq!(resource.escaped_name(), "photos%2Fsummer+trip.jpg");
    }

    #[test]
    fn test_escaped_name_ignores_trailing_slash() {
        let resource = ResourceUrl::new("https://cdn.example.com/bucket/folder/");
        assert_eq!(resource.escaped_name(), "folder");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let key = "a+b c/d%e?.txt";
        assert_eq!(query_unescape(&query_escape(key)).unwrap(), key);
    }

    #[test]
    fn test_unescape_plus_is_space() {
        assert_eq!(query_unescape("summer+trip.jpg").unwrap(), "summer trip.jpg");
        assert_eq!(query_unescape("c%2B%2B.txt").unwrap(), "c++.txt");
    }

    #[test]
    fn test_unescape_rejects_malformed_escapes() {
        for raw in ["100%", "bad%zzname", "trailing%4"] {
            let err = query_unescape(raw).unwrap_err();
            assert!(matches!(err, Error::Decode { .. }), "{raw} should fail");
        }
    }

    #[test]
    fn test_unescape_rejects_invalid_utf8() {
        assert!(query_unescape("%ff%fe").is_err());
    }
}
