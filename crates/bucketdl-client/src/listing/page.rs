//! `ListBucketResult` and `Error` documents.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

/// Error code the listing endpoint uses when no authorization was presented.
pub const MISSING_KEY_CODE: &str = "MissingKey";

/// Root element name of a listing page.
const LISTING_ROOT: &[u8] = b"ListBucketResult";

/// Root element name of an endpoint error.
const ERROR_ROOT: &[u8] = b"Error";

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingPage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub marker: String,
    #[serde(default)]
    pub max_keys: String,
    #[serde(default)]
    pub is_truncated: String,
    #[serde(rename = "Contents", default)]
    pub entries: Vec<Entry>,
}

impl ListingPage {
    /// Returns whether the endpoint announced further pages.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated.trim().eq_ignore_ascii_case("true")
    }

    /// Returns the key of the last entry, the cursor for the next page.
    pub fn last_key(&self) -> Option<&str> {
        self.entries.last().map(|entry| entry.key.as_str())
    }
}

/// One listed object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(rename = "ETag", default)]
    pub etag: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub storage_class: String,
}

/// Error document returned instead of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ListingError {
    /// Returns whether the endpoint saw no authorization cookie.
    pub fn is_missing_key(&self) -> bool {
        self.code == MISSING_KEY_CODE
    }
}

/// The two mutually exclusive readings of a listing response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingBody {
    Page(ListingPage),
    Error(ListingError),
}

impl ListingBody {
    /// Parses a response body, choosing the reading from its root element.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the body is not well-formed
    /// XML or its root is neither `ListBucketResult` nor `Error`.
    pub fn parse(body: &str) -> Result<Self, String> {
        let root = root_element(body)?;
        match root.as_deref() {
            Some(LISTING_ROOT) => quick_xml::de::from_str(body)
                .map(Self::Page)
                .map_err(|err| err.to_string()),
            Some(ERROR_ROOT) => quick_xml::de::from_str(body)
                .map(Self::Error)
                .map_err(|err| err.to_string()),
            Some(other) => Err(format!(
                "unexpected root element <{}>",
                String::from_utf8_lossy(other)
            )),
            None => Err("document has no root element".to_owned()),
        }
    }

    /// Returns the error reading if the body carries a `MissingKey` code.
    pub fn missing_key(&self) -> Option<&ListingError> {
        match self {
            Self::Error(error) if error.is_missing_key() => Some(error),
            _ => None,
        }
    }
}

/// Returns the local name of the first element in `body`.
fn root_element(body: &str) -> Result<Option<Vec<u8>>, String> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) | Ok(Event::Empty(start)) => {
                return Ok(Some(start.local_name().as_ref().to_vec()));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(err) => {
                return Err(format!(
                    "malformed xml at position {}: {err}",
                    reader.error_position()
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>media</Name>
  <Prefix>photos/</Prefix>
  <Marker></Marker>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>photos/a.jpg</Key>
    <LastModified>2023-04-01T10:00:00.000Z</LastModified>
    <ETag>"5d41402abc4b2a76b9719d911017c592"</ETag>
    <Size>1024</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>photos/b.jpg</Key>
    <LastModified>2023-04-02T10:00:00.000Z</LastModified>
    <ETag>"7d793037a0760186574b0282f2f435e7"</ETag>
    <Size>2048</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
</ListBucketResult>"#;

    #[test]
    fn test_parse_page() {
        let ListingBody::Page(page) = ListingBody::parse(PAGE).unwrap() else {
            panic!("expected a listing page");
        };

        assert_eq!(page.name, "media");
        assert_eq!(page.prefix, "photos/");
        assert_eq!(page.max_keys, "1000");
        assert!(page.is_truncated());
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].size, "1024");
        assert_eq!(page.entries[0].etag, "\"5d41402abc4b2a76b9719d911017c592\"");
        assert_eq!(page.entries[1].storage_class, "STANDARD");
        assert_eq!(page.last_key(), Some("photos/b.jpg"));
    }

    #[test]
    fn test_parse_page_without_contents() {
        let body = "<ListBucketResult><Name>media</Name><IsTruncated>false</IsTruncated></ListBucketResult>";
        let ListingBody::Page(page) = ListingBody::parse(body).unwrap() else {
            panic!("expected a listing page");
        };

        assert!(page.entries.is_empty());
        assert!(!page.is_truncated());
        assert_eq!(page.last_key(), None);
    }

    #[test]
    fn test_parse_missing_key_error() {
        let body = "<Error><Code>MissingKey</Code><Message>Missing Key-Pair-Id query parameter or cookie value</Message></Error>";
        let parsed = ListingBody::parse(body).unwrap();

        let error = parsed.missing_key().unwrap();
        assert!(error.message.starts_with("Missing Key-Pair-Id"));
    }

    #[test]
    fn test_other_error_codes_are_not_missing_key() {
        let body = "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>";
        let parsed = ListingBody::parse(body).unwrap();

        assert!(parsed.missing_key().is_none());
        assert!(matches!(parsed, ListingBody::Error(ref e) if e.code == "AccessDenied"));
    }

    #[test]
    fn test_rejects_unexpected_root() {
        let err = ListingBody::parse("<html><body>login</body></html>").unwrap_err();
        assert!(err.contains("html"));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(ListingBody::parse("<ListBucketResult><Name>media</ListBucketResult>").is_err());
        assert!(ListingBody::parse("").is_err());
    }
}
