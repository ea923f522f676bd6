//! Local filenames derived from remote keys.

use crate::error::Result;
use crate::resource::query_unescape;

/// Characters that are stripped from every filename.
pub const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names that cannot be used as filenames on Windows.
pub const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest filename produced, in characters.
pub const MAX_FILENAME_CHARS: usize = 255;

/// Derives a safe local filename from an escaped key.
///
/// The key is unescaped, stripped of [`ILLEGAL_CHARS`], blanked if it names a
/// reserved device and cut to [`MAX_FILENAME_CHARS`] characters. An empty
/// result means the key has no usable local name.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) when the key carries
/// malformed percent-encoding.
pub fn sanitize_filename(raw_key: &str) -> Result<String> {
    let decoded = query_unescape(raw_key)?;

    let mut name: String = decoded
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c))
        .collect();

    if RESERVED_NAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        name.clear();
    }

    if let Some((cut, _)) = name.char_indices().nth(MAX_FILENAME_CHARS) {
        name.truncate(cut);
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::resource::query_escape;

    #[test]
    fn test_strips_illegal_characters() {
        let raw = query_escape(r#"a<b>c:d"e/f\g|h?i*j.txt"#);
        let name = sanitize_filename(&raw).unwrap();

        assert_eq!(name, "abcdefghij.txt");
        assert!(!name.contains(&ILLEGAL_CHARS[..]));
    }

    #[test]
    fn test_nested_key_collapses_into_one_name() {
        assert_eq!(sanitize_filename("photos%2F2023%2Fa.jpg").unwrap(), "photos2023a.jpg");
    }

    #[test]
    fn test_reserved_names_become_empty() {
        for raw in ["CON", "nul", "Com7", "lpt9", "AUX", "c%3Aon", "P%3ARN"] {
            assert_eq!(sanitize_filename(raw).unwrap(), "", "{raw}");
        }
        assert_eq!(sanitize_filename("CON.txt").unwrap(), "CON.txt");
        assert_eq!(sanitize_filename("COM10").unwrap(), "COM10");
    }

    #[test]
    fn test_truncates_to_limit() {
        let long = "é".repeat(300);
        let name = sanitize_filename(&query_escape(&long)).unwrap();
        assert_eq!(name.chars().count(), MAX_FILENAME_CHARS);

        let exact = "x".repeat(MAX_FILENAME_CHARS);
        assert_eq!(sanitize_filename(&exact).unwrap(), exact);
    }

    #[test]
    fn test_legal_names_round_trip() {
        for key in ["report.pdf", "summer trip (2).jpg", "c++ notes.md", "ünïcødé.txt"] {
            assert_eq!(sanitize_filename(&query_escape(key)).unwrap(), key);
        }
    }

    #[test]
    fn test_malformed_escape_is_decode_error() {
        let err = sanitize_filename("broken%2").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
