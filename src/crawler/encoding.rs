//! Charset detection and transcoding to UTF-8
//!
//! Detection order:
//! 1. A `charset` parameter in the Content-Type header naming a known encoding
//! 2. A `<meta charset>` or `<meta http-equiv="Content-Type">` declaration in the
//!    first 1024 bytes
//! 3. Valid UTF-8
//! 4. Windows-1252 when C1 bytes (0x80-0x9F) are present, ISO-8859-1 otherwise
//!
//! Anything else falls through as lossy UTF-8.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::Regex;

/// How far into the body a `<meta>` charset declaration is looked for
const META_SCAN_LIMIT: usize = 1024;

/// Matches both `<meta charset="x">` and the `content="...; charset=x"` form
static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// Encodings the detector can choose between when no header hint applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedCharset {
    Utf8,
    Iso8859_1,
    Windows1252,
}

/// Extracts the charset label from a Content-Type header value
///
/// ```
/// use pagesift::crawler::charset_from_content_type;
///
/// assert_eq!(
///     charset_from_content_type("text/html; charset=\"ISO-8859-1\""),
///     Some("ISO-8859-1".to_string())
/// );
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Extracts the charset label declared by a `<meta>` tag near the top of a body
pub fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SCAN_LIMIT)];
    let head = String::from_utf8_lossy(head);
    META_CHARSET
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|label| label.as_str().to_string())
}

/// Detects the charset of a body among UTF-8, ISO-8859-1 and Windows-1252
pub fn detect_charset(bytes: &[u8]) -> DetectedCharset {
    if std::str::from_utf8(bytes).is_ok() {
        DetectedCharset::Utf8
    } else if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        DetectedCharset::Windows1252
    } else {
        DetectedCharset::Iso8859_1
    }
}

/// Transcodes a response body to UTF-8
///
/// # Arguments
///
/// * `bytes` - The raw body
/// * `content_type` - The Content-Type header value, if any
pub fn normalize_to_utf8(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            charset_from_meta(bytes).and_then(|label| Encoding::for_label(label.as_bytes()))
        });

    if let Some(encoding) = declared {
        // A declared charset wins unless the body is plainly UTF-8 already
        if encoding != UTF_8 && std::str::from_utf8(bytes).is_err() {
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                tracing::debug!("Lossy decode using declared charset {}", encoding.name());
            }
            return text.into_owned();
        }
    }

    match detect_charset(bytes) {
        DetectedCharset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        DetectedCharset::Windows1252 => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
        DetectedCharset::Iso8859_1 => decode_latin1(bytes),
    }
}

/// Decodes ISO-8859-1, where every byte maps to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
