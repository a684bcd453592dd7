use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use mime::Mime;

/// Picks the text encoding of a response body.
///
/// A `charset` declared in `Content-Type` wins, then a byte-order mark. Without
/// either, valid UTF-8 is taken as UTF-8 and anything else as windows-1252.
pub fn detect_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = content_type.and_then(declared_encoding) {
        return encoding;
    }
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }
    if std::str::from_utf8(body).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

fn declared_encoding(content_type: &str) -> Option<&'static Encoding> {
    let media_type: Mime = content_type.parse().ok()?;
    let charset = media_type.get_param(mime::CHARSET)?;
    let encoding = Encoding::for_label(charset.as_str().trim_matches('"').as_bytes());
    if encoding.is_none() {
        log::warn!("ignoring unknown charset {}", charset.as_str());
    }
    encoding
}

/// Decodes a response body into text. Malformed sequences become U+FFFD.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> String {
    let encoding = detect_encoding(content_type, body);
    let (text, used, had_errors) = encoding.decode(body);
    log::debug!("decoded {} bytes as {}", body.len(), used.name());
    if had_errors {
        log::warn!("response body is not valid {}", used.name());
    }
    text.into_owned()
}
