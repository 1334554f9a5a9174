//! Content type detection from a file's leading bytes.

/// Fallback for text content.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Fallback for anything that does not look like text.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Tags that mark a document as HTML when they open it.
const HTML_MARKERS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Sniff a MIME type from `header`.
///
/// Markup markers win over magic numbers so HTML and XML always carry a
/// charset. Everything else falls through to `infer`, then to a text or
/// binary guess.
///
/// `header` must be exactly the bytes that were read; trailing padding would
/// make text look binary.
pub fn detect_content_type(header: &[u8]) -> String {
    if header.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be".to_string();
    }
    if header.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le".to_string();
    }
    if header.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return TEXT_PLAIN.to_string();
    }

    let trimmed = trim_leading_whitespace(header);
    if HTML_MARKERS.iter().any(|marker| opens_with_tag(trimmed, marker)) {
        return "text/html; charset=utf-8".to_string();
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8".to_string();
    }

    if let Some(kind) = infer::get(header) {
        return kind.mime_type().to_string();
    }

    if header.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM.to_string()
    } else {
        TEXT_PLAIN.to_string()
    }
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

/// Case-insensitive match of `marker` followed by a space or `>`.
fn opens_with_tag(data: &[u8], marker: &[u8]) -> bool {
    if data.len() < marker.len() + 1 {
        return false;
    }
    let matches = data
        .iter()
        .zip(marker)
        .all(|(d, m)| d.to_ascii_uppercase() == *m);
    matches && matches!(data[marker.len()], b' ' | b'>')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
