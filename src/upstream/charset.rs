//! Character set recovery for text bodies.
//!
//! Upstream pages frequently declare no charset, or the wrong one. Text bodies
//! are decoded by trying each configured fallback in order, strictly (no
//! replacement characters), and only then the charset the response declared.
//! When every attempt fails the body is decoded as UTF-8 with undecodable
//! sequences replaced.

use encoding_rs::{Encoding, UTF_8};

/// Ordered list of charsets used to decode text bodies.
#[derive(Debug, Clone)]
pub struct CharsetFallbacks {
    encodings: Vec<&'static Encoding>,
}

/// Outcome of decoding a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    /// Canonical name of the charset that decoded the body cleanly, or
    /// `None` when the lossy UTF-8 fallback was used.
    pub charset: Option<&'static str>,
}

impl CharsetFallbacks {
    /// Build from charset labels. Unknown labels are skipped with a warning;
    /// validation rejects them before a server is built.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut encodings: Vec<&'static Encoding> = Vec::with_capacity(labels.len());
        for label in labels {
            match Encoding::for_label(label.as_ref().trim().as_bytes()) {
                Some(encoding) => encodings.push(encoding),
                None => tracing::warn!(label = %label.as_ref(), "Unknown charset label ignored"),
            }
        }
        Self { encodings }
    }

    /// Decode `body` with the fallback list, then `declared` when it is not
    /// already in the list.
    ///
    /// Single-byte charsets never fail a strict decode, so a declared label
    /// must not preempt the list: a UTF-8 page labelled iso-8859-1 would
    /// otherwise come out as mojibake.
    pub fn decode(&self, body: &[u8], declared: Option<&str>) -> DecodedText {
        let declared = declared
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .filter(|encoding| !self.encodings.contains(encoding));

        for encoding in self.encodings.iter().copied().chain(declared) {
            if let Some(text) = decode_strict(encoding, body) {
                return DecodedText {
                    text,
                    charset: Some(encoding.name()),
                };
            }
        }

        let (text, _, _) = UTF_8.decode(body);
        DecodedText {
            text: text.into_owned(),
            charset: None,
        }
    }
}

impl Default for CharsetFallbacks {
    fn default() -> Self {
        Self::from_labels(&["utf-8", "gbk", "gb2312", "big5"])
    }
}

fn decode_strict(encoding: &'static Encoding, body: &[u8]) -> Option<String> {
    // Honour a byte order mark when it agrees with the attempted charset.
    let (body, encoding) = match Encoding::for_bom(body) {
        Some((bom_encoding, len)) if bom_encoding == encoding => (&body[len..], encoding),
        _ => (body, encoding),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

/// True for content types whose bodies are decoded as text.
pub fn is_text_content_type(content_type: &str) -> bool {
    let mime = mime_essence(content_type);
    mime.starts_with("text/")
        || mime == "application/json"
        || mime == "application/xml"
        || mime == "application/xhtml+xml"
        || mime == "application/javascript"
        || mime.ends_with("+json")
        || mime.ends_with("+xml")
}

/// True when the content type denotes an HTML document.
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

/// The `charset` parameter of a content type, if any.
pub fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\''))
        } else {
            None
        }
    })
}

/// The same content type with its charset parameter set to `utf-8`.
pub fn with_utf8_charset(content_type: &str) -> String {
    let mut parts: Vec<String> = vec![mime_essence(content_type)];
    for param in content_type.split(';').skip(1) {
        let trimmed = param.trim();
        if trimmed.is_empty() {
            continue;
        }
        let is_charset = trimmed
            .split_once('=')
            .map(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .unwrap_or(false);
        if !is_charset {
            parts.push(trimmed.to_string());
        }
    }
    parts.push("charset=utf-8".to_string());
    parts.join("; ")
}

fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
