//! Navigation interception script injection.

use std::sync::LazyLock;

use regex::{Match, Regex};

use crate::rewrite::html::OPAQUE_REGIONS;

/// Script block inserted into every proxied HTML document.
pub const INTERCEPT_SCRIPT: &str = include_str!("intercept.js");

/// Attribute identifying the injected block; documents carrying it already
/// are left alone.
pub const INTERCEPT_MARKER: &str = r#"data-frame-proxy="intercept""#;

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("head pattern is valid"));

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").expect("body pattern is valid"));

static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("html pattern is valid"));

/// Where the script goes, as a byte offset into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    BeforeHeadClose(usize),
    BeforeBodyOpen(usize),
    AfterHtmlOpen(usize),
    DocumentStart,
}

impl InjectionPoint {
    pub fn offset(self) -> usize {
        match self {
            InjectionPoint::BeforeHeadClose(at)
            | InjectionPoint::BeforeBodyOpen(at)
            | InjectionPoint::AfterHtmlOpen(at) => at,
            InjectionPoint::DocumentStart => 0,
        }
    }
}

/// Pick the insertion point: `</head>`, then `<body>`, then just after
/// `<html>`, then the start of the document.
///
/// Tags inside comments and `<script>` elements do not count.
pub fn injection_point(document: &str) -> InjectionPoint {
    let opaque: Vec<(usize, usize)> = OPAQUE_REGIONS
        .find_iter(document)
        .map(|m| (m.start(), m.end()))
        .collect();

    if let Some(m) = find_markup(&HEAD_CLOSE, document, &opaque) {
        InjectionPoint::BeforeHeadClose(m.start())
    } else if let Some(m) = find_markup(&BODY_OPEN, document, &opaque) {
        InjectionPoint::BeforeBodyOpen(m.start())
    } else if let Some(m) = find_markup(&HTML_OPEN, document, &opaque) {
        InjectionPoint::AfterHtmlOpen(m.end())
    } else {
        InjectionPoint::DocumentStart
    }
}

/// First match of `pattern` that starts outside every opaque region.
fn find_markup<'d>(pattern: &Regex, document: &'d str, opaque: &[(usize, usize)]) -> Option<Match<'d>> {
    pattern.find_iter(document).find(|m| {
        !opaque
            .iter()
            .any(|&(start, end)| m.start() >= start && m.start() < end)
    })
}

/// Insert `script` exactly once.
pub fn inject_script(document: &str, script: &str) -> String {
    if document.contains(INTERCEPT_MARKER) {
        return document.to_string();
    }

    let at = injection_point(document).offset();
    let mut out = String::with_capacity(document.len() + script.len() + 1);
    out.push_str(&document[..at]);
    out.push_str(script);
    if at == 0 {
        out.push('\n');
    }
    out.push_str(&document[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: &str = "<script data-frame-proxy=\"intercept\"></script>";

    fn count(haystack: &str) -> usize {
        haystack.matches(INTERCEPT_MARKER).count()
    }

    #[test]
    fn test_head_close_preferred() {
        let doc = "<html><head><title>t</title></head><body><p>x</p></body></html>";
        let out = inject_script(doc, S);
        assert_eq!(count(&out), 1);
        assert!(out.contains(&format!("<title>t</title>{S}</head>")));
    }

    #[test]
    fn test_body_when_no_head() {
        let doc = "<html><body class=\"main\"><p>x</p></body></html>";
        let out = inject_script(doc, S);
        assert_eq!(out, format!("<html>{S}<body class=\"main\"><p>x</p></body></html>"));
    }

    #[test]
    fn test_after_html_open_when_no_head_or_body() {
        let doc = "<HTML lang=\"en\"><p>x</p></HTML>";
        let out = inject_script(doc, S);
        assert_eq!(out, format!("<HTML lang=\"en\">{S}<p>x</p></HTML>"));
    }

    #[test]
    fn test_document_start_fallback() {
        let out = inject_script("<p>fragment</p>", S);
        assert_eq!(out, format!("{S}\n<p>fragment</p>"));
    }

    #[test]
    fn test_only_first_head_close_used() {
        let doc = "<head></head><iframe srcdoc=\"<head></head>\"></iframe><body></body>";
        let out = inject_script(doc, S);
        assert_eq!(count(&out), 1);
        assert!(out.starts_with(&format!("<head>{S}</head>")));
    }

    #[test]
    fn test_head_close_inside_comment_ignored() {
        let doc = "<html><head><!-- legacy </head> --><title>t</title></head><body></body></html>";
        let out = inject_script(doc, S);
        assert_eq!(count(&out), 1);
        assert!(out.contains("<!-- legacy </head> -->"));
        assert!(out.contains(&format!("<title>t</title>{S}</head>")));
    }

    #[test]
    fn test_tags_inside_script_ignored() {
        let doc = "<script>var s = '</head><body>';</script><body><p>x</p></body>";
        let out = inject_script(doc, S);
        assert!(out.contains("var s = '</head><body>';"));
        assert!(out.ends_with(&format!("</script>{S}<body><p>x</p></body>")));
    }

    #[test]
    fn test_already_injected_document_untouched() {
        let once = inject_script("<head></head>", S);
        assert_eq!(inject_script(&once, S), once);
    }

    #[test]
    fn test_bodyguard_is_not_body() {
        assert_eq!(
            injection_point("<bodyguard></bodyguard>"),
            InjectionPoint::DocumentStart
        );
    }

    #[test]
    fn test_intercept_script_carries_marker() {
        assert!(INTERCEPT_SCRIPT.contains(INTERCEPT_MARKER));
        assert!(INTERCEPT_SCRIPT.contains("postMessage"));
        assert!(INTERCEPT_SCRIPT.contains("MutationObserver"));
    }
}
