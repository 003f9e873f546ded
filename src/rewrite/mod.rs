//! HTML content rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! decoded text/html body + RewriteContext (base URL, proxy origin)
//!     → size check (oversized documents are relayed untouched)
//!     → html.rs (href/src/action → absolute URLs)
//!     → inject.rs (navigation interception script, exactly once)
//!     → rewritten document
//! ```
//!
//! # Design Decisions
//! - Only text/html responses reach the rewriter
//! - A failed rewrite never fails the request; the caller relays the
//!   upstream bytes instead
//! - The injected script talks to the embedding window via postMessage

pub mod html;
pub mod inject;

use thiserror::Error;

use crate::config::RewriteConfig;
use crate::target::TargetSpec;

pub use html::{rewrite_attributes, RewriteContext};
pub use inject::{inject_script, injection_point, InjectionPoint, INTERCEPT_SCRIPT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("document of {size} bytes exceeds rewrite limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
}

/// Applies the configured HTML transformations.
#[derive(Debug, Clone)]
pub struct Rewriter {
    rewrite_links: bool,
    inject: bool,
    max_document_bytes: usize,
}

impl Rewriter {
    pub fn new(config: &RewriteConfig) -> Self {
        Self {
            rewrite_links: config.enabled,
            inject: config.inject_script,
            max_document_bytes: config.max_document_bytes,
        }
    }

    /// True when this rewriter would leave every document unchanged.
    pub fn is_noop(&self) -> bool {
        !self.rewrite_links && !self.inject
    }

    pub fn rewrite(&self, document: &str, ctx: &RewriteContext<'_>) -> Result<String, RewriteError> {
        if document.len() > self.max_document_bytes {
            return Err(RewriteError::TooLarge {
                size: document.len(),
                limit: self.max_document_bytes,
            });
        }

        let mut out = if self.rewrite_links {
            rewrite_attributes(document, ctx)
        } else {
            document.to_string()
        };
        if self.inject {
            out = inject_script(&out, INTERCEPT_SCRIPT);
        }
        Ok(out)
    }
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(&RewriteConfig::default())
    }
}

/// Rewrite references against `base` and inject the interception script
/// with default settings.
pub fn rewrite(document: &str, base: &TargetSpec) -> String {
    let ctx = RewriteContext::new(base);
    Rewriter::default()
        .rewrite(document, &ctx)
        .unwrap_or_else(|_| document.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::normalize;

    #[test]
    fn test_full_document() {
        let base = normalize("https://example.com").unwrap();
        let out = rewrite(
            r#"<html><head></head><body><a href="/x">go</a></body></html>"#,
            &base,
        );
        assert!(out.contains(r#"href="https://example.com/x""#));
        assert_eq!(out.matches(inject::INTERCEPT_MARKER).count(), 1);
        let script_at = out.find(inject::INTERCEPT_MARKER).unwrap();
        assert!(script_at < out.find("</head>").unwrap());
    }

    #[test]
    fn test_oversized_document_is_an_error() {
        let base = normalize("https://example.com").unwrap();
        let rewriter = Rewriter::new(&RewriteConfig {
            max_document_bytes: 8,
            ..RewriteConfig::default()
        });
        let err = rewriter
            .rewrite("<html>0123456789</html>", &RewriteContext::new(&base))
            .unwrap_err();
        assert_eq!(err, RewriteError::TooLarge { size: 23, limit: 8 });
    }

    #[test]
    fn test_disabled_features() {
        let base = normalize("https://example.com").unwrap();
        let rewriter = Rewriter::new(&RewriteConfig {
            enabled: false,
            inject_script: true,
            ..RewriteConfig::default()
        });
        let out = rewriter
            .rewrite(r#"<head></head><a href="/x">"#, &RewriteContext::new(&base))
            .unwrap();
        assert!(out.contains(r#"href="/x""#));
        assert!(out.contains(inject::INTERCEPT_MARKER));

        let noop = Rewriter::new(&RewriteConfig {
            enabled: false,
            inject_script: false,
            ..RewriteConfig::default()
        });
        assert!(noop.is_noop());
    }
}
