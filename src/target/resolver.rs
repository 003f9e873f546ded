//! Target URL validation and relative reference resolution.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Schemes an attribute value may carry that must never be rewritten.
const UNREWRITABLE_PREFIXES: &[&str] = &["javascript:", "data:", "mailto:", "tel:", "#"];

/// Errors produced while validating a target URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The value could not be parsed as a URL at all.
    #[error("invalid URL {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    /// Parsed, but the scheme is not http or https.
    #[error("unsupported scheme {scheme:?} in {input:?}")]
    UnsupportedScheme { input: String, scheme: String },

    /// Parsed, but there is no host to connect to.
    #[error("missing host in {input:?}")]
    MissingHost { input: String },
}

/// A validated absolute target URL.
///
/// The scheme is always `http` or `https` and the host is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    url: Url,
}

impl TargetSpec {
    /// Wrap an already parsed URL, applying the same checks as [`normalize`].
    pub fn from_url(url: Url) -> Result<Self, ResolveError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ResolveError::UnsupportedScheme {
                input: url.to_string(),
                scheme: scheme.to_string(),
            });
        }
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self { url }),
            _ => Err(ResolveError::MissingHost {
                input: url.to_string(),
            }),
        }
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Append query pairs to the target, keeping any query it already has.
    pub fn append_query_pairs<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_none() {
            return;
        }
        self.url.query_pairs_mut().extend_pairs(pairs);
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Validate and normalize a raw target URL.
///
/// Values without an `http://` or `https://` prefix get `https://` prepended
/// before parsing.
pub fn normalize(raw: &str) -> Result<TargetSpec, ResolveError> {
    let trimmed = raw.trim();
    if let Some((scheme, _)) = trimmed.split_once("://") {
        if has_scheme(&format!("{}:", scheme)) && !has_http_scheme(trimmed) {
            return Err(ResolveError::UnsupportedScheme {
                input: raw.to_string(),
                scheme: scheme.to_ascii_lowercase(),
            });
        }
    }
    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| match e {
        url::ParseError::EmptyHost => ResolveError::MissingHost {
            input: raw.to_string(),
        },
        other => ResolveError::Malformed {
            input: raw.to_string(),
            reason: other.to_string(),
        },
    })?;

    TargetSpec::from_url(url)
}

/// Resolve an attribute reference against `base`.
///
/// Returns the value unchanged when it is already absolute, protocol
/// relative, non-navigational, empty, or when resolution fails.
pub fn resolve_relative(reference: &str, base: &TargetSpec) -> String {
    resolve_reference(reference, base, None).unwrap_or_else(|| reference.to_string())
}

/// Like [`resolve_relative`], but returns `None` when the reference is left
/// as is. References starting with `proxy_origin` are never touched.
pub fn resolve_reference(
    reference: &str,
    base: &TargetSpec,
    proxy_origin: Option<&str>,
) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || is_unrewritable(trimmed) || trimmed.starts_with("//") {
        return None;
    }
    if let Some(origin) = proxy_origin {
        if trimmed.starts_with(origin) {
            return None;
        }
    }
    if has_scheme(trimmed) {
        return None;
    }

    match base.as_url().join(trimmed) {
        Ok(joined) => Some(joined.to_string()),
        Err(e) => {
            tracing::debug!(reference = %trimmed, base = %base, error = %e, "Reference left unresolved");
            None
        }
    }
}

/// True for `#fragment`, `javascript:`, `data:`, `mailto:` and `tel:` values.
pub fn is_unrewritable(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    UNREWRITABLE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// RFC 3986 scheme detection: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
