//! Attribute reference rewriting.
//!
//! `href`, `src` and `action` values are made absolute against the page's
//! base URL. Comments and the bodies of `<script>` elements are copied
//! verbatim so literal `href="..."` text inside them is left alone; the
//! opening `<script ...>` tag itself is still rewritten.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::target::resolver::resolve_reference;
use crate::target::TargetSpec;

/// Regions copied verbatim (comments) or partially (script elements).
pub(crate) static OPAQUE_REGIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?P<comment><!--.*?-->)|(?P<open><script\b[^>]*>)(?P<rest>.*?</script\s*>)")
        .expect("opaque region pattern is valid")
});

/// A rewritable attribute preceded by whitespace, quoted either way.
static LINK_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?P<lead>\s)(?P<name>href|src|action)(?P<eq>\s*=\s*)(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#,
    )
    .expect("link attribute pattern is valid")
});

/// Base URL and proxy identity for one response.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    pub base: &'a TargetSpec,
    /// `scheme://host:port` of this proxy; references to it stay untouched.
    pub proxy_origin: Option<&'a str>,
}

impl<'a> RewriteContext<'a> {
    pub fn new(base: &'a TargetSpec) -> Self {
        Self {
            base,
            proxy_origin: None,
        }
    }

    pub fn with_proxy_origin(mut self, origin: &'a str) -> Self {
        self.proxy_origin = Some(origin);
        self
    }
}

/// Rewrite every relative `href`/`src`/`action` value in `document`.
pub fn rewrite_attributes(document: &str, ctx: &RewriteContext<'_>) -> String {
    let mut out = String::with_capacity(document.len() + document.len() / 8);
    let mut last = 0;

    for region in OPAQUE_REGIONS.captures_iter(document) {
        let Some(whole) = region.get(0) else {
            continue;
        };
        out.push_str(&rewrite_fragment(&document[last..whole.start()], ctx));

        if let Some(comment) = region.name("comment") {
            out.push_str(comment.as_str());
        } else if let (Some(open), Some(rest)) = (region.name("open"), region.name("rest")) {
            out.push_str(&rewrite_fragment(open.as_str(), ctx));
            out.push_str(rest.as_str());
        }
        last = whole.end();
    }

    out.push_str(&rewrite_fragment(&document[last..], ctx));
    out
}

fn rewrite_fragment<'t>(fragment: &'t str, ctx: &RewriteContext<'_>) -> Cow<'t, str> {
    LINK_ATTRIBUTE.replace_all(fragment, |caps: &Captures<'_>| {
        let (value, quote) = match (caps.name("dq"), caps.name("sq")) {
            (Some(v), _) => (v.as_str(), '"'),
            (None, Some(v)) => (v.as_str(), '\''),
            (None, None) => return caps[0].to_string(),
        };

        match resolve_reference(value, ctx.base, ctx.proxy_origin) {
            Some(absolute) => format!(
                "{}{}{}{quote}{}{quote}",
                &caps["lead"],
                &caps["name"],
                &caps["eq"],
                escape_attribute(&absolute, quote),
            ),
            None => caps[0].to_string(),
        }
    })
}

/// Keep the rewritten value inside its original quoting.
fn escape_attribute(value: &str, quote: char) -> Cow<'_, str> {
    if value.contains(quote) {
        let entity = if quote == '"' { "&quot;" } else { "&#39;" };
        Cow::Owned(value.replace(quote, entity))
    } else {
        Cow::Borrowed(value)
    }
}
