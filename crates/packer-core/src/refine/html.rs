//! HTML stripping.

use super::{RefineError, Refiner};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").unwrap()
});
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</?([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>").unwrap()
});
static ITALIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)\s*>").unwrap());
static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());
static LIST_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li\b[^>]*>").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n(\s*\n)+").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

/// Remove HTML tags, keeping the text.
///
/// Script and style blocks are dropped entirely. Block-level tags become line
/// breaks, inline tags disappear. Common entities are decoded.
#[derive(Debug, Clone, Default)]
pub struct StripHtml {
    preserve_tags: HashSet<String>,
    to_markdown: bool,
}

impl StripHtml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep these tags (by lowercase name) verbatim.
    pub fn preserve_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserve_tags = tags
            .into_iter()
            .map(|t| t.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Convert emphasis, headers and list items to Markdown instead of dropping them.
    pub fn to_markdown(mut self, enabled: bool) -> Self {
        self.to_markdown = enabled;
        self
    }

    pub fn strip(&self, html: &str) -> String {
        let mut text = COMMENT_RE.replace_all(html, "").into_owned();
        text = SCRIPT_RE.replace_all(&text, "").into_owned();

        if self.to_markdown {
            text = HEADER_RE
                .replace_all(&text, |caps: &Captures| {
                    let level: usize = caps[1].parse().unwrap_or(1);
                    format!("\n{} {}\n", "#".repeat(level), caps[2].trim())
                })
                .into_owned();
            text = BOLD_RE.replace_all(&text, "**$1**").into_owned();
            text = ITALIC_RE.replace_all(&text, "*$1*").into_owned();
            text = LIST_ITEM_RE.replace_all(&text, "\n- ").into_owned();
        }

        text = TAG_RE
            .replace_all(&text, |caps: &Captures| {
                let name = caps[1].to_ascii_lowercase();
                if self.preserve_tags.contains(&name) {
                    caps[0].to_string()
                } else if BLOCK_TAGS.contains(&name.as_str()) {
                    "\n".to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();

        let text = decode_entities(&text);
        BLANK_LINES_RE
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }
}

impl Refiner for StripHtml {
    fn refine(&self, text: &str) -> Result<String, RefineError> {
        Ok(self.strip(text))
    }
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;", not "<"
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
