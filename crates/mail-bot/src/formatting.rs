//! Text helpers for Telegram HTML messages.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>(.*?)</a\s*>"#)
        .expect("anchor pattern is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trimmed text cut to `limit` characters, ending in `...` when cut.
pub fn short(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Split `Name <address>` into its parts. A bare value is used for both.
pub fn split_sender(raw: &str) -> (String, String) {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "Unknown" } else { raw };

    match (raw.find('<'), raw.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let name = raw[..open].trim().trim_matches('"').trim();
            let address = raw[open + 1..close].trim();
            let name = if name.is_empty() { address } else { name };
            (name.to_string(), address.to_string())
        }
        _ => (raw.to_string(), raw.to_string()),
    }
}

/// Render a SQLite timestamp as `dd.mm.YYYY HH:MM`, or return it unchanged.
pub fn format_datetime(value: &str) -> String {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Notice appended to a body cut by [`truncate_body`].
pub const TRUNCATION_NOTICE: &str = "\n...\n[Text truncated]";

/// Trimmed body limited to `max` characters including the truncation notice.
pub fn truncate_body(body: &str, max: usize) -> String {
    let body = body.trim();
    if body.chars().count() <= max {
        return body.to_string();
    }
    let keep = max.saturating_sub(TRUNCATION_NOTICE.chars().count());
    let mut out: String = body.chars().take(keep).collect();
    out.push_str(TRUNCATION_NOTICE);
    out
}

/// Decode the character references commonly found in anchor text and targets.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// A link found in an HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Visible text of the anchor, or the target when it has none.
    pub title: String,
    pub href: String,
}

/// Anchors with an `href`, in document order.
pub fn extract_links(html: &str) -> Vec<Link> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
            if href.is_empty() {
                return None;
            }
            let inner = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            let href = decode_entities(href);
            let title = decode_entities(&TAG.replace_all(inner, ""));
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            let title = if title.is_empty() { href.clone() } else { title };
            Some(Link { title, href })
        })
        .collect()
}

/// True for targets Telegram accepts on a URL button.
pub fn is_web_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
