use std::{ops::Range, sync::LazyLock};

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use url::Url;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhttps?://[^\s<>]+").unwrap());

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\''];

/// Check that a configured feed/artwork URL is absolute http(s) and return
/// it without a fragment.
pub fn validate_feed_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid url: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("url {raw} must use http or https"));
    }
    if url.host_str().is_none() {
        return Err(anyhow!("url {raw} has no host"));
    }
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Locate the first http(s) URL inside a line of text. Trailing sentence
/// punctuation is not considered part of the URL.
pub fn find_url(text: &str) -> Option<Range<usize>> {
    let found = URL_PATTERN.find(text)?;
    let trimmed = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
    Url::parse(trimmed).ok()?;
    Some(found.start()..found.start() + trimmed.len())
}

/// True when the whole line is a single URL, ignoring trailing punctuation.
pub fn is_bare_url(line: &str) -> bool {
    let line = line.trim().trim_end_matches(TRAILING_PUNCTUATION);
    find_url(line).is_some_and(|range| range.start == 0 && range.end == line.len())
}
