use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap()
});

/// Decode HTML character references left in feed text after XML parsing.
///
/// Unknown or malformed references are kept verbatim, so a stray `&` in
/// "Drum & Bass" survives untouched.
pub fn unescape_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    ENTITY_PATTERN.replace_all(input, |caps: &Captures<'_>| {
        let whole = &caps[0];
        resolve_reference(&caps[1]).unwrap_or_else(|| whole.to_string())
    })
}

/// Escape text for embedding in an HTML fragment.
pub fn escape_text(input: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(input)
}

fn resolve_reference(reference: &str) -> Option<String> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let resolved = match reference {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bull" => "\u{2022}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        _ => return None,
    };
    Some(resolved.to_string())
}
