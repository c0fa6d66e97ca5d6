use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-_\u{2014}]{3,}$").unwrap());

/// Split a text block into trimmed, non-empty lines, dropping separator rules
/// such as `-----` or `___`.
///
/// Lone `\r`, form feeds, and the Unicode line and paragraph separators all
/// end a line; a `\r\n` pair leaves an empty piece that is filtered out.
pub fn normalize_lines(block: &str) -> Vec<&str> {
    block
        .split(is_line_boundary)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator(line))
        .collect()
}

fn is_line_boundary(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

fn is_separator(line: &str) -> bool {
    SEPARATOR_PATTERN.is_match(line)
}
