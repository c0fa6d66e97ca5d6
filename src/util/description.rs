//! Episode description formatting.
//!
//! Turns a plain-text episode description into an HTML fragment: a line
//! containing "tracklist" becomes a bold header, the lines after it become
//! bullet items until an "Available to stream…" line closes the list, and
//! every other line is emitted followed by a `<br/>`.
//!
//! A tracklist that is never closed bullets every remaining line. Formatting
//! is not idempotent: feeding the HTML output back in yields different text.

use std::fmt;

use quick_xml::escape::escape;

use super::{
    html::escape_text,
    lines::normalize_lines,
    url::{find_url, is_bare_url},
};

const TRACKLIST_MARKER: &str = "tracklist";
const TRACKLIST_HEADER: &str = "Tracklist:";
const AVAILABILITY_PREFIX: &str = "available to stream";
const WEBSITE_PREFIX: &str = "website";
const BULLET: &str = "\u{2022} ";
const LINE_BREAK: &str = "<br/>";
const MAX_CONSECUTIVE_BREAKS: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Wrap the URL of website lines in an anchor.
    pub link_urls: bool,
}

/// Whether the formatter is currently inside a tracklist block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Outside,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Plain,
    TracklistHeader,
    TrackItem,
    Availability,
    Website,
}

impl Section {
    pub fn classify(self, line: &str) -> LineKind {
        let lower = line.to_lowercase();
        match self {
            Section::Outside if lower.contains(TRACKLIST_MARKER) => LineKind::TracklistHeader,
            _ if lower.starts_with(AVAILABILITY_PREFIX) => LineKind::Availability,
            Section::Inside => LineKind::TrackItem,
            Section::Outside if lower.starts_with(WEBSITE_PREFIX) || is_bare_url(line) => {
                LineKind::Website
            }
            Section::Outside => LineKind::Plain,
        }
    }

    pub fn next(self, kind: LineKind) -> Section {
        match kind {
            LineKind::TracklistHeader => Section::Inside,
            LineKind::Availability => Section::Outside,
            LineKind::Plain | LineKind::TrackItem | LineKind::Website => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Bold(&'static str),
    Bullet(&'a str),
    Link(&'a str),
    Break,
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(text) => f.write_str(&escape_text(text)),
            Segment::Bold(text) => write!(f, "<b>{}</b>", escape_text(text)),
            Segment::Bullet(text) => write!(f, "{BULLET}{}", escape_text(text)),
            Segment::Link(url) => {
                write!(f, "<a href=\"{}\">{}</a>", escape(*url), escape_text(url))
            }
            Segment::Break => f.write_str(LINE_BREAK),
        }
    }
}

/// Ordered HTML segments produced from one description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedFragment<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> FormattedFragment<'a> {
    fn push_line(&mut self, kind: LineKind, line: &'a str, options: FormatOptions) {
        match kind {
            LineKind::TracklistHeader => {
                self.segments.push(Segment::Bold(TRACKLIST_HEADER));
            }
            LineKind::TrackItem => self.segments.push(Segment::Bullet(line)),
            LineKind::Availability => {
                self.segments.push(Segment::Break);
                self.segments.push(Segment::Text(line));
            }
            LineKind::Website if options.link_urls => self.push_linked(line),
            LineKind::Website | LineKind::Plain => self.segments.push(Segment::Text(line)),
        }
        self.segments.push(Segment::Break);
    }

    fn push_linked(&mut self, line: &'a str) {
        let Some(range) = find_url(line) else {
            self.segments.push(Segment::Text(line));
            return;
        };
        if range.start > 0 {
            self.segments.push(Segment::Text(&line[..range.start]));
        }
        self.segments.push(Segment::Link(&line[range.clone()]));
        if range.end < line.len() {
            self.segments.push(Segment::Text(&line[range.end..]));
        }
    }

    fn collapse_breaks(&mut self) {
        let mut run = 0usize;
        self.segments.retain(|segment| {
            if *segment == Segment::Break {
                run += 1;
                run <= MAX_CONSECUTIVE_BREAKS
            } else {
                run = 0;
                true
            }
        });
    }

    #[cfg(test)]
    fn bullet_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Bullet(_)))
            .count()
    }
}

impl fmt::Display for FormattedFragment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

pub fn format_fragment(text: &str, options: FormatOptions) -> FormattedFragment<'_> {
    let mut fragment = FormattedFragment::default();
    let mut section = Section::default();

    for line in normalize_lines(text) {
        let kind = section.classify(line);
        fragment.push_line(kind, line, options);
        section = section.next(kind);
    }

    fragment.collapse_breaks();
    fragment
}

/// Render a raw episode description as an HTML fragment.
pub fn format_description(text: &str, options: FormatOptions) -> String {
    format_fragment(text, options).to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        format_description, format_fragment, FormatOptions, FormattedFragment, LineKind, Section,
        Segment,
    };

    const LINKED: FormatOptions = FormatOptions { link_urls: true };

    #[test]
    fn test_empty_description_formats_to_empty_string() {
        assert_eq!(format_description("", FormatOptions::default()), "");
        assert_eq!(format_description("\n\n  \n", FormatOptions::default()), "");
    }

    #[test]
    fn test_tracklist_is_bolded_and_bulleted() {
        let input = "Intro line\n\nTracklist\nTrack 1\nTrack 2\n\nAvailable to stream now";
        let html = format_description(input, FormatOptions::default());
        assert_eq!(
            html,
            "Intro line<br/><b>Tracklist:</b><br/>\u{2022} Track 1<br/>\u{2022} Track 2<br/><br/>Available to stream now<br/>"
        );
        assert_eq!(format_fragment(input, FormatOptions::default()).bullet_count(), 2);
        assert!(!html.contains("\u{2022} Available"));
    }

    #[test]
    fn test_plain_description_has_no_bullets() {
        let input = "Episode one\nRecorded live\n\nThanks for listening";
        let fragment = format_fragment(input, FormatOptions::default());
        assert_eq!(fragment.bullet_count(), 0);
        assert_eq!(
            fragment.to_string(),
            "Episode one<br/>Recorded live<br/>Thanks for listening<br/>"
        );
    }

    #[test]
    fn test_separator_lines_never_reach_output() {
        let html = format_description("Intro\n----\nTracklist\n____\nTrack", FormatOptions::default());
        assert!(!html.contains("--"));
        assert!(!html.contains("__"));
        assert_eq!(html, "Intro<br/><b>Tracklist:</b><br/>\u{2022} Track<br/>");
    }

    #[test]
    fn test_availability_outside_tracklist_gets_extra_break() {
        let html = format_description("Intro\nAvailable to stream everywhere", FormatOptions::default());
        assert_eq!(html, "Intro<br/><br/>Available to stream everywhere<br/>");
    }

    #[test]
    fn test_unterminated_tracklist_bullets_remaining_lines() {
        let input = "Tracklist:\nArtist - One\nArtist - Two\nhttps://example.com";
        let fragment = format_fragment(input, LINKED);
        assert_eq!(fragment.bullet_count(), 3);
        assert!(!fragment.to_string().contains("<a href"));
    }

    #[test]
    fn test_second_tracklist_marker_inside_list_is_a_track() {
        let html = format_description("Tracklist\nTracklist ID\nSong", FormatOptions::default());
        assert_eq!(
            html,
            "<b>Tracklist:</b><br/>\u{2022} Tracklist ID<br/>\u{2022} Song<br/>"
        );
    }

    #[test]
    fn test_bare_url_is_wrapped_in_anchor() {
        let html = format_description("Find me online\nhttps://djsite.example.com/mixes", LINKED);
        assert_eq!(
            html,
            "Find me online<br/><a href=\"https://djsite.example.com/mixes\">https://djsite.example.com/mixes</a><br/>"
        );
    }

    #[test]
    fn test_carriage_return_descriptions_keep_every_line() {
        let html = format_description("Intro\rTracklist\rA\rB", LINKED);
        assert_eq!(
            html,
            "Intro<br/><b>Tracklist:</b><br/>\u{2022} A<br/>\u{2022} B<br/>"
        );
    }

    #[test]
    fn test_bare_url_followed_by_period_is_linked() {
        let html = format_description("https://example.com.", LINKED);
        assert_eq!(
            html,
            "<a href=\"https://example.com\">https://example.com</a>.<br/>"
        );
    }

    #[test]
    fn test_website_line_keeps_label_around_anchor() {
        let html = format_description("Website: https://example.com.", LINKED);
        assert_eq!(
            html,
            "Website: <a href=\"https://example.com\">https://example.com</a>.<br/>"
        );
    }

    #[test]
    fn test_urls_left_as_text_without_link_option() {
        let html = format_description("https://example.com", FormatOptions::default());
        assert_eq!(html, "https://example.com<br/>");
    }

    #[test]
    fn test_line_text_is_html_escaped() {
        let html = format_description("Tracklist\nDrum & Bass <VIP>", FormatOptions::default());
        assert_eq!(
            html,
            "<b>Tracklist:</b><br/>\u{2022} Drum &amp; Bass &lt;VIP&gt;<br/>"
        );
    }

    #[test]
    fn test_collapse_limits_break_runs_to_two() {
        let mut fragment = FormattedFragment {
            segments: vec![
                Segment::Text("a"),
                Segment::Break,
                Segment::Break,
                Segment::Break,
                Segment::Break,
                Segment::Text("b"),
                Segment::Break,
            ],
        };
        fragment.collapse_breaks();
        assert_eq!(fragment.to_string(), "a<br/><br/>b<br/>");
    }

    #[test]
    fn test_output_never_has_three_consecutive_breaks() {
        let samples = [
            "Available to stream now\nAvailable to stream later",
            "Tracklist\nA\nAvailable to stream\nAvailable to stream too",
            "\n\n---\n\nAvailable to stream\n\n\n",
            "x\n\n\n\ny\n___\nAvailable to stream",
        ];
        for sample in samples {
            let html = format_description(sample, FormatOptions::default());
            assert!(!html.contains("<br/><br/><br/>"), "{html}");
        }
    }

    #[test]
    fn test_section_transitions() {
        let outside = Section::Outside;
        assert_eq!(outside.classify("My TRACKLIST"), LineKind::TracklistHeader);
        assert_eq!(outside.classify("website: x"), LineKind::Website);
        assert_eq!(outside.classify("hello"), LineKind::Plain);
        assert_eq!(outside.next(LineKind::TracklistHeader), Section::Inside);

        let inside = Section::Inside;
        assert_eq!(inside.classify("Song"), LineKind::TrackItem);
        assert_eq!(inside.classify("Available to stream on"), LineKind::Availability);
        assert_eq!(inside.classify("Available on Spotify"), LineKind::TrackItem);
        assert_eq!(inside.next(LineKind::TrackItem), Section::Inside);
        assert_eq!(inside.next(LineKind::Availability), Section::Outside);
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let input = "Intro\nTracklist\nA & B\nAvailable to stream now";
        assert_eq!(
            format_description(input, FormatOptions::default()),
            format_description(input, FormatOptions::default())
        );
    }
}
