//! Channel and item edits applied to the downloaded feed.

use tracing::{debug, info};

use crate::{
    config::AppConfig,
    error::{FeedError, FeedResult},
    util::{
        description::{format_description, FormatOptions},
        html::unescape_entities,
    },
    xml::{
        namespace::{qualified, Prefixes},
        Document, Element, Node,
    },
};

const ATOM_SELF_REL: &str = "self";
const RSS_MIME_TYPE: &str = "application/rss+xml";

#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub image_url: String,
    pub self_url: Option<String>,
    pub explicit: String,
    pub locked: String,
    pub format_descriptions: bool,
    pub format: FormatOptions,
}

impl From<&AppConfig> for RewriteOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            image_url: config.feed.image_url.clone(),
            self_url: config.feed.self_url.clone(),
            explicit: config.feed.explicit.clone(),
            locked: config.feed.locked.clone(),
            format_descriptions: config.feed.format_descriptions,
            format: FormatOptions {
                link_urls: config.formatter.link_urls,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub items: usize,
    pub formatted: usize,
    pub added_explicit: bool,
    pub added_locked: bool,
}

pub fn rewrite_feed(
    document: &mut Document,
    options: &RewriteOptions,
) -> FeedResult<RewriteSummary> {
    let prefixes = Prefixes::declare_on(&mut document.root);
    let channel = document
        .root
        .find_mut(|element| element.local_name() == "channel")
        .ok_or(FeedError::MissingChannel)?;

    let mut summary = RewriteSummary::default();
    replace_artwork(channel, &prefixes, &options.image_url);
    summary.added_explicit =
        ensure_flag(channel, &prefixes.itunes, "explicit", &options.explicit, 1);
    summary.added_locked =
        ensure_flag(channel, &prefixes.podcast, "locked", &options.locked, 2);
    if let Some(self_url) = &options.self_url {
        set_self_link(channel, &prefixes, self_url);
    }

    for item in channel
        .elements_mut()
        .filter(|element| element.local_name() == "item")
    {
        summary.items += 1;
        if options.format_descriptions && format_item(item, &prefixes, options.format) {
            summary.formatted += 1;
        }
    }

    info!(
        items = summary.items,
        formatted = summary.formatted,
        added_explicit = summary.added_explicit,
        added_locked = summary.added_locked,
        "feed rewritten"
    );

    Ok(summary)
}

/// Drop every channel-level artwork tag and put a single one first.
fn replace_artwork(channel: &mut Element, prefixes: &Prefixes, image_url: &str) {
    let image_name = qualified(&prefixes.itunes, "image");
    let removed = channel.remove_children(|element| {
        element.name == image_name
            || (element.local_name() == "image"
                && element.prefix().is_some_and(|prefix| prefix.contains("itunes")))
    });
    debug!(removed, image_url, "replacing channel artwork");

    channel.insert_child(0, Element::new(image_name).with_attribute("href", image_url));
}

/// Insert `<prefix:local>value</prefix:local>` at `index` unless the channel
/// already carries one. Returns whether it was added.
fn ensure_flag(
    channel: &mut Element,
    prefix: &str,
    local: &str,
    value: &str,
    index: usize,
) -> bool {
    let name = qualified(prefix, local);
    if channel.has_child(&name) {
        return false;
    }
    channel.insert_child(index, Element::new(name).with_text(value));
    true
}

fn set_self_link(channel: &mut Element, prefixes: &Prefixes, self_url: &str) {
    let link_name = qualified(&prefixes.atom, "link");
    channel.remove_children(|element| {
        element.name == link_name && element.attribute("rel") == Some(ATOM_SELF_REL)
    });

    let link = Element::new(link_name)
        .with_attribute("href", self_url)
        .with_attribute("rel", ATOM_SELF_REL)
        .with_attribute("type", RSS_MIME_TYPE);
    let index = channel
        .children
        .iter()
        .position(|node| match node {
            Node::Element(element) => !is_channel_header(element, prefixes),
            _ => true,
        })
        .unwrap_or(channel.children.len());
    channel.insert_child(index, link);
}

fn is_channel_header(element: &Element, prefixes: &Prefixes) -> bool {
    element.name == qualified(&prefixes.itunes, "image")
        || element.name == qualified(&prefixes.itunes, "explicit")
        || element.name == qualified(&prefixes.podcast, "locked")
}

/// Render the item's plain-text description into `content:encoded`.
fn format_item(item: &mut Element, prefixes: &Prefixes, options: FormatOptions) -> bool {
    let source = item
        .child("description")
        .or_else(|| item.child(&qualified(&prefixes.itunes, "summary")))
        .map(Element::text)
        .unwrap_or_default();
    if source.trim().is_empty() {
        return false;
    }

    let html = format_description(&unescape_entities(&source), options);
    if html.is_empty() {
        return false;
    }
    debug!(source_len = source.len(), html_len = html.len(), "formatted item description");

    let encoded_name = qualified(&prefixes.content, "encoded");
    match item.child_mut(&encoded_name) {
        Some(encoded) => encoded.set_cdata(html),
        None => {
            let mut encoded = Element::new(encoded_name);
            encoded.set_cdata(html);
            item.push_child(encoded);
        }
    }
    true
}
