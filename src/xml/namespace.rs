use tracing::debug;

use super::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: &'static str,
    pub uri: &'static str,
}

pub const ITUNES: Namespace = Namespace {
    prefix: "itunes",
    uri: "http://www.itunes.com/dtds/podcast-1.0.dtd",
};

pub const CONTENT: Namespace = Namespace {
    prefix: "content",
    uri: "http://purl.org/rss/1.0/modules/content/",
};

pub const ATOM: Namespace = Namespace {
    prefix: "atom",
    uri: "http://www.w3.org/2005/Atom",
};

pub const PODCAST: Namespace = Namespace {
    prefix: "podcast",
    uri: "https://podcastindex.org/namespace/1.0",
};

/// Prefixes the document uses for the feed namespaces, after declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixes {
    pub itunes: String,
    pub content: String,
    pub atom: String,
    pub podcast: String,
}

impl Prefixes {
    /// Declare every feed namespace on `root`, reusing prefixes the source
    /// already bound.
    pub fn declare_on(root: &mut Element) -> Self {
        Self {
            itunes: declare(root, ITUNES),
            content: declare(root, CONTENT),
            atom: declare(root, ATOM),
            podcast: declare(root, PODCAST),
        }
    }
}

pub fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

/// Prefix bound to `namespace` by an `xmlns:*` attribute on `element`.
pub fn bound_prefix(element: &Element, namespace: Namespace) -> Option<&str> {
    element.attributes.iter().find_map(|(key, value)| {
        key.strip_prefix("xmlns:")
            .filter(|_| value == namespace.uri)
    })
}

fn declare(root: &mut Element, namespace: Namespace) -> String {
    if let Some(prefix) = bound_prefix(root, namespace) {
        return prefix.to_string();
    }

    let mut prefix = namespace.prefix.to_string();
    let mut suffix = 1;
    while root.attribute(&format!("xmlns:{prefix}")).is_some() {
        prefix = format!("{}{suffix}", namespace.prefix);
        suffix += 1;
    }

    debug!(prefix = %prefix, uri = namespace.uri, "declaring namespace on root");
    root.set_attribute(format!("xmlns:{prefix}"), namespace.uri);
    prefix
}
