use quick_xml::{escape::EscapeError, events::attributes::AttrError};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid xml attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("invalid xml escape: {0}")]
    Escape(#[from] EscapeError),
    #[error("unexpected closing tag </{0}>")]
    UnbalancedTag(String),
    #[error("document has no root element")]
    EmptyDocument,
    #[error("could not find <channel> in source feed")]
    MissingChannel,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
