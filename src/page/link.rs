//! Link and image descriptors

use crate::page::uri::{query_pairs, resolve};
use url::{ParseError, Url};

/// An `<a href>` (or any element with an `href`) found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    text: String,
    raw_uri: String,
    base: Url,
}

impl Link {
    pub fn new(text: impl Into<String>, raw_uri: impl Into<String>, base: Url) -> Self {
        Self {
            text: text.into(),
            raw_uri: raw_uri.into(),
            base,
        }
    }

    /// Visible text of the link, whitespace collapsed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The `href` exactly as written in the page
    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    /// The `href` resolved against the page URL
    pub fn uri(&self) -> Result<Url, ParseError> {
        resolve(&self.base, &self.raw_uri)
    }

    /// Query parameters of the resolved URI; empty when it does not resolve
    pub fn query(&self) -> Vec<(String, String)> {
        self.uri().map(|u| query_pairs(&u)).unwrap_or_default()
    }
}

/// An `<img src>` found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    raw_uri: String,
    alt: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    base: Url,
}

impl Image {
    pub fn new(
        raw_uri: impl Into<String>,
        alt: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        base: Url,
    ) -> Self {
        Self {
            raw_uri: raw_uri.into(),
            alt,
            width,
            height,
            base,
        }
    }

    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    /// The `src` resolved against the page URL
    pub fn source(&self) -> Result<Url, ParseError> {
        resolve(&self.base, &self.raw_uri)
    }

    pub fn alt(&self) -> Option<&str> {
        self.alt.as_deref()
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }
}
