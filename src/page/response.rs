//! Fetched page

use crate::page::document::{Document, Element};
use crate::{Result, ScrapeError};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use url::Url;

/// A fetched page as handed to middlewares and scrapers
///
/// Header names are stored lowercase; a header may carry several values.
/// The status is `None` when the transport cannot observe it (a browser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    url: Url,
    status: Option<u16>,
    headers: BTreeMap<String, Vec<String>>,
    body: String,
}

impl Response {
    pub fn new(url: Url, status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Adds one value to a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    /// Final URL of the page, after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the body
    ///
    /// Each call parses again; keep the [`Document`] around when running
    /// several queries.
    pub fn document(&self) -> Document {
        Document::parse(&self.body, self.url.clone())
    }

    /// Deserializes a JSON body
    ///
    /// A body that does not match `T` is a [`ScrapeError::Parse`] naming the
    /// response URL.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| ScrapeError::Parse {
            url: self.url.to_string(),
            message: e.to_string(),
        })
    }

    /// Applies `f` to the first element matching `selector`
    pub fn css<T, F>(&self, selector: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(Element<'_>) -> T,
    {
        let document = self.document();
        let found = document.css(selector)?.map(f);
        Ok(found)
    }

    /// Maps every element matching `selector`, in document order
    pub fn css_each<T, F>(&self, selector: &str, f: F) -> Result<Vec<T>>
    where
        F: FnMut(Element<'_>, usize) -> T,
    {
        self.document().css_each(selector, f)
    }
}
