//! Fetch requests
//!
//! A [`Request`] is one unit of fetch work. Its URL, method and body are fixed
//! once it is queued; only the engine's failure handler touches the fail count.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A URL waiting to be fetched for a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
    method: Method,
    body: Vec<(String, String)>,
    fail_count: u32,
}

impl Request {
    /// Creates a GET request for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: Vec::new(),
            fail_count: 0,
        }
    }

    /// Switches the request to GET
    pub fn get(mut self) -> Self {
        self.method = Method::Get;
        self
    }

    /// Switches the request to POST
    pub fn post(mut self) -> Self {
        self.method = Method::Post;
        self
    }

    /// Sets the form body sent with a POST request, keeping insertion order
    pub fn with_body<I, K, V>(mut self, body: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = body
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    pub fn body(&self) -> &[(String, String)] {
        &self.body
    }

    /// Number of failed fetch attempts so far
    pub fn fail_count(&self) -> u32 {
        self.fail_count
    }

    pub(crate) fn increment_fail_count(&mut self) {
        self.fail_count += 1;
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl From<&str> for Request {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Request {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}
