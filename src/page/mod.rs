//! Page view handed to scrapers
//!
//! This module handles:
//! - The fetched [`Response`] (URL, status, headers, body)
//! - CSS-selector queries over the parsed [`Document`]
//! - [`Link`] and [`Image`] descriptors resolved against the page URL

mod document;
mod link;
mod response;
pub mod uri;

pub use document::{compile_selector, Document, Element};
pub use link::{Image, Link};
pub use response::Response;
