//! CSS-selector views over a parsed HTML page

use crate::page::link::{Image, Link};
use crate::{Result, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiles a CSS selector
pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// A parsed HTML document with the URL it was fetched from
///
/// # Example
///
/// ```
/// use scrapyard::page::Document;
/// use url::Url;
///
/// let html = r#"<ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul>"#;
/// let doc = Document::parse(html, Url::parse("https://example.com/").unwrap());
///
/// let hrefs = doc
///     .css_each("li a", |a, _| a.attr("href").unwrap_or_default().to_string())
///     .unwrap();
/// assert_eq!(hrefs, vec!["/a", "/b"]);
/// ```
pub struct Document {
    html: Html,
    base: Url,
}

impl Document {
    pub fn parse(body: &str, base: Url) -> Self {
        Self {
            html: Html::parse_document(body),
            base,
        }
    }

    /// URL relative links are resolved against
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The `<html>` element
    pub fn root(&self) -> Element<'_> {
        Element::new(self.html.root_element(), &self.base)
    }

    /// Trimmed text of `<title>`, if any
    pub fn title(&self) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        self.html
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// First element matching `selector`
    pub fn css(&self, selector: &str) -> Result<Option<Element<'_>>> {
        let selector = compile_selector(selector)?;
        let found = self
            .html
            .select(&selector)
            .next()
            .map(|e| Element::new(e, &self.base));
        Ok(found)
    }

    /// Maps every element matching `selector`, in document order
    ///
    /// The callback gets the element and its zero-based position.
    pub fn css_each<T, F>(&self, selector: &str, f: F) -> Result<Vec<T>>
    where
        F: FnMut(Element<'_>, usize) -> T,
    {
        let selector = compile_selector(selector)?;
        Ok(map_matches(
            self.html.select(&selector).map(|e| Element::new(e, &self.base)),
            f,
        ))
    }
}

fn map_matches<'a, T, F>(elements: impl Iterator<Item = Element<'a>>, mut f: F) -> Vec<T>
where
    F: FnMut(Element<'a>, usize) -> T,
{
    elements.enumerate().map(|(i, e)| f(e, i)).collect()
}

/// One element of a [`Document`]
#[derive(Clone, Copy)]
pub struct Element<'a> {
    element: ElementRef<'a>,
    base: &'a Url,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>, base: &'a Url) -> Self {
        Self { element, base }
    }

    /// Tag name, lowercase
    pub fn name(&self) -> &'a str {
        self.element.value().name()
    }

    /// Text content with runs of whitespace collapsed to one space
    pub fn text(&self) -> String {
        self.element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Inner HTML
    pub fn html(&self) -> String {
        self.element.inner_html()
    }

    /// First descendant matching `selector`
    pub fn css(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let selector = compile_selector(selector)?;
        let base = self.base;
        let found = self
            .element
            .select(&selector)
            .next()
            .map(|e| Element::new(e, base));
        Ok(found)
    }

    /// Maps every descendant matching `selector`, in document order
    pub fn css_each<T, F>(&self, selector: &str, f: F) -> Result<Vec<T>>
    where
        F: FnMut(Element<'a>, usize) -> T,
    {
        let selector = compile_selector(selector)?;
        let base = self.base;
        Ok(map_matches(
            self.element.select(&selector).map(|e| Element::new(e, base)),
            f,
        ))
    }

    /// Reads this element as a link
    ///
    /// # Errors
    ///
    /// [`ScrapeError::InvalidLink`] if the element has no `href`.
    pub fn link(&self) -> Result<Link> {
        let href = self.attr("href").ok_or_else(|| ScrapeError::InvalidLink {
            element: self.element.html(),
        })?;
        Ok(Link::new(self.text(), href, self.base.clone()))
    }

    /// Reads this element as an image
    ///
    /// # Errors
    ///
    /// [`ScrapeError::InvalidImage`] if the element has no `src`.
    pub fn image(&self) -> Result<Image> {
        let src = self.attr("src").ok_or_else(|| ScrapeError::InvalidImage {
            element: self.element.html(),
        })?;
        let dimension = |name| self.attr(name).and_then(|v| v.trim().parse().ok());
        Ok(Image::new(
            src,
            self.attr("alt").map(str::to_string),
            dimension("width"),
            dimension("height"),
            self.base.clone(),
        ))
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("base", &self.base.as_str())
            .finish()
    }
}
