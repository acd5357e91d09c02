//! Scraper driven by CSS selectors instead of code

use crate::config::{FieldConfig, ScrapConfig};
use crate::crawler::{Frontier, Scraper};
use crate::output::Record;
use crate::page::{compile_selector, uri, Element, Response};
use crate::Result;
use serde_json::Value;
use std::collections::HashSet;

/// A named value read from each item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub selector: String,
    /// Attribute to read; the element text when unset
    pub attr: Option<String>,
}

impl From<&FieldConfig> for Field {
    fn from(config: &FieldConfig) -> Self {
        Self {
            name: config.name.clone(),
            selector: config.selector.clone(),
            attr: config.attr.clone(),
        }
    }
}

/// Extracts one record per item and follows pagination links
///
/// Without an item selector the whole page is one item. A field whose
/// selector matches nothing (or whose attribute is missing) is `null`.
/// Each followed URL is queued at most once per scraper.
#[derive(Debug, Clone)]
pub struct SelectorScraper {
    item_selector: Option<String>,
    fields: Vec<Field>,
    follow_selector: Option<String>,
    seen: HashSet<String>,
}

impl SelectorScraper {
    /// Checks every selector up front
    ///
    /// # Errors
    ///
    /// [`ScrapeError::InvalidSelector`](crate::ScrapeError::InvalidSelector)
    /// for the first selector that does not compile.
    pub fn new(
        item_selector: Option<String>,
        fields: Vec<Field>,
        follow_selector: Option<String>,
    ) -> Result<Self> {
        for selector in item_selector
            .iter()
            .chain(follow_selector.iter())
            .chain(fields.iter().map(|f| &f.selector))
        {
            compile_selector(selector)?;
        }

        Ok(Self {
            item_selector,
            fields,
            follow_selector,
            seen: HashSet::new(),
        })
    }

    pub fn from_config(config: &ScrapConfig) -> Result<Self> {
        let scraper = Self::new(
            config.item_selector.clone(),
            config.fields.iter().map(Field::from).collect(),
            config.follow_selector.clone(),
        )?;
        Ok(scraper.with_seen(config.seeds.iter().cloned()))
    }

    /// Marks URLs as already queued so links back to them are not followed
    pub fn with_seen(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.seen.extend(urls.into_iter().map(|url| uri::normalize(&url)));
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn extract(&self, item: Element<'_>) -> Result<Record> {
        let mut record = Record::new();
        for field in &self.fields {
            let value = match item.css(&field.selector)? {
                Some(element) => match &field.attr {
                    Some(attr) => element
                        .attr(attr)
                        .map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null),
                    None => Value::String(element.text()),
                },
                None => Value::Null,
            };
            record.insert(field.name.clone(), value);
        }
        Ok(record)
    }
}

impl Scraper for SelectorScraper {
    fn parse(&mut self, response: &Response, frontier: &mut Frontier<'_>) -> Result<Vec<Record>> {
        let document = response.document();

        let records = match &self.item_selector {
            Some(selector) => document
                .css_each(selector, |item, _| self.extract(item))?
                .into_iter()
                .collect::<Result<Vec<_>>>()?,
            None => vec![self.extract(document.root())?],
        };

        if let Some(selector) = &self.follow_selector {
            let hrefs = document.css_each(selector, |e, _| e.attr("href").map(str::to_string))?;
            for href in hrefs.into_iter().flatten() {
                let Some(url) = uri::followable(document.base(), &href) else {
                    continue;
                };
                if self.seen.insert(url.to_string()) {
                    frontier.follow(url.to_string());
                }
            }
        }

        Ok(records)
    }
}
