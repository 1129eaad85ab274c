//! Paginated collection queries
//!
//! A collection GET answers with `{"items": [...], "links": [...]}`. A link
//! with `rel == "next"` points at the following page. [`Pages`] walks that
//! chain one page at a time, strictly in order, since the server's cursors
//! depend on sequential consumption.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::{ApiError, Transport, links};
use crate::record::Record;

/// Build a query string from `(field, value)` pairs
///
/// Pairs without a value are left out entirely rather than sent empty.
pub fn query_string(params: &[(&str, Option<String>)]) -> String {
    params
        .iter()
        .filter_map(|(field, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", field, urlencoding::encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Resolve a `next` href against the API base URL
pub fn resolve_href(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    rel: String,
    href: String,
}

/// Lazy, finite sequence of result pages
///
/// Yields each page's link-normalized items. After the first error the
/// sequence ends; it cannot be restarted mid-stream.
pub struct Pages<'a> {
    transport: &'a dyn Transport,
    base_url: String,
    resource: String,
    next: Option<String>,
    seen: HashSet<String>,
    page: usize,
}

impl<'a> Pages<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &str, endpoint: &str, params: &[(&str, Option<String>)]) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let query = query_string(params);
        let first = if query.is_empty() {
            format!("{}/{}", base_url, endpoint)
        } else {
            format!("{}/{}?{}", base_url, endpoint, query)
        };
        Self {
            transport,
            base_url,
            resource: endpoint.to_string(),
            next: Some(first),
            seen: HashSet::new(),
            page: 0,
        }
    }

    fn fetch(&mut self, url: String) -> Result<Vec<Record>, ApiError> {
        self.page += 1;
        debug!(%url, page = self.page, "Pages::fetch: called");

        if !self.seen.insert(url.clone()) {
            return Err(ApiError::InvalidResponse(format!("pagination loops back to {}", url)));
        }

        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(ApiError::from_response(&response, &self.resource, ""));
        }

        let page: Page = serde_json::from_str(&response.body)?;

        // The last `next` link wins if the server sends several
        self.next = page
            .links
            .iter()
            .rev()
            .find(|link| link.rel == "next")
            .map(|link| resolve_href(&self.base_url, &link.href));

        page.items.into_iter().map(links::normalize).collect()
    }
}

impl Iterator for Pages<'_> {
    type Item = Result<Vec<Record>, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        let url = self.next.take()?;
        Some(self.fetch(url))
    }
}

/// Every item of a query plus an explicit completeness flag
#[derive(Debug)]
pub struct Listing {
    /// Items in server page order
    pub items: Vec<Record>,
    /// Failure that cut the traversal short, if any
    pub error: Option<ApiError>,
}

impl Listing {
    /// Drain `pages`, keeping whatever arrived before a failing page
    pub fn collect(pages: Pages<'_>) -> Self {
        let mut items = Vec::new();
        for page in pages {
            match page {
                Ok(records) => items.extend(records),
                Err(e) => {
                    warn!(error = %e, gathered = items.len(), "Listing::collect: traversal cut short");
                    return Self { items, error: Some(e) };
                }
            }
        }
        Self { items, error: None }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Strict view: the whole listing, or the error that truncated it
    pub fn into_result(self) -> Result<Vec<Record>, ApiError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.items),
        }
    }
}
