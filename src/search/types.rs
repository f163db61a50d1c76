//! Search API payloads and the pagination view model.

use serde::{Deserialize, Serialize};

/// One hit returned by the search API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResultItem {
    pub title: String,
    /// HTML fragment with matches highlighted by the API.
    pub snippet: String,
    pub pageid: u64,
    pub size: u64,
    pub wordcount: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchInfo {
    pub totalhits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryResult {
    pub search: Vec<ResultItem>,
    pub searchinfo: SearchInfo,
}

/// Body of `action=query&list=search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchResponse {
    pub query: QueryResult,
}

/// One rendered page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub query: String,
    pub results: SearchResponse,
    pub total_pages: u64,
    pub next_page: u64,
}

impl Search {
    /// Build the view for `page` (1-based) of a response.
    pub fn new(query: impl Into<String>, results: SearchResponse, page: u64, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        let total_pages = results.query.searchinfo.totalhits.div_ceil(page_size);
        Self {
            query: query.into(),
            results,
            total_pages,
            next_page: page.saturating_add(1),
        }
    }

    pub fn current_page(&self) -> u64 {
        if self.next_page <= 1 {
            1
        } else {
            self.next_page - 1
        }
    }

    pub fn previous_page(&self) -> u64 {
        self.current_page().saturating_sub(1)
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page() >= self.total_pages
    }
}
