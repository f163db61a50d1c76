//! Request handlers.

use std::num::NonZeroU64;

use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

use crate::http::error::AppError;
use crate::http::server::AppState;
use crate::http::views;
use crate::observability::Logger;
use crate::search::Search;

/// Search form on `/`; every other path is a 404.
pub async fn index_handler(uri: Uri) -> Response {
    if uri.path() != "/" {
        return (StatusCode::NOT_FOUND, "404 page not found").into_response();
    }
    Html(views::render_page(None)).into_response()
}

#[derive(Debug, Default, PartialEq)]
pub struct SearchParams {
    pub q: String,
    pub page: Option<String>,
}

impl SearchParams {
    /// Parse `q` and `page` from a raw query string. A repeated key keeps its
    /// first value; unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let mut seen_q = false;
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
            match key.as_ref() {
                "q" if !seen_q => {
                    params.q = value.into_owned();
                    seen_q = true;
                }
                "page" if params.page.is_none() => params.page = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// `/search?q=<query>&page=<n>`; page defaults to 1.
pub async fn search_handler(
    State(state): State<AppState>,
    logger: Logger,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, AppError> {
    let params = SearchParams::from_query(query.as_deref());
    let raw_page = params.page.as_deref().unwrap_or("1");
    let page = raw_page
        .parse::<NonZeroU64>()
        .map_err(|source| AppError::InvalidPage {
            value: raw_page.to_string(),
            source,
        })?
        .get();

    logger.in_scope(|| {
        tracing::info!(query = %params.q, page, "incoming search query");
    });

    let page_size = state.page_size;
    let offset = (page - 1).saturating_mul(u64::from(page_size));
    let results = state.search.search(&params.q, page_size, offset).await?;

    let search = Search::new(params.q, results, page, page_size);
    logger.in_scope(|| {
        tracing::info!(
            query = %search.query,
            total_hits = search.results.query.searchinfo.totalhits,
            total_pages = search.total_pages,
            "search query succeeded"
        );
    });

    Ok(Html(views::render_page(Some(&search))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_query_uses_defaults() {
        assert_eq!(SearchParams::from_query(None), SearchParams::default());
    }

    #[test]
    fn test_repeated_keys_keep_first_value() {
        let params = SearchParams::from_query(Some("q=cat&page=3&q=dog&page=9"));
        assert_eq!(params.q, "cat");
        assert_eq!(params.page.as_deref(), Some("3"));
    }

    #[test]
    fn test_query_is_percent_decoded() {
        let params = SearchParams::from_query(Some("q=rust+lang%21&lang=en"));
        assert_eq!(params.q, "rust lang!");
        assert_eq!(params.page, None);
    }
}
