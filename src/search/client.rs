//! HTTP client for the MediaWiki search API.
//!
//! # Responsibilities
//! - Build `list=search` requests with limit and offset
//! - Turn non-200 answers into errors, logging the body at DEBUG
//! - Decode the JSON body into [`SearchResponse`]

use std::time::{Duration, Instant};

use thiserror::Error;
use url::Url;

use crate::config::SearchConfig;
use crate::observability::{context, metrics};
use crate::search::types::SearchResponse;

/// Errors produced while talking to the search API.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search endpoint")]
    Endpoint(#[from] url::ParseError),

    #[error("search request failed")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected {status} response from search API")]
    UnexpectedStatus { status: u16 },

    #[error("malformed search API response")]
    Decode(#[from] serde_json::Error),
}

/// Client for one search endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&config.endpoint)?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            endpoint,
            http: builder.build()?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for one page of results.
    pub fn request_url(&self, query: &str, limit: u32, offset: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("prop", "info")
            .append_pair("inprop", "url")
            .append_pair("utf8", "")
            .append_pair("format", "json")
            .append_pair("origin", "*")
            .append_pair("srlimit", &limit.to_string())
            .append_pair("srsearch", query)
            .append_pair("sroffset", &offset.to_string());
        url
    }

    /// Fetch `limit` results for `query`, skipping the first `offset`.
    pub async fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<SearchResponse, SearchError> {
        let url = self.request_url(query, limit, offset);
        let start = Instant::now();

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream("error", start.elapsed());
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;
        metrics::record_upstream(status.as_str(), start.elapsed());

        if status != reqwest::StatusCode::OK {
            context::current().in_scope(|| {
                tracing::debug!(
                    status_code = status.as_u16(),
                    body = %body,
                    "search API returned an unexpected status"
                );
            });
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
