//! Search API integration.
//!
//! # Data Flow
//! ```text
//! /search handler (query, page)
//!     → client.rs (GET MediaWiki list=search with srlimit/sroffset)
//!     → types.rs (SearchResponse → Search view with pagination)
//!     → http::views (HTML)
//! ```

pub mod client;
pub mod types;

pub use client::{SearchClient, SearchError};
pub use types::{ResultItem, Search, SearchResponse};
