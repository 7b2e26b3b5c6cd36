//! Endpoint registry: pure mappings from typed parameters to requests.
//!
//! # Design
//! Each operation is a free function producing an `ApiRequest`; no I/O
//! happens here, so the whole registry is unit-testable without a network.
//! The parameter structs double as cache keys and therefore derive
//! `Hash + Eq`. `limit`/`offset` defaults apply only when the caller omits
//! the value — an explicit `Some(0)` goes out on the wire as `limit=0`.

use crate::http::ApiRequest;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u32 = 0;

/// Parameters for fetching a single post.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostParams {
    pub publication_url: String,
    pub slug: String,
}

/// Parameters for the latest/top listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListParams {
    pub publication_url: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListParams {
    pub fn new(publication_url: impl Into<String>) -> Self {
        Self {
            publication_url: publication_url.into(),
            limit: None,
            offset: None,
        }
    }
}

/// Parameters for full-text search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchParams {
    pub publication_url: String,
    pub query: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /post` — a single post by slug.
pub fn get_post(params: &PostParams) -> ApiRequest {
    ApiRequest {
        name: "get_post",
        path: "/post",
        params: vec![
            ("publication_url", params.publication_url.clone()),
            ("slug", params.slug.clone()),
        ],
    }
}

/// `GET /posts/latest` — newest posts first.
pub fn latest_posts(params: &ListParams) -> ApiRequest {
    listing("latest_posts", "/posts/latest", params)
}

/// `GET /posts/top` — most-liked posts first.
pub fn top_posts(params: &ListParams) -> ApiRequest {
    listing("top_posts", "/posts/top", params)
}

/// `GET /posts/search` — posts matching a query string.
pub fn search_posts(params: &SearchParams) -> ApiRequest {
    ApiRequest {
        name: "search_posts",
        path: "/posts/search",
        params: vec![
            ("publication_url", params.publication_url.clone()),
            ("query", params.query.clone()),
            ("limit", params.limit.unwrap_or(DEFAULT_LIMIT).to_string()),
            ("offset", params.offset.unwrap_or(DEFAULT_OFFSET).to_string()),
        ],
    }
}

fn listing(name: &'static str, path: &'static str, params: &ListParams) -> ApiRequest {
    ApiRequest {
        name,
        path,
        params: vec![
            ("publication_url", params.publication_url.clone()),
            ("limit", params.limit.unwrap_or(DEFAULT_LIMIT).to_string()),
            ("offset", params.offset.unwrap_or(DEFAULT_OFFSET).to_string()),
        ],
    }
}
