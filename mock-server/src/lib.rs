//! In-memory stand-in for the Substack read API host.
//!
//! Serves the four read endpoints with envelope-wrapped responses and
//! records what it received — per-route hit counts, the last `X-API-Key`
//! header, the last raw query string — so integration tests can assert on
//! the wire traffic. State is seedable and shared through the `Db` handle.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

// DTOs are defined independently from the core crate; the core's
// integration tests catch schema drift.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageVariants {
    pub original: String,
    pub small: String,
    pub medium: String,
    pub large: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverImage {
    pub original: String,
    pub small: String,
    pub medium: String,
    pub large: String,
    pub og: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColorPalette {
    pub vibrant: String,
    pub light_vibrant: String,
    pub dark_vibrant: String,
    pub muted: String,
    pub light_muted: String,
    pub dark_muted: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    pub body_html: String,
    pub reading_time_minutes: u32,
    pub audio_url: String,
    pub date: String,
    pub likes: u32,
    pub paywall: bool,
    pub cover_image: CoverImage,
    pub cover_image_color_palette: ColorPalette,
    pub author: String,
    pub author_image: ImageVariants,
}

/// Transport wrapper matching the real API's response shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub status: String,
    #[serde(rename = "endpointName")]
    pub endpoint_name: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "startedTimeStamp")]
    pub started_time_stamp: i64,
    #[serde(rename = "fulfilledTimeStamp")]
    pub fulfilled_time_stamp: i64,
}

/// Server state: seeded posts plus a record of observed traffic.
#[derive(Default)]
pub struct ServerState {
    /// (publication_url, post), in seed order = newest first.
    pub posts: Vec<(String, Post)>,
    pub hits: HashMap<String, u32>,
    pub last_api_key: Option<String>,
    pub last_query: Option<String>,
    /// When set, requests without this exact `X-API-Key` get a 401.
    pub required_api_key: Option<String>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append posts for a publication; earlier seeds are "newer".
    pub fn seed(mut self, publication_url: &str, posts: Vec<Post>) -> Self {
        self.posts
            .extend(posts.into_iter().map(|p| (publication_url.to_string(), p)));
        self
    }

    pub fn require_api_key(mut self, key: &str) -> Self {
        self.required_api_key = Some(key.to_string());
        self
    }

    pub fn hit_count(&self, route: &str) -> u32 {
        self.hits.get(route).copied().unwrap_or(0)
    }
}

pub type Db = Arc<RwLock<ServerState>>;

/// A fully populated post for seeding; derived URLs follow the slug.
pub fn sample_post(slug: &str, likes: u32) -> Post {
    Post {
        slug: slug.to_string(),
        url: format!("https://blog.example.com/p/{slug}"),
        title: format!("Title of {slug}"),
        description: format!("Description of {slug}"),
        excerpt: format!("Excerpt of {slug}"),
        body_html: format!("<p>Body of {slug}</p>"),
        reading_time_minutes: 4,
        audio_url: String::new(),
        date: "2024-05-01T12:00:00.000Z".to_string(),
        likes,
        paywall: false,
        cover_image: CoverImage {
            original: format!("https://img.example.com/{slug}/original.png"),
            small: format!("https://img.example.com/{slug}/small.png"),
            medium: format!("https://img.example.com/{slug}/medium.png"),
            large: format!("https://img.example.com/{slug}/large.png"),
            og: format!("https://img.example.com/{slug}/og.png"),
        },
        cover_image_color_palette: ColorPalette {
            vibrant: "#e63946".to_string(),
            light_vibrant: "#f1aeb5".to_string(),
            dark_vibrant: "#7d1f28".to_string(),
            muted: "#9a8c98".to_string(),
            light_muted: "#c9c1c8".to_string(),
            dark_muted: "#4a4452".to_string(),
        },
        author: "Ada".to_string(),
        author_image: ImageVariants {
            original: "https://img.example.com/ada/original.png".to_string(),
            small: "https://img.example.com/ada/small.png".to_string(),
            medium: "https://img.example.com/ada/medium.png".to_string(),
            large: "https://img.example.com/ada/large.png".to_string(),
        },
    }
}

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(ServerState::new())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/post", get(get_post))
        .route("/posts/latest", get(latest_posts))
        .route("/posts/top", get(top_posts))
        .route("/posts/search", get(search_posts))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

#[derive(Deserialize)]
struct PostQuery {
    publication_url: String,
    slug: String,
}

fn default_limit() -> usize {
    10
}

#[derive(Deserialize)]
struct ListQuery {
    publication_url: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

#[derive(Deserialize)]
struct SearchQuery {
    publication_url: String,
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

type Rejection = (StatusCode, &'static str);

/// Record the request and enforce the required key, when one is set.
async fn record(db: &Db, route: &str, headers: &HeaderMap, raw_query: Option<String>) -> Result<(), Rejection> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut state = db.write().await;
    *state.hits.entry(route.to_string()).or_insert(0) += 1;
    state.last_api_key = api_key.clone();
    state.last_query = raw_query;

    if let Some(required) = &state.required_api_key {
        if api_key.as_deref() != Some(required.as_str()) {
            return Err((StatusCode::UNAUTHORIZED, "invalid api key"));
        }
    }
    Ok(())
}

fn envelope<T: Serialize>(endpoint: &str, data: T) -> Json<Envelope<T>> {
    let now = Utc::now().timestamp_millis();
    Json(Envelope {
        data,
        status: "fulfilled".to_string(),
        endpoint_name: endpoint.to_string(),
        request_id: Uuid::new_v4().to_string(),
        started_time_stamp: now,
        fulfilled_time_stamp: now,
    })
}

async fn get_post(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(q): Query<PostQuery>,
) -> Result<Json<Envelope<Post>>, Rejection> {
    record(&db, "post", &headers, raw).await?;
    let state = db.read().await;
    state
        .posts
        .iter()
        .find(|(publication, post)| *publication == q.publication_url && post.slug == q.slug)
        .map(|(_, post)| envelope("getPost", post.clone()))
        .ok_or((StatusCode::NOT_FOUND, "post not found"))
}

async fn latest_posts(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(q): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Post>>>, Rejection> {
    record(&db, "latest", &headers, raw).await?;
    let state = db.read().await;
    let page: Vec<Post> = state
        .posts
        .iter()
        .filter(|(publication, _)| *publication == q.publication_url)
        .map(|(_, post)| post.clone())
        .skip(q.offset)
        .take(q.limit)
        .collect();
    Ok(envelope("getLatestPosts", page))
}

async fn top_posts(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(q): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Post>>>, Rejection> {
    record(&db, "top", &headers, raw).await?;
    let state = db.read().await;
    let mut posts: Vec<Post> = state
        .posts
        .iter()
        .filter(|(publication, _)| *publication == q.publication_url)
        .map(|(_, post)| post.clone())
        .collect();
    posts.sort_by(|a, b| b.likes.cmp(&a.likes));
    Ok(envelope(
        "getTopPosts",
        posts.into_iter().skip(q.offset).take(q.limit).collect(),
    ))
}

async fn search_posts(
    State(db): State<Db>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Envelope<Vec<Post>>>, Rejection> {
    record(&db, "search", &headers, raw).await?;
    let needle = q.query.to_lowercase();
    let state = db.read().await;
    let page: Vec<Post> = state
        .posts
        .iter()
        .filter(|(publication, post)| {
            *publication == q.publication_url
                && (post.title.to_lowercase().contains(&needle)
                    || post.description.to_lowercase().contains(&needle)
                    || post.excerpt.to_lowercase().contains(&needle))
        })
        .map(|(_, post)| post.clone())
        .skip(q.offset)
        .take(q.limit)
        .collect();
    Ok(envelope("searchPosts", page))
}
