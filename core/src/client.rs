//! Composition root: one configuration store, one executor, one cache per
//! endpoint, wired together as a clonable handle.
//!
//! # Design
//! `SubstackClient::new` creates a fresh `ConfigStore` and seeds it with the
//! caller's options *before* the client value exists, so no consumer can
//! observe placeholder configuration. Constructing a new client for new
//! options discards the previous instance's caches wholesale; nothing
//! migrates. The client is the capability handed to consumers — query
//! invocation plus configuration update — with no coupling to any UI layer.

use crate::config::{ConfigStore, ConfigUpdate, ConnectionConfig};
use crate::endpoints::{self, ListParams, PostParams, SearchParams};
use crate::http::Executor;
use crate::query::{Query, QueryCache, Tag};
use crate::types::Post;

/// Construction options. Unset fields fall back to the defaults: the fixed
/// fallback host, empty key, empty publication.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub publication_url: Option<String>,
}

impl ClientOptions {
    /// Read options from `SUBSTACK_API_URL`, `SUBSTACK_API_KEY` and
    /// `SUBSTACK_PUBLICATION_URL`. Unset variables stay unset.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("SUBSTACK_API_URL").ok(),
            api_key: std::env::var("SUBSTACK_API_KEY").ok(),
            publication_url: std::env::var("SUBSTACK_PUBLICATION_URL").ok(),
        }
    }
}

/// Client for the Substack read API.
///
/// Cheap to clone; clones share the configuration store and caches. Each
/// query method registers the request with the endpoint's cache and returns
/// a [`Query`] handle immediately — identical concurrent calls coalesce
/// into one network request.
#[derive(Debug, Clone)]
pub struct SubstackClient {
    config: ConfigStore,
    executor: Executor,
    post_cache: QueryCache<PostParams, Post>,
    latest_cache: QueryCache<ListParams, Vec<Post>>,
    top_cache: QueryCache<ListParams, Vec<Post>>,
    search_cache: QueryCache<SearchParams, Vec<Post>>,
}

impl SubstackClient {
    /// Build a client with a fresh, isolated store seeded from `options`.
    pub fn new(options: ClientOptions) -> Self {
        let config = ConfigStore::default();
        config.set(ConfigUpdate {
            api_url: options.api_url,
            api_key: options.api_key,
            publication_url: options.publication_url,
        });
        let executor = Executor::new(config.clone());
        Self {
            config,
            executor,
            post_cache: QueryCache::new(Tag::Post),
            latest_cache: QueryCache::new(Tag::LatestPosts),
            top_cache: QueryCache::new(Tag::TopPosts),
            search_cache: QueryCache::new(Tag::SearchPosts),
        }
    }

    /// Snapshot of the current connection configuration.
    pub fn config(&self) -> ConnectionConfig {
        self.config.get()
    }

    /// Merge a partial configuration update into the store. Takes effect on
    /// the next executed request; in-flight requests are not cancelled.
    pub fn set_config(&self, update: ConfigUpdate) {
        self.config.set(update);
    }

    /// Fetch a single post by slug.
    pub fn get_post(&self, params: PostParams) -> Query<Post> {
        let request = endpoints::get_post(&params);
        let executor = self.executor.clone();
        // the base URL is resolved once here and doubles as the cache
        // scope, so the fetch settles under the scope it was issued for
        // even if the host is reconfigured before the task runs
        let scope = self.executor.effective_base_url();
        let base = scope.clone();
        self.post_cache.fetch(&scope, params, move || async move {
            Ok(executor.execute_at::<Post>(&base, &request).await?.data)
        })
    }

    /// Fetch the newest posts of a publication.
    pub fn latest_posts(&self, params: ListParams) -> Query<Vec<Post>> {
        let request = endpoints::latest_posts(&params);
        let executor = self.executor.clone();
        let scope = self.executor.effective_base_url();
        let base = scope.clone();
        self.latest_cache.fetch(&scope, params, move || async move {
            Ok(executor.execute_at::<Vec<Post>>(&base, &request).await?.data)
        })
    }

    /// Fetch the most-liked posts of a publication.
    pub fn top_posts(&self, params: ListParams) -> Query<Vec<Post>> {
        let request = endpoints::top_posts(&params);
        let executor = self.executor.clone();
        let scope = self.executor.effective_base_url();
        let base = scope.clone();
        self.top_cache.fetch(&scope, params, move || async move {
            Ok(executor.execute_at::<Vec<Post>>(&base, &request).await?.data)
        })
    }

    /// Search a publication's posts.
    pub fn search_posts(&self, params: SearchParams) -> Query<Vec<Post>> {
        let request = endpoints::search_posts(&params);
        let executor = self.executor.clone();
        let scope = self.executor.effective_base_url();
        let base = scope.clone();
        self.search_cache.fetch(&scope, params, move || async move {
            Ok(executor.execute_at::<Vec<Post>>(&base, &request).await?.data)
        })
    }
}
