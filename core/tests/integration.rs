//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test boots its own mock server on an ephemeral port and drives the
//! client over real HTTP, asserting on what actually went out on the wire
//! (recorded query strings, headers, per-route hit counts) and on what came
//! back through the query layer.

use std::sync::Arc;

use mock_server::{sample_post, Db, ServerState};
use substack_core::{
    endpoints, ApiError, ApiRequest, ClientOptions, ConfigStore, ConfigUpdate, ConnectionConfig,
    Executor, ListParams, Post, PostParams, SearchParams, SubstackClient,
};
use tokio::sync::RwLock;

async fn spawn_server(state: ServerState) -> (String, Db) {
    let db: Db = Arc::new(RwLock::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with(listener, db.clone()));
    (format!("http://{addr}"), db)
}

fn publication_state() -> ServerState {
    ServerState::new().seed(
        "blog.example.com",
        vec![
            sample_post("newest", 5),
            sample_post("middle", 50),
            sample_post("oldest", 20),
        ],
    )
}

fn client_for(base_url: &str) -> SubstackClient {
    SubstackClient::new(ClientOptions {
        api_url: Some(base_url.to_string()),
        ..Default::default()
    })
}

#[tokio::test]
async fn get_post_unwraps_the_envelope() {
    let (base_url, _db) = spawn_server(publication_state()).await;
    let client = client_for(&base_url);

    let post = client
        .get_post(PostParams {
            publication_url: "blog.example.com".to_string(),
            slug: "middle".to_string(),
        })
        .resolve()
        .await
        .unwrap();

    assert_eq!(post.slug, "middle");
    assert_eq!(post.likes, 50);
    assert_eq!(post.title, "Title of middle");
    assert_eq!(post.cover_image.og, "https://img.example.com/middle/og.png");
}

#[tokio::test]
async fn omitted_paging_goes_out_with_defaults() {
    let (base_url, db) = spawn_server(publication_state()).await;
    let client = client_for(&base_url);

    let posts = client
        .latest_posts(ListParams::new("blog.example.com"))
        .resolve()
        .await
        .unwrap();
    assert_eq!(posts.len(), 3);

    let state = db.read().await;
    let query = state.last_query.as_deref().unwrap();
    assert!(query.contains("limit=10"), "got {query}");
    assert!(query.contains("offset=0"), "got {query}");
}

#[tokio::test]
async fn explicit_zero_limit_is_preserved_on_the_wire() {
    let (base_url, db) = spawn_server(publication_state()).await;
    let client = client_for(&base_url);

    let posts = client
        .latest_posts(ListParams {
            publication_url: "blog.example.com".to_string(),
            limit: Some(0),
            offset: None,
        })
        .resolve()
        .await
        .unwrap();
    assert!(posts.is_empty());

    let state = db.read().await;
    let query = state.last_query.as_deref().unwrap();
    assert!(query.contains("limit=0"), "got {query}");
}

#[tokio::test]
async fn api_key_is_attached_only_when_configured() {
    let (base_url, db) = spawn_server(publication_state()).await;

    // no key configured: header absent
    let client = client_for(&base_url);
    client
        .latest_posts(ListParams::new("blog.example.com"))
        .resolve()
        .await
        .unwrap();
    assert_eq!(db.read().await.last_api_key, None);

    // key set through a partial update: attached on the next request
    client.set_config(ConfigUpdate {
        api_key: Some("secret".to_string()),
        ..Default::default()
    });
    client
        .top_posts(ListParams::new("blog.example.com"))
        .resolve()
        .await
        .unwrap();
    assert_eq!(db.read().await.last_api_key.as_deref(), Some("secret"));
}

#[tokio::test]
async fn a_new_client_sends_its_own_key_and_ignores_the_old_cache() {
    let (base_url, db) = spawn_server(publication_state()).await;
    let params = ListParams::new("blog.example.com");

    let first = SubstackClient::new(ClientOptions {
        api_url: Some(base_url.clone()),
        api_key: Some("k1".to_string()),
        ..Default::default()
    });
    first.latest_posts(params.clone()).resolve().await.unwrap();
    assert_eq!(db.read().await.last_api_key.as_deref(), Some("k1"));

    let second = SubstackClient::new(ClientOptions {
        api_url: Some(base_url),
        api_key: Some("k2".to_string()),
        ..Default::default()
    });
    second.latest_posts(params).resolve().await.unwrap();

    let state = db.read().await;
    assert_eq!(state.last_api_key.as_deref(), Some("k2"));
    // identical params, but the fresh instance did not reuse the old entry
    assert_eq!(state.hit_count("latest"), 2);
}

#[tokio::test]
async fn identical_concurrent_queries_hit_the_network_once() {
    let (base_url, db) = spawn_server(publication_state()).await;
    let client = client_for(&base_url);
    let params = ListParams {
        publication_url: "blog.example.com".to_string(),
        limit: Some(5),
        offset: Some(0),
    };

    let first = client.top_posts(params.clone());
    let second = client.top_posts(params);

    let a = first.resolve().await.unwrap();
    let b = second.resolve().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(db.read().await.hit_count("top"), 1);
}

#[tokio::test]
async fn http_404_surfaces_as_a_settled_error() {
    let (base_url, _db) = spawn_server(publication_state()).await;
    let client = client_for(&base_url);

    let query = client.get_post(PostParams {
        publication_url: "blog.example.com".to_string(),
        slug: "missing".to_string(),
    });

    let err = query.clone().resolve().await.unwrap_err();
    match &err {
        ApiError::Http { status, body } => {
            assert_eq!(*status, 404);
            assert_eq!(body, "post not found");
        }
        other => panic!("expected Http error, got {other:?}"),
    }

    // the settled snapshot reports the error, not loading
    let state = query.state();
    assert!(!state.is_loading());
    assert!(state.data().is_none());
    assert_eq!(state.error().and_then(ApiError::status), Some(404));
}

#[tokio::test]
async fn unauthorized_key_surfaces_as_401() {
    let state = publication_state().require_api_key("k2");
    let (base_url, _db) = spawn_server(state).await;

    let client = SubstackClient::new(ClientOptions {
        api_url: Some(base_url),
        api_key: Some("wrong".to_string()),
        ..Default::default()
    });

    let err = client
        .latest_posts(ListParams::new("blog.example.com"))
        .resolve()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn reconfiguring_the_host_partitions_the_cache() {
    let (base_a, db_a) = spawn_server(
        ServerState::new().seed("blog.example.com", vec![sample_post("from-a", 1)]),
    )
    .await;
    let (base_b, db_b) = spawn_server(
        ServerState::new().seed("blog.example.com", vec![sample_post("from-b", 1)]),
    )
    .await;

    let client = client_for(&base_a);
    let params = ListParams::new("blog.example.com");

    let posts = client.latest_posts(params.clone()).resolve().await.unwrap();
    assert_eq!(posts[0].slug, "from-a");

    client.set_config(ConfigUpdate {
        api_url: Some(base_b),
        ..Default::default()
    });

    // same params, new scope: the old entry is not served
    let posts = client.latest_posts(params).resolve().await.unwrap();
    assert_eq!(posts[0].slug, "from-b");
    assert_eq!(db_a.read().await.hit_count("latest"), 1);
    assert_eq!(db_b.read().await.hit_count("latest"), 1);
}

#[tokio::test]
async fn requests_settle_under_the_scope_they_were_issued_for() {
    let (base_a, db_a) = spawn_server(
        ServerState::new().seed("blog.example.com", vec![sample_post("from-a", 1)]),
    )
    .await;
    let (base_b, db_b) = spawn_server(
        ServerState::new().seed("blog.example.com", vec![sample_post("from-b", 1)]),
    )
    .await;

    let client = client_for(&base_a);
    let params = ListParams::new("blog.example.com");

    // issue against A, then repoint the host before the fetch is awaited
    let query = client.latest_posts(params.clone());
    client.set_config(ConfigUpdate {
        api_url: Some(base_b),
        ..Default::default()
    });

    // the in-flight request still goes to A, where it was issued
    let posts = query.resolve().await.unwrap();
    assert_eq!(posts[0].slug, "from-a");
    assert_eq!(db_a.read().await.hit_count("latest"), 1);
    assert_eq!(db_b.read().await.hit_count("latest"), 0);

    // switching back to A serves A's cached entry, never B's data
    client.set_config(ConfigUpdate {
        api_url: Some(base_a),
        ..Default::default()
    });
    let posts = client.latest_posts(params).resolve().await.unwrap();
    assert_eq!(posts[0].slug, "from-a");
    assert_eq!(db_a.read().await.hit_count("latest"), 1);
}

#[tokio::test]
async fn search_round_trips_the_query_parameter() {
    let (base_url, db) = spawn_server(publication_state()).await;
    let client = client_for(&base_url);

    let posts = client
        .search_posts(SearchParams {
            publication_url: "blog.example.com".to_string(),
            query: "Title of oldest".to_string(),
            limit: None,
            offset: None,
        })
        .resolve()
        .await
        .unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].slug, "oldest");
    let state = db.read().await;
    let query = state.last_query.as_deref().unwrap();
    assert!(query.contains("query=Title%20of%20oldest") || query.contains("query=Title+of+oldest"),
        "query parameter not encoded as expected: {query}");
}

#[tokio::test]
async fn mismatched_payload_shape_is_a_parse_error() {
    let (base_url, _db) = spawn_server(publication_state()).await;
    let store = ConfigStore::new(ConnectionConfig {
        api_url: base_url,
        api_key: String::new(),
        publication_url: String::new(),
    });
    let executor = Executor::new(store);

    // /post returns Envelope<Post>; asking for a list must fail to parse
    let request: ApiRequest = endpoints::get_post(&PostParams {
        publication_url: "blog.example.com".to_string(),
        slug: "middle".to_string(),
    });
    let err = executor.execute::<Vec<Post>>(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"));
    let err = client
        .latest_posts(ListParams::new("blog.example.com"))
        .resolve()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}
