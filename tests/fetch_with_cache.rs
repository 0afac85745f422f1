//! Integration tests for the cached API client
//!
//! Runs `ApiClient` against a mock HTTP server with a manual clock, so
//! freshness and throttle windows are exercised without sleeping.

use catalog_admin::api::{
    AnalyticsView, ApiClient, ApiError, RequestOptions, Resource, StaticToken,
};
use catalog_admin::cache::{ManualClock, RequestCache};
use catalog_admin::config::{ApiConfig, CacheConfig};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PRODUCTS: &str = "/api/public/productos";

/// Helper to build a client against `server` with a controllable clock
fn create_test_client(
    server: &ServerGuard,
    config: CacheConfig,
    token: Option<&str>,
) -> (ApiClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let cache = RequestCache::with_clock(config, clock.clone());
    let tokens = match token {
        Some(t) => StaticToken::new(t),
        None => StaticToken::none(),
    };
    let client = ApiClient::new(
        &ApiConfig::new(server.url()),
        Arc::new(Mutex::new(cache)),
        Arc::new(tokens),
    );
    (client, clock)
}

fn products_body() -> String {
    json!([
        {"_id": "p1", "name": "Soda cáustica"},
        {"_id": "p2", "name": "Ácido cítrico"}
    ])
    .to_string()
}

#[tokio::test]
async fn test_second_fetch_within_a_second_is_served_from_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(products_body())
        .expect(1)
        .create_async()
        .await;
    let (client, clock) = create_test_client(&server, CacheConfig::default(), None);

    let first = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .expect("first fetch should succeed");
    clock.advance(Duration::from_millis(900));
    let second = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .expect("second fetch should succeed");

    mock.assert_async().await;
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_entry_is_refetched_and_replaced() {
    let mut server = Server::new_async().await;
    let old = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(r#"[{"_id":"p1"}]"#)
        .expect(1)
        .create_async()
        .await;
    let (client, clock) = create_test_client(&server, CacheConfig::default(), None);

    client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();

    // Past the throttle window but still fresh: no request
    clock.advance(Duration::from_secs(31));
    let cached = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();
    assert_eq!(cached, Some(json!([{"_id": "p1"}])));
    old.assert_async().await;
    old.remove_async().await;

    let new = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(r#"[{"_id":"p1"},{"_id":"p2"}]"#)
        .expect(1)
        .create_async()
        .await;

    clock.advance(Duration::from_secs(5 * 60));
    let refreshed = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();

    new.assert_async().await;
    assert_eq!(refreshed, Some(json!([{"_id": "p1"}, {"_id": "p2"}])));
    let key = client.url(PRODUCTS);
    assert_eq!(
        client.cache().lock().unwrap().get(&key),
        Some(json!([{"_id": "p1"}, {"_id": "p2"}]))
    );
}

#[tokio::test]
async fn test_throttled_miss_returns_none_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(products_body())
        .expect(1)
        .create_async()
        .await;
    // Entries expire before the throttle window opens
    let config = CacheConfig {
        cache_duration: Duration::from_secs(10),
        min_fetch_interval: Duration::from_secs(30),
    };
    let (client, clock) = create_test_client(&server, config, None);

    client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(15));

    let throttled = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .expect("a throttled miss is not an error");

    mock.assert_async().await;
    assert!(throttled.is_none());
}

#[tokio::test]
async fn test_cached_null_body_is_a_miss() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body("null")
        .expect(2)
        .create_async()
        .await;
    let (client, clock) = create_test_client(&server, CacheConfig::default(), None);

    let first = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .expect("a null body is valid JSON");
    assert_eq!(first, Some(serde_json::Value::Null));

    // Still fresh, but a null entry does not short-circuit; the throttle applies
    clock.advance(Duration::from_secs(1));
    let throttled = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();
    assert!(throttled.is_none());

    clock.advance(Duration::from_secs(30));
    client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_does_not_throttle_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(2)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    for _ in 0..2 {
        let err = client
            .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
            .await
            .expect_err("503 should be an error");
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "Service Unavailable");
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    mock.assert_async().await;
    let key = client.url(PRODUCTS);
    let cache = client.cache().lock().unwrap();
    assert!(cache.is_empty());
    assert!(cache.can_fetch(&key, false));
}

#[tokio::test]
async fn test_failed_refetch_keeps_previous_entry() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(r#"{"foo":1}"#)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();
    ok.remove_async().await;

    let failing = server
        .mock("GET", PRODUCTS)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let result = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), true)
        .await;

    failing.assert_async().await;
    assert_eq!(result.unwrap_err().status(), Some(500));
    let key = client.url(PRODUCTS);
    assert_eq!(client.cache().lock().unwrap().get(&key), Some(json!({"foo": 1})));
}

#[tokio::test]
async fn test_network_error_is_propagated_and_not_cached() {
    let cache = Arc::new(Mutex::new(RequestCache::new(CacheConfig::default())));
    // Nothing listens on the discard port
    let client = ApiClient::new(
        &ApiConfig::new("http://127.0.0.1:9"),
        cache.clone(),
        Arc::new(StaticToken::none()),
    );

    let result = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await;

    assert!(matches!(result, Err(ApiError::Network(_))));
    let cache = cache.lock().unwrap();
    assert!(cache.is_empty());
    assert!(cache.can_fetch(&client.url(PRODUCTS), false));
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    let result = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await;

    assert!(matches!(result, Err(ApiError::Decode(_))));
    let key = client.url(PRODUCTS);
    let cache = client.cache().lock().unwrap();
    assert!(cache.is_empty());
    assert!(cache.can_fetch(&key, false));
}

#[tokio::test]
async fn test_force_refetches_fresh_entry() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(r#"{"version":1}"#)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();
    first.remove_async().await;

    let second = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(r#"{"version":2}"#)
        .expect(1)
        .create_async()
        .await;

    let forced = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), true)
        .await
        .unwrap();

    second.assert_async().await;
    assert_eq!(forced, Some(json!({"version": 2})));
    let key = client.url(PRODUCTS);
    assert_eq!(client.cache().lock().unwrap().get(&key), Some(json!({"version": 2})));
}

#[tokio::test]
async fn test_clear_cache_allows_immediate_refetch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(products_body())
        .expect(2)
        .create_async()
        .await;
    let (client, clock) = create_test_client(&server, CacheConfig::default(), None);

    client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(1));
    client.clear_cache();
    client.clear_cache();

    let again = client
        .fetch_with_cache(PRODUCTS, &RequestOptions::get(), false)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(again.is_some());
}

#[tokio::test]
async fn test_standard_and_caller_headers_are_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .match_header("content-type", "application/json")
        .match_header("accept", "application/vnd.catalog+json")
        .match_header("x-site", "site2")
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    let options = RequestOptions::get()
        .header("Accept", "application/vnd.catalog+json")
        .header("X-Site", "site2");
    let data = client.fetch_with_cache(PRODUCTS, &options, false).await.unwrap();

    mock.assert_async().await;
    assert_eq!(data, Some(json!([])));
}

#[tokio::test]
async fn test_concurrent_misses_both_reach_the_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PRODUCTS)
        .with_status(200)
        .with_body(products_body())
        .expect(2)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    let options = RequestOptions::get();
    let (a, b) = tokio::join!(
        client.fetch_with_cache(PRODUCTS, &options, false),
        client.fetch_with_cache(PRODUCTS, &options, false),
    );

    mock.assert_async().await;
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(client.cache().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_catalog_lists_every_resource() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for (resource, body) in [
        (Resource::Products, r#"[{"_id":"p1"},{"_id":"p2"}]"#),
        (Resource::Categories, r#"[{"_id":"c1"}]"#),
        (Resource::Presentations, r#"[]"#),
        (Resource::Banners, r#"[{"_id":"b1"}]"#),
    ] {
        mocks.push(
            server
                .mock("GET", resource.list_path().as_str())
                .with_status(200)
                .with_body(body)
                .expect(1)
                .create_async()
                .await,
        );
    }
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), None);

    let catalog = client.fetch_catalog(false).await.unwrap();

    for mock in &mocks {
        mock.assert_async().await;
    }
    let counts: Vec<(Resource, usize)> = catalog
        .iter()
        .map(|(r, data)| (*r, data.as_ref().unwrap().as_array().unwrap().len()))
        .collect();
    assert_eq!(
        counts,
        vec![
            (Resource::Products, 2),
            (Resource::Categories, 1),
            (Resource::Presentations, 0),
            (Resource::Banners, 1),
        ]
    );
}

#[tokio::test]
async fn test_analytics_sends_bearer_token_when_available() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/analytics/quimicaindustrial/overview")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body(r#"{"visits":120}"#)
        .expect(1)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), Some("secret"));

    let view = AnalyticsView::Overview {
        site: "quimicaindustrial".to_string(),
    };
    let data = client.fetch_analytics(&view, false).await.unwrap();
    let cached = client.fetch_analytics(&view, false).await.unwrap();

    mock.assert_async().await;
    assert_eq!(data, Some(json!({"visits": 120})));
    assert_eq!(cached, data);
}

#[tokio::test]
async fn test_create_sends_authenticated_json_and_clears_cache() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/public/categorias")
        .with_status(200)
        .with_body(r#"[{"_id":"c1","name":"Solventes"}]"#)
        .expect(2)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/categorias/nueva")
        .match_header("authorization", "Bearer admin-token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"name": "Ácidos"})))
        .with_status(201)
        .with_body(r#"{"_id":"c2","name":"Ácidos"}"#)
        .expect(1)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), Some("admin-token"));

    client.fetch_resource(Resource::Categories, false).await.unwrap();
    let created = client
        .create(Resource::Categories, json!({"name": "Ácidos"}))
        .await
        .unwrap();
    assert!(client.cache().lock().unwrap().is_empty());

    // Cleared, so the next read goes to the network despite the throttle
    client.fetch_resource(Resource::Categories, false).await.unwrap();

    create.assert_async().await;
    list.assert_async().await;
    assert_eq!(created, json!({"_id": "c2", "name": "Ácidos"}));
}

#[tokio::test]
async fn test_update_and_delete_use_item_paths() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", "/api/productos/p1")
        .match_header("authorization", "Bearer t")
        .with_status(200)
        .with_body(r#"{"_id":"p1","name":"Soda"}"#)
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/banners/b9")
        .match_header("authorization", "Bearer t")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), Some("t"));

    let updated = client
        .update(Resource::Products, "p1", json!({"name": "Soda"}))
        .await
        .unwrap();
    let deleted = client.delete(Resource::Banners, "b9").await.unwrap();

    update.assert_async().await;
    delete.assert_async().await;
    assert_eq!(updated["name"], "Soda");
    assert_eq!(deleted, serde_json::Value::Null);
}

#[tokio::test]
async fn test_rejected_write_keeps_cache() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", "/api/public/banners")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let _denied = server
        .mock("DELETE", "/api/banners/b1")
        .with_status(401)
        .with_body("Unauthorized")
        .create_async()
        .await;
    let (client, _clock) = create_test_client(&server, CacheConfig::default(), Some("expired"));

    client.fetch_resource(Resource::Banners, false).await.unwrap();
    let err = client.delete(Resource::Banners, "b1").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(client.cache().lock().unwrap().len(), 1);
}
