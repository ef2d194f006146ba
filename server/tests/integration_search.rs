use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sift_core::bsbi::Bsbi;
use sift_core::collection::MemoryCollection;
use sift_core::frequency::FrequencyIndexer;
use sift_core::presence::PresenceIndexer;
use sift_core::weighting::Weighting;
use sift_core::Encoding;
use tempfile::{tempdir, TempDir};

fn animals() -> MemoryCollection {
    MemoryCollection::new()
        .with_block("b0", [("d0", "cat dog")])
        .with_block("b1", [("d1", "dog")])
        .with_block("b2", [("d2", "cat cat bird")])
}

fn presence_app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    Bsbi::new(PresenceIndexer, dir.path(), Encoding::Vbe).construct(&animals()).unwrap();
    let app = server::build_app(dir.path(), Weighting::default()).unwrap();
    (dir, app)
}

fn frequency_app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    Bsbi::new(FrequencyIndexer, dir.path(), Encoding::Plain).construct(&animals()).unwrap();
    let app = server::build_app(dir.path(), Weighting::default()).unwrap();
    (dir, app)
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = tower::ServiceExt::oneshot(app, req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn names(json: &Value) -> Vec<&str> {
    json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_ok() {
    let (_dir, app) = presence_app();
    let (status, body) = call(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn boolean_search_over_a_presence_index() {
    let (_dir, app) = presence_app();
    let (status, body) = call(app, "/search?q=cat+-dog+%7C+bird").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["engine"], "presence");
    assert_eq!(json["query"], "( cat AND NOT dog ) OR bird");
    assert_eq!(json["total_hits"], 1);
    assert_eq!(names(&json), vec!["d2"]);
    assert!(json["results"][0].get("score").is_none());
}

#[tokio::test]
async fn k_limits_boolean_hits() {
    let (_dir, app) = presence_app();
    let (_, body) = call(app, "/search?q=cat&k=1").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 2);
    assert_eq!(names(&json), vec!["d0"]);
}

#[tokio::test]
async fn malformed_boolean_query_is_a_bad_request() {
    let (_dir, app) = presence_app();
    let (status, body) = call(app, "/search?q=cat+%7C+%7C+dog").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("empty clause"));
}

#[tokio::test]
async fn vector_search_over_a_frequency_index() {
    let (_dir, app) = frequency_app();
    let (status, body) = call(app, "/search?q=Cats&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["engine"], "frequency");
    assert_eq!(json["query"], "cat");
    assert_eq!(names(&json), vec!["d2", "d0"]);
    let first = json["results"][0]["score"].as_f64().unwrap();
    let second = json["results"][1]["score"].as_f64().unwrap();
    assert!(first > second);
}

#[tokio::test]
async fn k_limits_ranked_hits_but_not_their_count() {
    let (_dir, app) = frequency_app();
    let (_, body) = call(app, "/search?q=dog&k=1").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}
