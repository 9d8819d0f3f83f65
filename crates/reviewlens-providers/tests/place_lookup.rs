//! Integration tests for `GooglePlacesLookup` and the `PlaceResolver` built
//! on top of it.

mod common;

use std::sync::Arc;

use reviewlens_core::{ErrorKind, Identifier};
use reviewlens_providers::{
    GooglePlacesLookup, PlaceLookup, PlaceResolver, ProviderError, RetryPolicy,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client, TEST_KEY};

const FIND_PLACE_PATH: &str = "/maps/api/place/findplacefromtext/json";

fn lookup(server: &MockServer) -> GooglePlacesLookup {
    GooglePlacesLookup::new(client(), TEST_KEY, RetryPolicy::no_retry()).with_base_url(server.uri())
}

#[tokio::test]
async fn first_candidate_wins() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FIND_PLACE_PATH))
        .and(query_param("input", "Joe's Pizza Carmine St"))
        .and(query_param("inputtype", "textquery"))
        .and(query_param("fields", "place_id,name"))
        .and(query_param("key", TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"place_id": "ChIJfirst", "name": "Joe's Pizza"},
                {"place_id": "ChIJsecond", "name": "Joe's Pizza Broadway"}
            ],
            "status": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = PlaceResolver::new(Some(Arc::new(lookup(&server))));
    let result = resolver.resolve("Joe's Pizza Carmine St").await;

    assert_eq!(result.identifier, Some(Identifier::PlaceId("ChIJfirst".into())));
    assert_eq!(result.display_name.as_deref(), Some("Joe's Pizza"));
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn zero_results_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FIND_PLACE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"candidates": [], "status": "ZERO_RESULTS"})),
        )
        .mount(&server)
        .await;

    let err = lookup(&server)
        .find_place("qwertyuiop")
        .await
        .expect_err("nothing matches");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn ok_status_with_empty_candidates_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FIND_PLACE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": [], "status": "OK"})))
        .mount(&server)
        .await;

    let resolver = PlaceResolver::new(Some(Arc::new(lookup(&server))));
    let result = resolver.resolve("somewhere").await;
    assert_eq!(result.identifier, None);
    assert_eq!(result.error, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn denied_status_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FIND_PLACE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let err = lookup(&server)
        .find_place("Joe's Pizza")
        .await
        .expect_err("denied");
    assert!(
        matches!(&err, ProviderError::Api { message, .. } if message.starts_with("REQUEST_DENIED")),
        "expected Api error, got: {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::ProviderError);
}

#[tokio::test]
async fn non_json_body_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FIND_PLACE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let resolver = PlaceResolver::new(Some(Arc::new(lookup(&server))));
    let result = resolver.resolve("Joe's Pizza").await;
    assert_eq!(result.identifier, None);
    assert_eq!(result.error, Some(ErrorKind::ProviderError));
}

#[tokio::test]
async fn server_error_is_provider_error_without_leaking_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FIND_PLACE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let err = lookup(&server)
        .find_place("Joe's Pizza")
        .await
        .expect_err("500");
    assert!(matches!(err, ProviderError::UnexpectedStatus { status: 500, .. }));
    assert!(!err.to_string().contains(TEST_KEY));
}
