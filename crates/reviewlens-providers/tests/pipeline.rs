//! End-to-end pipeline runs against mocked provider HTTP endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use reviewlens_core::{ErrorKind, Identifier, ProviderKind, ReviewPeriod};
use reviewlens_providers::{
    GooglePlacesLookup, GooglePlacesProvider, OutscraperProvider, PlaceResolver, ReviewPipeline,
    ReviewProvider, RetryPolicy,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client, settings, TEST_KEY};

fn build(server: &MockServer) -> ReviewPipeline {
    let lookup = GooglePlacesLookup::new(client(), TEST_KEY, RetryPolicy::no_retry())
        .with_base_url(server.uri());
    let providers: Vec<Arc<dyn ReviewProvider>> = vec![
        Arc::new(
            OutscraperProvider::new(client(), Some(TEST_KEY.to_owned()), settings())
                .with_base_url(server.uri()),
        ),
        Arc::new(
            GooglePlacesProvider::new(client(), Some(TEST_KEY.to_owned()), settings())
                .with_base_url(server.uri()),
        ),
    ];
    ReviewPipeline::new(
        PlaceResolver::new(Some(Arc::new(lookup))),
        providers,
        Duration::from_secs(10),
    )
}

#[tokio::test]
async fn outscraper_outage_falls_back_to_places() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/findplacefromtext/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"place_id": "ChIJjoe", "name": "Joe's Pizza"}],
            "status": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maps/reviews-v3"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/places/ChIJjoe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ChIJjoe",
            "reviews": [
                {"text": {"text": "Crisp crust"}},
                {"text": {"text": "Crisp crust"}},
                {"text": {"text": "Cash only"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = build(&server)
        .resolve_and_fetch("Joe's Pizza, Carmine St", ReviewPeriod::All)
        .await
        .expect("places fallback");

    assert_eq!(fetch.identifier, Some(Identifier::PlaceId("ChIJjoe".into())));
    assert_eq!(fetch.display_name.as_deref(), Some("Joe's Pizza"));
    assert_eq!(fetch.provider, ProviderKind::GooglePlaces);
    assert_eq!(fetch.reviews, vec!["Crisp crust", "Cash only"]);
    assert_eq!(fetch.attempts.len(), 3);
    assert!(fetch.attempts[..2].iter().all(|a| !a.succeeded));
}

#[tokio::test]
async fn every_provider_down_is_aggregate_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/reviews-v3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/places/ChIJabc123"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/places:searchText"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = build(&server)
        .resolve_and_fetch("https://maps.google.com/?place_id=ChIJabc123", ReviewPeriod::Days60)
        .await
        .expect_err("all down");

    assert_eq!(err.kind(), ErrorKind::ProviderError);
    assert_eq!(err.attempts().len(), 4);

    let lookups = server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter(|r| r.url.path().contains("findplacefromtext"))
        .count();
    assert_eq!(lookups, 0);
}
