//! Geocoding fallback chain against mock provider servers.

use movie_store::adapters::outbound::{
    build_http_client, build_provider_chain, ProviderChainSettings,
};
use movie_store::infrastructure::{CircuitBreaker, RateLimitConfig, RateLimiter};
use movie_store::{Coordinate, GeoResolver, GeocodingResolver, LocationQuery};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Servers {
    opencage: MockServer,
    positionstack: MockServer,
    nominatim: MockServer,
}

impl Servers {
    async fn start() -> Self {
        Self {
            opencage: MockServer::start().await,
            positionstack: MockServer::start().await,
            nominatim: MockServer::start().await,
        }
    }

    fn settings(&self, with_keys: bool) -> ProviderChainSettings {
        ProviderChainSettings {
            opencage_key: with_keys.then(|| "oc-key".to_string()),
            positionstack_key: with_keys.then(|| "ps-key".to_string()),
            opencage_url: self.opencage.uri(),
            positionstack_url: self.positionstack.uri(),
            nominatim_url: self.nominatim.uri(),
        }
    }
}

fn resolver(settings: &ProviderChainSettings, delay: Duration) -> GeocodingResolver {
    let client = build_http_client("MovieStore/1.0", Duration::from_secs(5)).unwrap();
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig { min_interval: delay }));
    GeocodingResolver::new(
        build_provider_chain(&client, settings, limiter),
        Arc::new(CircuitBreaker::default()),
    )
}

#[tokio::test]
async fn test_first_provider_hit_stops_chain() {
    let servers = Servers::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Atlanta, GA, USA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"geometry": {"lat": 33.749, "lng": -84.388}}]
        })))
        .expect(1)
        .mount(&servers.opencage)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&servers.positionstack)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&servers.nominatim)
        .await;

    let r = resolver(&servers.settings(true), Duration::from_millis(10));
    let query = LocationQuery::new("Atlanta").with_state("GA").with_country("USA");

    assert_eq!(r.resolve(&query).await, Some(Coordinate::new(33.749, -84.388)));
}

#[tokio::test]
async fn test_falls_back_through_all_providers() {
    let servers = Servers::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&servers.opencage)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forward"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&servers.positionstack)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Springfield"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"lat": "39.78", "lon": "-89.65"}])),
        )
        .expect(1)
        .mount(&servers.nominatim)
        .await;

    let r = resolver(&servers.settings(true), Duration::from_millis(10));

    assert_eq!(
        r.resolve(&LocationQuery::new("Springfield")).await,
        Some(Coordinate::new(39.78, -89.65))
    );
}

#[tokio::test]
async fn test_without_keys_only_nominatim_after_delay() {
    let servers = Servers::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&servers.opencage)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&servers.positionstack)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"lat": "48.85", "lon": "2.35"}])),
        )
        .expect(1)
        .mount(&servers.nominatim)
        .await;

    let r = resolver(&servers.settings(false), Duration::from_secs(1));
    assert_eq!(r.provider_names(), vec!["nominatim"]);

    let start = Instant::now();
    let result = r.resolve(&LocationQuery::new("Paris").with_country("France")).await;

    assert_eq!(result, Some(Coordinate::new(48.85, 2.35)));
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_malformed_and_empty_responses_yield_none() {
    let servers = Servers::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&servers.opencage)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"label": "no coordinates"}]})),
        )
        .mount(&servers.positionstack)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&servers.nominatim)
        .await;

    let r = resolver(&servers.settings(true), Duration::from_millis(10));

    assert_eq!(r.resolve(&LocationQuery::new("Atlantis")).await, None);
}

#[tokio::test]
async fn test_missing_geometry_falls_through() {
    let servers = Servers::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": [{"formatted": "x"}]})),
        )
        .expect(1)
        .mount(&servers.opencage)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"latitude": 1.5, "longitude": 2.5}]
        })))
        .expect(1)
        .mount(&servers.positionstack)
        .await;

    let r = resolver(&servers.settings(true), Duration::from_millis(10));

    assert_eq!(
        r.resolve(&LocationQuery::new("Somewhere")).await,
        Some(Coordinate::new(1.5, 2.5))
    );
}

#[tokio::test]
async fn test_empty_city_makes_no_requests() {
    let servers = Servers::start().await;

    for server in [&servers.opencage, &servers.positionstack, &servers.nominatim] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    let r = resolver(&servers.settings(true), Duration::from_millis(10));
    let query = LocationQuery::new("").with_state("GA").with_country("USA");

    assert_eq!(r.resolve(&query).await, None);
}
