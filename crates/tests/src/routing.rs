/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::support::*;
use chrono::Utc;
use fleet_tracking_service::common::types::*;
use fleet_tracking_service::routing::cache::{InMemoryRouteCache, RouteCacheStore};
use fleet_tracking_service::routing::polyline::{decode_polyline, encode_polyline};
use fleet_tracking_service::routing::providers::{
    ComputeRoutesResponse, GoogleRoutesAdapter, MapboxAdapter, MapboxResponse, OsrmAdapter,
    OsrmResponse,
};
use fleet_tracking_service::tools::error::AppError;
use std::sync::Arc;

// Reference vector from the format's published documentation.
const REFERENCE_ENCODED: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

fn reference_points() -> Vec<Point> {
    vec![
        point(38.5, -120.2),
        point(40.7, -120.95),
        point(43.252, -126.453),
    ]
}

#[test]
fn polyline_decodes_reference_vector() {
    let decoded = decode_polyline(REFERENCE_ENCODED).expect("valid polyline");
    assert_eq!(decoded, reference_points());
}

#[test]
fn polyline_encodes_reference_vector() {
    assert_eq!(encode_polyline(&reference_points()), REFERENCE_ENCODED);
}

#[test]
fn polyline_round_trips_exactly_at_precision() {
    let points = vec![
        point(4.05, 9.77),
        point(4.06123, 9.78456),
        point(-33.86882, 151.20929),
        point(0.0, 0.0),
        point(-0.00001, 0.00001),
    ];

    let decoded = decode_polyline(&encode_polyline(&points)).expect("valid polyline");
    assert_eq!(decoded, points);
}

#[test]
fn polyline_rejects_truncated_input() {
    // Drop the final byte of a multi-chunk value.
    let mut encoded = encode_polyline(&reference_points());
    encoded.pop();
    assert!(matches!(
        decode_polyline(&encoded),
        Err(AppError::DeserializationError(_))
    ));
}

#[test]
fn osrm_normalization_produces_canonical_route() {
    let payload = format!(
        r#"{{"code":"Ok","routes":[{{"geometry":"{}","distance":1530.4,"duration":321.9}}]}}"#,
        REFERENCE_ENCODED
    );
    let response: OsrmResponse = serde_json::from_str(&payload).expect("valid payload");

    let route = OsrmAdapter::normalize(response, TravelMode::Drive).expect("normalizes");

    assert_eq!(route.provider, RouteProvider::Osrm);
    assert_eq!(route.distance, Meters(1530));
    assert_eq!(route.duration, Seconds(321));
    assert_eq!(route.geometry, reference_points());
    assert_eq!(route.bounding_box.min, point(38.5, -126.453));
    assert_eq!(route.bounding_box.max, point(43.252, -120.2));
}

#[test]
fn osrm_error_status_is_a_provider_error() {
    let payload = r#"{"code":"NoRoute","routes":[]}"#;
    let response: OsrmResponse = serde_json::from_str(payload).expect("valid payload");

    assert!(matches!(
        OsrmAdapter::normalize(response, TravelMode::Drive),
        Err(AppError::ProviderError(_, _))
    ));
}

#[test]
fn google_normalization_parses_suffixed_duration() {
    let payload = format!(
        r#"{{"routes":[{{"distanceMeters":2040,"duration":"318s","polyline":{{"encodedPolyline":"{}"}}}}]}}"#,
        REFERENCE_ENCODED
    );
    let response: ComputeRoutesResponse = serde_json::from_str(&payload).expect("valid payload");

    let route = GoogleRoutesAdapter::normalize(response, TravelMode::Drive).expect("normalizes");

    assert_eq!(route.provider, RouteProvider::GoogleRoutes);
    assert_eq!(route.distance, Meters(2040));
    assert_eq!(route.duration, Seconds(318));
}

#[test]
fn google_distance_falls_back_to_the_leg_breakdown() {
    let payload = format!(
        r#"{{"routes":[{{"duration":"60s","polyline":{{"encodedPolyline":"{}"}},"legs":[{{"distanceMeters":700}},{{"distanceMeters":340}}]}}]}}"#,
        REFERENCE_ENCODED
    );
    let response: ComputeRoutesResponse = serde_json::from_str(&payload).expect("valid payload");

    let route = GoogleRoutesAdapter::normalize(response, TravelMode::Drive).expect("normalizes");

    assert_eq!(route.distance, Meters(1040));
    assert_eq!(route.duration, Seconds(60));
}

#[test]
fn google_empty_routes_is_a_provider_error() {
    let response: ComputeRoutesResponse =
        serde_json::from_str(r#"{"routes":[]}"#).expect("valid payload");

    assert!(matches!(
        GoogleRoutesAdapter::normalize(response, TravelMode::Drive),
        Err(AppError::ProviderError(_, _))
    ));
}

#[test]
fn mapbox_normalization_produces_canonical_route() {
    let payload = format!(
        r#"{{"code":"Ok","routes":[{{"geometry":"{}","distance":988.2,"duration":150.0}}]}}"#,
        REFERENCE_ENCODED
    );
    let response: MapboxResponse = serde_json::from_str(&payload).expect("valid payload");

    let route = MapboxAdapter::normalize(response, TravelMode::Bicycle).expect("normalizes");

    assert_eq!(route.provider, RouteProvider::Mapbox);
    assert_eq!(route.mode, TravelMode::Bicycle);
    assert_eq!(route.distance, Meters(988));
}

#[tokio::test]
async fn identical_requests_hit_the_provider_once() {
    let google = FakeAdapter::new(
        RouteProvider::GoogleRoutes,
        FakeBehavior::Succeed {
            distance: 1500,
            duration: 300,
        },
    );
    let aggregator = build_aggregator(
        FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail),
        google.to_owned(),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let origin = point(4.05, 9.77);
    let destination = point(4.10, 9.82);
    let options = RoutingOptions::default();

    let first = aggregator
        .get_route(&origin, &destination, &options)
        .await
        .expect("first request succeeds");
    let second = aggregator
        .get_route(&origin, &destination, &options)
        .await
        .expect("second request succeeds");

    assert_eq!(google.call_count(), 1);
    assert_eq!(first.distance, second.distance);
    assert_eq!(second.provider, RouteProvider::GoogleRoutes);
}

#[tokio::test]
async fn failed_provider_falls_back_to_the_default() {
    let osrm = FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail);
    let google = FakeAdapter::new(
        RouteProvider::GoogleRoutes,
        FakeBehavior::Succeed {
            distance: 1800,
            duration: 420,
        },
    );
    let aggregator = build_aggregator(
        osrm.to_owned(),
        google.to_owned(),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let route = aggregator
        .get_route(
            &point(4.05, 9.77),
            &point(4.10, 9.82),
            &RoutingOptions {
                provider: Some(RouteProvider::Osrm),
                ..Default::default()
            },
        )
        .await
        .expect("fallback succeeds");

    assert_eq!(osrm.call_count(), 1);
    assert_eq!(google.call_count(), 1);
    assert_eq!(route.provider, RouteProvider::GoogleRoutes);
}

#[tokio::test]
async fn exhausted_providers_surface_routing_unavailable() {
    let aggregator = build_aggregator(
        FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail),
        FakeAdapter::new(RouteProvider::GoogleRoutes, FakeBehavior::Fail),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let result = aggregator
        .get_route(
            &point(4.05, 9.77),
            &point(4.10, 9.82),
            &RoutingOptions {
                provider: Some(RouteProvider::Osrm),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::RoutingUnavailable)));
}

#[tokio::test]
async fn default_provider_failure_is_terminal() {
    let google = FakeAdapter::new(RouteProvider::GoogleRoutes, FakeBehavior::Fail);
    let aggregator = build_aggregator(
        FakeAdapter::new(
            RouteProvider::Osrm,
            FakeBehavior::Succeed {
                distance: 1,
                duration: 1,
            },
        ),
        google.to_owned(),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let result = aggregator
        .get_route(&point(4.05, 9.77), &point(4.10, 9.82), &RoutingOptions::default())
        .await;

    // The default was the requested provider; there is nothing to fall
    // back to.
    assert!(matches!(result, Err(AppError::RoutingUnavailable)));
    assert_eq!(google.call_count(), 1);
}

#[tokio::test]
async fn slow_provider_times_out_and_falls_back() {
    let osrm = FakeAdapter::new(
        RouteProvider::Osrm,
        FakeBehavior::Hang(std::time::Duration::from_millis(500)),
    );
    let google = FakeAdapter::new(
        RouteProvider::GoogleRoutes,
        FakeBehavior::Succeed {
            distance: 900,
            duration: 120,
        },
    );
    let aggregator = build_aggregator(
        osrm,
        google,
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        50,
    );

    let route = aggregator
        .get_route(
            &point(4.05, 9.77),
            &point(4.10, 9.82),
            &RoutingOptions {
                provider: Some(RouteProvider::Osrm),
                ..Default::default()
            },
        )
        .await
        .expect("fallback succeeds after timeout");

    assert_eq!(route.provider, RouteProvider::GoogleRoutes);
}

#[tokio::test]
async fn identical_origin_and_destination_short_circuits() {
    let google = FakeAdapter::new(
        RouteProvider::GoogleRoutes,
        FakeBehavior::Succeed {
            distance: 1500,
            duration: 300,
        },
    );
    let aggregator = build_aggregator(
        FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail),
        google.to_owned(),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let origin = point(4.05, 9.77);
    let route = aggregator
        .get_route(&origin, &origin, &RoutingOptions::default())
        .await
        .expect("zero-distance request succeeds");

    assert_eq!(route.distance, Meters(0));
    assert_eq!(route.duration, Seconds(0));
    assert_eq!(google.call_count(), 0);
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected_before_any_provider_call() {
    let google = FakeAdapter::new(
        RouteProvider::GoogleRoutes,
        FakeBehavior::Succeed {
            distance: 1500,
            duration: 300,
        },
    );
    let aggregator = build_aggregator(
        FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail),
        google.to_owned(),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let result = aggregator
        .get_route(
            &point(91.0, 9.77),
            &point(4.10, 9.82),
            &RoutingOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    assert_eq!(google.call_count(), 0);
}

#[tokio::test]
async fn calculate_eta_derives_from_the_route() {
    let aggregator = build_aggregator(
        FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail),
        FakeAdapter::new(
            RouteProvider::GoogleRoutes,
            FakeBehavior::Succeed {
                distance: 2500,
                duration: 600,
            },
        ),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    let eta = aggregator
        .calculate_eta(
            &point(4.05, 9.77),
            &point(4.10, 9.82),
            &RoutingOptions::default(),
        )
        .await
        .expect("eta derivation succeeds");

    assert_eq!(eta.duration, Seconds(600));
    assert_eq!(eta.distance, Meters(2500));
}

#[tokio::test]
async fn expired_cache_entries_are_absent_and_evictable() {
    let cache = Arc::new(InMemoryRouteCache::new(4));
    let route = Route {
        geometry: vec![point(4.05, 9.77), point(4.10, 9.82)],
        distance: Meters(1500),
        duration: Seconds(300),
        bounding_box: BoundingBox {
            min: point(4.05, 9.77),
            max: point(4.10, 9.82),
        },
        provider: RouteProvider::GoogleRoutes,
        mode: TravelMode::Drive,
        computed_at: TimeStamp(Utc::now()),
    };

    cache.put("k1", &route, 0).await.expect("put succeeds");
    cache.put("k2", &route, 3600).await.expect("put succeeds");

    assert!(cache.get("k1").await.expect("get succeeds").is_none());
    assert!(cache.get("k2").await.expect("get succeeds").is_some());

    let evicted = cache
        .evict_expired(Utc::now() + chrono::Duration::seconds(1))
        .await;
    assert_eq!(evicted, 1);
}
