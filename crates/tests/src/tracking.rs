/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::support::*;
use chrono::{Duration as ChronoDuration, Utc};
use fleet_tracking_service::common::geo::distance_between_in_meters;
use fleet_tracking_service::common::types::*;
use fleet_tracking_service::outbound::external::TripAccessValidator;
use fleet_tracking_service::tools::error::AppError;
use fleet_tracking_service::tracking::engine::{EngineConfig, LocationBroadcastEngine};
use fleet_tracking_service::tracking::registry::TripSubscriptionRegistry;
use fleet_tracking_service::tracking::store::DriverLocationStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const RECV_DEADLINE: Duration = Duration::from_secs(2);
const SETTLE: Duration = Duration::from_millis(300);

fn trip_details(status: TripStatus) -> TripDetails {
    TripDetails {
        status,
        pickup_location: point(4.06, 9.78),
        destination_location: point(4.20, 9.95),
    }
}

fn build_engine(
    status: TripStatus,
    access_validator: Arc<dyn TripAccessValidator>,
) -> Arc<LocationBroadcastEngine> {
    let store = Arc::new(DriverLocationStore::new(8));
    let registry = Arc::new(TripSubscriptionRegistry::new(8));
    let aggregator = build_aggregator(
        FakeAdapter::new(RouteProvider::Osrm, FakeBehavior::Fail),
        FakeAdapter::new(
            RouteProvider::GoogleRoutes,
            FakeBehavior::Succeed {
                distance: 1500,
                duration: 300,
            },
        ),
        FakeAdapter::new(RouteProvider::Mapbox, FakeBehavior::Fail),
        RouteProvider::GoogleRoutes,
        1000,
    );

    Arc::new(LocationBroadcastEngine::new(
        store,
        registry,
        aggregator,
        access_validator,
        Arc::new(FixedTripStatus {
            details: trip_details(status),
        }),
        CountingPersistor::new(),
        Arc::new(vec![]),
        EngineConfig {
            throttle_window_millis: 1000,
            worker_queue_size: 16,
            worker_idle_timeout: Duration::from_secs(60),
            fallback_speed_meters_per_second: 8.33,
        },
    ))
}

fn report(driver: &str, lat: f64, lon: f64, trip: Option<&str>) -> DriverReport {
    DriverReport {
        driver_id: DriverId(driver.to_string()),
        location: location(lat, lon),
        trip_id: trip.map(|trip_id| TripId(trip_id.to_string())),
    }
}

#[tokio::test]
async fn store_update_then_get_returns_the_written_location() {
    let store = DriverLocationStore::new(8);

    store
        .update(DriverId("d1".to_string()), location(4.05, 9.77), None)
        .await
        .expect("valid update");

    let record = store.get(&DriverId("d1".to_string())).await.expect("present");
    assert_eq!(record.location.pt, point(4.05, 9.77));
    assert!(record.trip_id.is_none());
}

#[tokio::test]
async fn store_rejects_out_of_range_without_clobbering_prior_value() {
    let store = DriverLocationStore::new(8);
    let driver_id = DriverId("d1".to_string());

    store
        .update(driver_id.to_owned(), location(4.05, 9.77), None)
        .await
        .expect("valid update");

    let result = store
        .update(driver_id.to_owned(), location(94.05, 9.77), None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidLocation(_, _))));

    let result = store
        .update(driver_id.to_owned(), location(4.05, -190.0), None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidLocation(_, _))));

    let record = store.get(&driver_id).await.expect("prior value intact");
    assert_eq!(record.location.pt, point(4.05, 9.77));
}

#[tokio::test]
async fn store_is_last_write_wins_per_driver() {
    let store = DriverLocationStore::new(8);
    let driver_id = DriverId("d1".to_string());

    store
        .update(driver_id.to_owned(), location(4.05, 9.77), None)
        .await
        .expect("valid update");
    store
        .update(
            driver_id.to_owned(),
            location(4.06, 9.78),
            Some(TripId("t1".to_string())),
        )
        .await
        .expect("valid update");

    let record = store.get(&driver_id).await.expect("present");
    assert_eq!(record.location.pt, point(4.06, 9.78));
    assert_eq!(record.trip_id, Some(TripId("t1".to_string())));

    let by_trip = store
        .get_by_trip(&TripId("t1".to_string()))
        .await
        .expect("trip index resolves");
    assert_eq!(by_trip.driver_id, driver_id);
}

#[tokio::test]
async fn store_lists_every_live_driver() {
    let store = DriverLocationStore::new(8);

    store
        .update(DriverId("d1".to_string()), location(4.05, 9.77), None)
        .await
        .expect("valid update");
    store
        .update(DriverId("d2".to_string()), location(12.97, 77.59), None)
        .await
        .expect("valid update");

    let all = store.list_all().await;
    assert_eq!(all.len(), 2);
    assert!(all.contains_key(&DriverId("d1".to_string())));
    assert!(all.contains_key(&DriverId("d2".to_string())));
}

#[tokio::test]
async fn latest_subscription_replaces_the_prior_one() {
    let registry = TripSubscriptionRegistry::new(8);
    let trip_id = TripId("t1".to_string());

    let (first_tx, _first_rx) = mpsc::channel(4);
    let (second_tx, _second_rx) = mpsc::channel(4);

    registry
        .subscribe(TripSubscription {
            trip_id: trip_id.to_owned(),
            rider_id: RiderId("r1".to_string()),
            connection: first_tx,
            subscribed_at: TimeStamp(Utc::now()),
            last_notified_at: None,
            last_location: None,
        })
        .await;
    registry
        .subscribe(TripSubscription {
            trip_id: trip_id.to_owned(),
            rider_id: RiderId("r2".to_string()),
            connection: second_tx,
            subscribed_at: TimeStamp(Utc::now()),
            last_notified_at: None,
            last_location: None,
        })
        .await;

    let live = registry.get(&trip_id).await.expect("present");
    assert_eq!(live.rider_id, RiderId("r2".to_string()));
    assert_eq!(registry.active_count().await, 1);
}

#[tokio::test]
async fn idle_subscriptions_are_swept_and_fresh_ones_kept() {
    let registry = TripSubscriptionRegistry::new(8);

    let (stale_tx, _stale_rx) = mpsc::channel(4);
    let (fresh_tx, _fresh_rx) = mpsc::channel(4);

    registry
        .subscribe(TripSubscription {
            trip_id: TripId("stale".to_string()),
            rider_id: RiderId("r1".to_string()),
            connection: stale_tx,
            subscribed_at: TimeStamp(Utc::now() - ChronoDuration::hours(3)),
            last_notified_at: None,
            last_location: None,
        })
        .await;
    registry
        .subscribe(TripSubscription {
            trip_id: TripId("fresh".to_string()),
            rider_id: RiderId("r2".to_string()),
            connection: fresh_tx,
            subscribed_at: TimeStamp(Utc::now()),
            last_notified_at: None,
            last_location: None,
        })
        .await;

    let removed = registry
        .sweep_idle(Utc::now(), ChronoDuration::hours(2))
        .await;

    assert_eq!(removed, vec![TripId("stale".to_string())]);
    assert!(registry.get(&TripId("stale".to_string())).await.is_none());
    assert!(registry.get(&TripId("fresh".to_string())).await.is_some());
}

#[tokio::test]
async fn subscribe_without_prior_report_yields_no_initial_snapshot() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));
    let (tx, mut rx) = mpsc::channel(16);

    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    tokio::time::sleep(SETTLE).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn subscribe_after_a_report_pushes_the_initial_snapshot() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));

    engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await
        .expect("report accepted");
    tokio::time::sleep(SETTLE).await;

    let (tx, mut rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    let snapshot = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("snapshot in time")
        .expect("channel open");

    assert_eq!(snapshot.kind, NotificationKind::Initial);
    assert_eq!(snapshot.trip_id, TripId("t1".to_string()));
    assert_eq!(snapshot.location.pt, point(4.05, 9.77));
}

#[tokio::test]
async fn en_route_notification_targets_the_pickup() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));
    let (tx, mut rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await
        .expect("report accepted");

    let notification = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("notification in time")
        .expect("channel open");

    assert_eq!(notification.kind, NotificationKind::Update);
    assert_eq!(notification.driver_id, DriverId("d1".to_string()));

    // Remaining distance is great-circle to the pickup, not the
    // destination, while the driver is en route.
    let expected =
        distance_between_in_meters(&point(4.05, 9.77), &point(4.06, 9.78)).round() as u32;
    assert_eq!(notification.distance_to_target, Meters(expected));

    let eta = notification.eta.expect("eta present");
    assert_eq!(eta.duration, Seconds(300));
    assert_eq!(eta.distance, Meters(1500));
}

#[tokio::test]
async fn in_progress_notification_targets_the_destination() {
    let engine = build_engine(TripStatus::INPROGRESS, Arc::new(AllowAllAccess));
    let (tx, mut rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await
        .expect("report accepted");

    let notification = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("notification in time")
        .expect("channel open");

    let expected =
        distance_between_in_meters(&point(4.05, 9.77), &point(4.20, 9.95)).round() as u32;
    assert_eq!(notification.distance_to_target, Meters(expected));
}

#[tokio::test]
async fn reports_inside_the_throttle_window_are_suppressed() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));
    let (tx, mut rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await
        .expect("report accepted");
    tokio::time::sleep(Duration::from_millis(500)).await;
    engine
        .on_driver_report(report("d1", 4.051, 9.771, Some("t1")))
        .await
        .expect("report accepted");

    let first = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("first notification in time")
        .expect("channel open");
    assert_eq!(first.location.pt, point(4.05, 9.77));

    // The second report fell inside the 1000ms window: dropped, not queued.
    tokio::time::sleep(SETTLE).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn reports_beyond_the_throttle_window_are_both_delivered() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));
    let (tx, mut rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await
        .expect("report accepted");
    tokio::time::sleep(Duration::from_millis(1200)).await;
    engine
        .on_driver_report(report("d1", 4.052, 9.772, Some("t1")))
        .await
        .expect("report accepted");

    let first = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("first notification in time")
        .expect("channel open");
    let second = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("second notification in time")
        .expect("channel open");

    assert_eq!(first.location.pt, point(4.05, 9.77));
    assert_eq!(second.location.pt, point(4.052, 9.772));
}

#[tokio::test]
async fn denied_parties_cannot_report_or_subscribe() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(DenyAllAccess));

    let result = engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await;
    assert!(matches!(result, Err(AppError::AccessDenied(_, _))));
    assert!(engine.store().get(&DriverId("d1".to_string())).await.is_none());

    let (tx, _rx) = mpsc::channel(16);
    let result = engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await;
    assert!(matches!(result, Err(AppError::AccessDenied(_, _))));
}

#[tokio::test]
async fn untrackable_trip_status_rejects_the_subscription() {
    let engine = build_engine(TripStatus::COMPLETED, Arc::new(AllowAllAccess));
    let (tx, _rx) = mpsc::channel(16);

    let result = engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await;

    assert!(matches!(result, Err(AppError::InvalidTripStatus(_, _))));
}

#[tokio::test]
async fn invalid_coordinates_are_rejected_at_the_gate() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));

    let result = engine
        .on_driver_report(report("d1", 94.05, 9.77, None))
        .await;

    assert!(matches!(result, Err(AppError::InvalidLocation(_, _))));
    assert!(engine.store().get(&DriverId("d1".to_string())).await.is_none());
}

#[tokio::test]
async fn terminal_status_signal_removes_the_subscription() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));
    let (tx, _rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    engine
        .on_trip_status_changed(&TripId("t1".to_string()), TripStatus::COMPLETED)
        .await;

    assert!(engine.registry().get(&TripId("t1".to_string())).await.is_none());

    let result = engine.unsubscribe(&TripId("t1".to_string())).await;
    assert!(matches!(result, Err(AppError::SubscriptionNotFound(_))));
}

#[tokio::test]
async fn unsubscribed_trips_receive_no_further_notifications() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));
    let (tx, mut rx) = mpsc::channel(16);
    engine
        .subscribe(TripId("t1".to_string()), RiderId("r1".to_string()), tx)
        .await
        .expect("subscribe succeeds");

    engine
        .unsubscribe(&TripId("t1".to_string()))
        .await
        .expect("unsubscribe succeeds");

    engine
        .on_driver_report(report("d1", 4.05, 9.77, Some("t1")))
        .await
        .expect("report accepted");

    tokio::time::sleep(SETTLE).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn one_drivers_reports_are_processed_in_order() {
    let engine = build_engine(TripStatus::DriverEnRoute, Arc::new(AllowAllAccess));

    for i in 0..50u32 {
        engine
            .on_driver_report(report("d1", 4.0 + f64::from(i) * 0.001, 9.77, None))
            .await
            .expect("report accepted");
    }

    tokio::time::sleep(SETTLE).await;

    let record = engine
        .store()
        .get(&DriverId("d1".to_string()))
        .await
        .expect("present");
    assert_eq!(record.location.pt, point(4.0 + 49.0 * 0.001, 9.77));
}
