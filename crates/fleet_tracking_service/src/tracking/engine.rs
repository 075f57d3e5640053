/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::{
    geo::{distance_between_in_meters, get_zone},
    types::*,
};
use crate::outbound::{
    external::{LocationPersistor, TripAccessValidator, TripStatusProvider},
    types::LocationStorePayload,
};
use crate::routing::aggregator::RoutingAggregator;
use crate::tools::error::AppError;
use crate::tools::prometheus::{
    NOTIFICATIONS_SENT, NOTIFICATIONS_SUPPRESSED, TOTAL_LOCATION_UPDATES,
};
use crate::tracking::{
    registry::{NotifyDecision, TripSubscriptionRegistry},
    store::DriverLocationStore,
};
use chrono::Utc;
use rustc_hash::FxHashMap;
use std::{sync::Arc, time::Duration};
use tokio::sync::{
    mpsc::{self, error::TrySendError, Receiver, Sender},
    RwLock,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub throttle_window_millis: u64,
    pub worker_queue_size: usize,
    pub worker_idle_timeout: Duration,
    /// Assumed speed for the straight-line ETA estimate used when every
    /// routing provider is exhausted.
    pub fallback_speed_meters_per_second: f64,
}

/// Consumes driver position reports, maintains the live stores and pushes
/// throttled updates to subscribed riders.
///
/// Each driver's reports flow through one bounded channel consumed by a
/// single worker task, so a driver's substream is processed in order while
/// unrelated drivers proceed concurrently. ETA computation and collaborator
/// calls always happen outside the store/registry locks; results are
/// applied back under a short lock.
pub struct LocationBroadcastEngine {
    store: Arc<DriverLocationStore>,
    registry: Arc<TripSubscriptionRegistry>,
    aggregator: Arc<RoutingAggregator>,
    access_validator: Arc<dyn TripAccessValidator>,
    trip_status_provider: Arc<dyn TripStatusProvider>,
    persistor: Arc<dyn LocationPersistor>,
    zones: Arc<Vec<MultiPolygonBody>>,
    config: EngineConfig,
    workers: RwLock<FxHashMap<DriverId, Sender<DriverReport>>>,
}

impl LocationBroadcastEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<DriverLocationStore>,
        registry: Arc<TripSubscriptionRegistry>,
        aggregator: Arc<RoutingAggregator>,
        access_validator: Arc<dyn TripAccessValidator>,
        trip_status_provider: Arc<dyn TripStatusProvider>,
        persistor: Arc<dyn LocationPersistor>,
        zones: Arc<Vec<MultiPolygonBody>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            registry,
            aggregator,
            access_validator,
            trip_status_provider,
            persistor,
            zones,
            config,
            workers: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn store(&self) -> &Arc<DriverLocationStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<TripSubscriptionRegistry> {
        &self.registry
    }

    /// Validates and enqueues one driver report onto that driver's ordered
    /// substream. Validation and authorization failures surface to the
    /// caller before any state changes.
    pub async fn on_driver_report(self: &Arc<Self>, report: DriverReport) -> Result<(), AppError> {
        if !report.location.pt.is_in_bounds() {
            return Err(AppError::InvalidLocation(
                report.location.pt.lat.inner(),
                report.location.pt.lon.inner(),
            ));
        }

        if let Some(trip_id) = &report.trip_id {
            let allowed = self
                .access_validator
                .validate_driver_trip_access(&report.driver_id, trip_id)
                .await?;
            if !allowed {
                return Err(AppError::AccessDenied(
                    report.driver_id.inner(),
                    trip_id.inner(),
                ));
            }
        }

        let driver_id = report.driver_id.to_owned();
        let sender = self.worker_sender(&driver_id).await;
        if let Err(err) = sender.send(report).await {
            // The worker idled out between lookup and send; respawn once.
            let report = err.0;
            let sender = self.respawn_worker(&driver_id).await;
            sender.send(report).await.map_err(|_| {
                AppError::InternalError(format!(
                    "Location worker unavailable for driver {}",
                    driver_id.inner()
                ))
            })?;
        }

        Ok(())
    }

    async fn worker_sender(self: &Arc<Self>, driver_id: &DriverId) -> Sender<DriverReport> {
        {
            let workers = self.workers.read().await;
            if let Some(sender) = workers.get(driver_id) {
                if !sender.is_closed() {
                    return sender.to_owned();
                }
            }
        }
        self.respawn_worker(driver_id).await
    }

    async fn respawn_worker(self: &Arc<Self>, driver_id: &DriverId) -> Sender<DriverReport> {
        let mut workers = self.workers.write().await;
        if let Some(sender) = workers.get(driver_id) {
            if !sender.is_closed() {
                return sender.to_owned();
            }
        }

        let (sender, receiver) = mpsc::channel(self.config.worker_queue_size.max(1));
        workers.insert(driver_id.to_owned(), sender.to_owned());

        let engine = self.to_owned();
        let worker_driver_id = driver_id.to_owned();
        tokio::spawn(async move {
            engine.run_worker(worker_driver_id, receiver).await;
        });

        sender
    }

    async fn run_worker(self: Arc<Self>, driver_id: DriverId, mut receiver: Receiver<DriverReport>) {
        loop {
            match tokio::time::timeout(self.config.worker_idle_timeout, receiver.recv()).await {
                Ok(Some(report)) => self.process_report(report).await,
                Ok(None) => break,
                Err(_) => {
                    info!(tag = "[Location Worker Idle]", driver_id = %driver_id.inner());
                    break;
                }
            }
        }

        // Close the channel before pruning so a dispatch racing with this
        // exit sees a dead sender and respawns.
        drop(receiver);
        let mut workers = self.workers.write().await;
        if workers
            .get(&driver_id)
            .map(|sender| sender.is_closed())
            .unwrap_or(false)
        {
            workers.remove(&driver_id);
        }
    }

    async fn process_report(&self, report: DriverReport) {
        let record = match self
            .store
            .update(
                report.driver_id.to_owned(),
                report.location.to_owned(),
                report.trip_id.to_owned(),
            )
            .await
        {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    tag = "[Driver Location Rejected]",
                    driver_id = %report.driver_id.inner(),
                    error = %err.message()
                );
                return;
            }
        };
        TOTAL_LOCATION_UPDATES.inc();

        let payload = LocationStorePayload {
            d_id: record.driver_id.to_owned(),
            t_id: record.trip_id.to_owned(),
            pt: record.location.pt,
            acc: record.location.acc,
            bear: record.location.bear,
            speed: record.location.speed,
            ts: record.location.ts,
            st: TimeStamp(Utc::now()),
            zone: get_zone(&record.location.pt.lat, &record.location.pt.lon, &self.zones),
        };
        let persistor = self.persistor.to_owned();
        tokio::spawn(async move {
            persistor.persist(payload).await;
        });

        if let Some(trip_id) = record.trip_id {
            self.notify(
                trip_id,
                record.driver_id,
                record.location,
                NotificationKind::Update,
            )
            .await;
        }
    }

    async fn notify(
        &self,
        trip_id: TripId,
        driver_id: DriverId,
        location: Location,
        kind: NotificationKind,
    ) {
        let now = Utc::now();
        let connection = match self
            .registry
            .claim_notification(&trip_id, now, self.config.throttle_window_millis)
            .await
        {
            NotifyDecision::Notify(connection) => connection,
            NotifyDecision::Suppressed => {
                NOTIFICATIONS_SUPPRESSED.inc();
                return;
            }
            NotifyDecision::NoSubscription => return,
        };

        let details = match self.trip_status_provider.get_trip_status(&trip_id).await {
            Ok(details) => details,
            Err(err) => {
                warn!(
                    tag = "[Trip Status Lookup Failed]",
                    trip_id = %trip_id.inner(),
                    error = %err.message()
                );
                return;
            }
        };

        if details.status.is_terminal() {
            self.registry.unsubscribe(&trip_id).await;
            self.store.remove_trip(&trip_id).await;
            return;
        }
        if !details.status.is_trackable() {
            return;
        }

        let target = match details.status {
            TripStatus::INPROGRESS => details.destination_location,
            _ => details.pickup_location,
        };

        // Remaining distance is great-circle by contract, not road distance.
        let distance_to_target =
            Meters(distance_between_in_meters(&location.pt, &target).round() as u32);

        let eta = match self
            .aggregator
            .calculate_eta(&location.pt, &target, &RoutingOptions::default())
            .await
        {
            Ok(eta) => Some(eta),
            Err(err) => {
                warn!(
                    tag = "[Live ETA Unavailable]",
                    trip_id = %trip_id.inner(),
                    error = %err.message()
                );
                Some(self.straight_line_eta(distance_to_target))
            }
        };

        let delivered_location = location.pt;
        let notification = TrackingNotification {
            kind,
            trip_id: trip_id.to_owned(),
            driver_id,
            location,
            eta,
            distance_to_target,
            ts: TimeStamp(now),
        };

        match connection.try_send(notification) {
            Ok(()) => {
                NOTIFICATIONS_SENT.inc();
                self.registry.record_location(&trip_id, delivered_location).await;
            }
            Err(TrySendError::Full(_)) => {
                // Slow consumer: dropped, the next report supersedes it.
                NOTIFICATIONS_SUPPRESSED.inc();
            }
            Err(TrySendError::Closed(_)) => {
                self.registry.unsubscribe(&trip_id).await;
            }
        }
    }

    fn straight_line_eta(&self, distance: Meters) -> RouteEta {
        let speed = self.config.fallback_speed_meters_per_second.max(0.1);
        RouteEta {
            duration: Seconds((f64::from(distance.inner()) / speed).ceil() as u32),
            distance,
        }
    }

    /// Registers a rider subscription after the access and trip-status
    /// gates, then pushes the initial snapshot if the driver has reported.
    /// No prior report is not an error; the rider waits for the first one.
    pub async fn subscribe(
        &self,
        trip_id: TripId,
        rider_id: RiderId,
        connection: ConnectionHandle,
    ) -> Result<(), AppError> {
        let allowed = self
            .access_validator
            .validate_rider_trip_access(&rider_id, &trip_id)
            .await?;
        if !allowed {
            return Err(AppError::AccessDenied(rider_id.inner(), trip_id.inner()));
        }

        let details = self.trip_status_provider.get_trip_status(&trip_id).await?;
        if !details.status.is_trackable() {
            return Err(AppError::InvalidTripStatus(
                trip_id.inner(),
                details.status.to_string(),
            ));
        }

        self.registry
            .subscribe(TripSubscription {
                trip_id: trip_id.to_owned(),
                rider_id,
                connection,
                subscribed_at: TimeStamp(Utc::now()),
                last_notified_at: None,
                last_location: None,
            })
            .await;

        if let Some(record) = self.store.get_by_trip(&trip_id).await {
            self.notify(
                trip_id,
                record.driver_id,
                record.location,
                NotificationKind::Initial,
            )
            .await;
        }

        Ok(())
    }

    pub async fn unsubscribe(&self, trip_id: &TripId) -> Result<(), AppError> {
        if self.registry.unsubscribe(trip_id).await {
            Ok(())
        } else {
            Err(AppError::SubscriptionNotFound(trip_id.inner()))
        }
    }

    /// Signal from the trip collaborator. Terminal statuses tear the
    /// subscription and the trip index down.
    pub async fn on_trip_status_changed(&self, trip_id: &TripId, status: TripStatus) {
        if status.is_terminal() {
            self.registry.unsubscribe(trip_id).await;
            self.store.remove_trip(trip_id).await;
        }
    }
}
