/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use async_trait::async_trait;
use chrono::Utc;
use fleet_tracking_service::{
    common::{geo::bounding_box, types::*},
    outbound::{
        external::{LocationPersistor, TripAccessValidator, TripStatusProvider},
        types::LocationStorePayload,
    },
    routing::{
        aggregator::{RoutingAggregator, RoutingConfig},
        cache::InMemoryRouteCache,
        providers::{ProviderAdapter, ProviderRegistry, RouteQuery},
    },
    tools::error::AppError,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

pub fn point(lat: f64, lon: f64) -> Point {
    Point {
        lat: Latitude(lat),
        lon: Longitude(lon),
    }
}

pub fn location(lat: f64, lon: f64) -> Location {
    Location {
        pt: point(lat, lon),
        ts: TimeStamp(Utc::now()),
        acc: None,
        bear: None,
        speed: None,
    }
}

#[derive(Clone)]
pub enum FakeBehavior {
    Succeed { distance: u32, duration: u32 },
    Fail,
    Hang(Duration),
}

pub struct FakeAdapter {
    provider: RouteProvider,
    behavior: FakeBehavior,
    pub calls: Arc<AtomicUsize>,
}

impl FakeAdapter {
    pub fn new(provider: RouteProvider, behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            provider,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn provider(&self) -> RouteProvider {
        self.provider
    }

    async fn compute_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<Route, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            FakeBehavior::Succeed { distance, duration } => {
                let geometry = vec![*origin, *destination];
                let bounding_box = bounding_box(&geometry).expect("non-empty geometry");
                Ok(Route {
                    geometry,
                    distance: Meters(*distance),
                    duration: Seconds(*duration),
                    bounding_box,
                    provider: self.provider,
                    mode: query.mode,
                    computed_at: TimeStamp(Utc::now()),
                })
            }
            FakeBehavior::Fail => Err(AppError::ProviderError(
                self.provider.to_string(),
                "Simulated upstream failure".to_string(),
            )),
            FakeBehavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Err(AppError::ProviderError(
                    self.provider.to_string(),
                    "Simulated late failure".to_string(),
                ))
            }
        }
    }
}

pub fn build_aggregator(
    osrm: Arc<FakeAdapter>,
    google: Arc<FakeAdapter>,
    mapbox: Arc<FakeAdapter>,
    default_provider: RouteProvider,
    provider_timeout_millis: u64,
) -> Arc<RoutingAggregator> {
    Arc::new(RoutingAggregator::new(
        ProviderRegistry::new(osrm, google, mapbox),
        Arc::new(InMemoryRouteCache::new(8)),
        RoutingConfig {
            default_provider,
            default_mode: TravelMode::Drive,
            provider_timeout: Duration::from_millis(provider_timeout_millis),
            cache_validity_seconds: 3600,
        },
    ))
}

pub struct AllowAllAccess;

#[async_trait]
impl TripAccessValidator for AllowAllAccess {
    async fn validate_rider_trip_access(
        &self,
        _rider_id: &RiderId,
        _trip_id: &TripId,
    ) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn validate_driver_trip_access(
        &self,
        _driver_id: &DriverId,
        _trip_id: &TripId,
    ) -> Result<bool, AppError> {
        Ok(true)
    }
}

pub struct DenyAllAccess;

#[async_trait]
impl TripAccessValidator for DenyAllAccess {
    async fn validate_rider_trip_access(
        &self,
        _rider_id: &RiderId,
        _trip_id: &TripId,
    ) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn validate_driver_trip_access(
        &self,
        _driver_id: &DriverId,
        _trip_id: &TripId,
    ) -> Result<bool, AppError> {
        Ok(false)
    }
}

pub struct FixedTripStatus {
    pub details: TripDetails,
}

#[async_trait]
impl TripStatusProvider for FixedTripStatus {
    async fn get_trip_status(&self, _trip_id: &TripId) -> Result<TripDetails, AppError> {
        Ok(self.details.to_owned())
    }
}

pub struct CountingPersistor {
    pub persisted: Arc<AtomicUsize>,
}

impl CountingPersistor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            persisted: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl LocationPersistor for CountingPersistor {
    async fn persist(&self, _payload: LocationStorePayload) {
        self.persisted.fetch_add(1, Ordering::SeqCst);
    }
}
