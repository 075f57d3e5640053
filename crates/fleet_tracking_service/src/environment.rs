/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use std::{env::var, sync::Arc, time::Duration};

use crate::{
    common::{geo_polygon::read_geo_polygon, types::*},
    outbound::external::{
        HttpAccessValidator, HttpTripStatusProvider, KafkaLocationPersistor,
    },
    redis::types::{RedisConnectionPool, RedisSettings},
    routing::{
        aggregator::{RoutingAggregator, RoutingConfig},
        cache::{InMemoryRouteCache, RedisRouteCache, RouteCacheStore},
        providers::{GoogleRoutesAdapter, MapboxAdapter, OsrmAdapter, ProviderRegistry},
    },
    tools::logger::LoggerConfig,
    tracking::{
        engine::{EngineConfig, LocationBroadcastEngine},
        registry::TripSubscriptionRegistry,
        store::DriverLocationStore,
    },
};
use rdkafka::{error::KafkaError, producer::FutureProducer, ClientConfig};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub request_timeout: u64,
    pub shard_count: usize,
    pub kafka_cfg: KafkaConfig,
    pub location_store_topic: String,
    pub routing_cfg: RoutingAppConfig,
    pub tracking_cfg: TrackingAppConfig,
    pub collaborator_cfg: CollaboratorConfig,
    pub redis_cfg: RedisSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KafkaConfig {
    pub kafka_key: String,
    pub kafka_host: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    InMemory,
    Redis,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RoutingAppConfig {
    pub default_provider: RouteProvider,
    pub default_mode: TravelMode,
    pub provider_timeout_millis: u64,
    pub cache_backend: CacheBackend,
    pub cache_validity_seconds: u32,
    pub cache_eviction_interval_seconds: u64,
    pub osrm_base_url: String,
    pub google_compute_route_url: String,
    pub google_api_key: String,
    pub mapbox_base_url: String,
    pub mapbox_access_token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackingAppConfig {
    pub throttle_window_millis: u64,
    pub worker_queue_size: usize,
    pub worker_idle_timeout_seconds: u64,
    pub subscription_queue_size: usize,
    pub subscription_max_age_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub fallback_speed_meters_per_second: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollaboratorConfig {
    pub access_check_url: String,
    pub trip_status_url: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LocationBroadcastEngine>,
    pub store: Arc<DriverLocationStore>,
    pub registry: Arc<TripSubscriptionRegistry>,
    pub aggregator: Arc<RoutingAggregator>,
    /// Present only for the in-process cache backend; the eviction task
    /// sweeps it. Redis enforces expiry on its own.
    pub in_memory_cache: Option<Arc<InMemoryRouteCache>>,
    pub subscription_queue_size: usize,
    pub subscription_max_age_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub cache_eviction_interval_seconds: u64,
    pub request_timeout: u64,
}

impl AppState {
    pub async fn new(app_config: AppConfig) -> AppState {
        let client = Client::new();

        let (cache, in_memory_cache): (Arc<dyn RouteCacheStore>, Option<Arc<InMemoryRouteCache>>) =
            match app_config.routing_cfg.cache_backend {
                CacheBackend::InMemory => {
                    let cache = Arc::new(InMemoryRouteCache::new(app_config.shard_count));
                    (cache.to_owned() as Arc<dyn RouteCacheStore>, Some(cache))
                }
                CacheBackend::Redis => {
                    let redis = Arc::new(
                        RedisConnectionPool::new(app_config.redis_cfg.to_owned())
                            .await
                            .expect("Failed to create Redis connection pool"),
                    );
                    (
                        Arc::new(RedisRouteCache::new(redis)) as Arc<dyn RouteCacheStore>,
                        None,
                    )
                }
            };

        let providers = ProviderRegistry::new(
            Arc::new(OsrmAdapter::new(
                client.to_owned(),
                Url::parse(app_config.routing_cfg.osrm_base_url.as_str())
                    .expect("Failed to parse osrm_base_url."),
            )),
            Arc::new(GoogleRoutesAdapter::new(
                client.to_owned(),
                Url::parse(app_config.routing_cfg.google_compute_route_url.as_str())
                    .expect("Failed to parse google_compute_route_url."),
                app_config.routing_cfg.google_api_key.to_owned(),
            )),
            Arc::new(MapboxAdapter::new(
                client.to_owned(),
                Url::parse(app_config.routing_cfg.mapbox_base_url.as_str())
                    .expect("Failed to parse mapbox_base_url."),
                app_config.routing_cfg.mapbox_access_token.to_owned(),
            )),
        );

        let aggregator = Arc::new(RoutingAggregator::new(
            providers,
            cache,
            RoutingConfig {
                default_provider: app_config.routing_cfg.default_provider,
                default_mode: app_config.routing_cfg.default_mode,
                provider_timeout: Duration::from_millis(
                    app_config.routing_cfg.provider_timeout_millis,
                ),
                cache_validity_seconds: app_config.routing_cfg.cache_validity_seconds,
            },
        ));

        let store = Arc::new(DriverLocationStore::new(app_config.shard_count));
        let registry = Arc::new(TripSubscriptionRegistry::new(app_config.shard_count));

        let geo_config_path = var("GEO_CONFIG").unwrap_or_else(|_| "./geo_config".to_string());
        let zones = Arc::new(read_geo_polygon(&geo_config_path).expect("Failed to read geoJSON"));

        let producer: Option<FutureProducer>;

        let result: Result<FutureProducer, KafkaError> = ClientConfig::new()
            .set(
                app_config.kafka_cfg.kafka_key,
                app_config.kafka_cfg.kafka_host,
            )
            .set("compression.type", "lz4")
            .create();

        match result {
            Ok(val) => {
                producer = Some(val);
            }
            Err(err) => {
                producer = None;
                info!(
                    tag = "[Kafka Connection]",
                    "Error connecting to kafka config: {err}"
                );
            }
        }

        let access_validator = Arc::new(HttpAccessValidator::new(
            client.to_owned(),
            Url::parse(app_config.collaborator_cfg.access_check_url.as_str())
                .expect("Failed to parse access_check_url."),
            app_config.collaborator_cfg.api_key.to_owned(),
        ));
        let trip_status_provider = Arc::new(HttpTripStatusProvider::new(
            client,
            Url::parse(app_config.collaborator_cfg.trip_status_url.as_str())
                .expect("Failed to parse trip_status_url."),
            app_config.collaborator_cfg.api_key,
        ));
        let persistor = Arc::new(KafkaLocationPersistor::new(
            producer,
            app_config.location_store_topic,
        ));

        let engine = Arc::new(LocationBroadcastEngine::new(
            store.to_owned(),
            registry.to_owned(),
            aggregator.to_owned(),
            access_validator,
            trip_status_provider,
            persistor,
            zones,
            EngineConfig {
                throttle_window_millis: app_config.tracking_cfg.throttle_window_millis,
                worker_queue_size: app_config.tracking_cfg.worker_queue_size,
                worker_idle_timeout: Duration::from_secs(
                    app_config.tracking_cfg.worker_idle_timeout_seconds,
                ),
                fallback_speed_meters_per_second: app_config
                    .tracking_cfg
                    .fallback_speed_meters_per_second,
            },
        ));

        AppState {
            engine,
            store,
            registry,
            aggregator,
            in_memory_cache,
            subscription_queue_size: app_config.tracking_cfg.subscription_queue_size,
            subscription_max_age_seconds: app_config.tracking_cfg.subscription_max_age_seconds,
            sweep_interval_seconds: app_config.tracking_cfg.sweep_interval_seconds,
            cache_eviction_interval_seconds: app_config
                .routing_cfg
                .cache_eviction_interval_seconds,
            request_timeout: app_config.request_timeout,
        }
    }
}
