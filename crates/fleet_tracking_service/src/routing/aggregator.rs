/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::{geo::*, types::*};
use crate::redis::keys::route_cache_key;
use crate::routing::{
    cache::RouteCacheStore,
    providers::{ProviderRegistry, RouteQuery},
};
use crate::tools::error::AppError;
use crate::tools::prometheus::{
    PROVIDER_FAILURES, PROVIDER_FALLBACKS, ROUTE_CACHE_HITS, ROUTE_CACHE_MISSES,
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::warn;

// Requests between points closer than this are answered synthetically.
const ZERO_DISTANCE_THRESHOLD_METERS: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub default_provider: RouteProvider,
    pub default_mode: TravelMode,
    pub provider_timeout: Duration,
    pub cache_validity_seconds: u32,
}

/// Orchestrates cache lookup, provider dispatch and fallback. Provider
/// calls are bounded; a timed-out call is abandoned and its eventual
/// response discarded. Cache failures never fail the request.
pub struct RoutingAggregator {
    providers: ProviderRegistry,
    cache: Arc<dyn RouteCacheStore>,
    config: RoutingConfig,
}

impl RoutingAggregator {
    pub fn new(
        providers: ProviderRegistry,
        cache: Arc<dyn RouteCacheStore>,
        config: RoutingConfig,
    ) -> Self {
        Self {
            providers,
            cache,
            config,
        }
    }

    pub async fn get_route(
        &self,
        origin: &Point,
        destination: &Point,
        options: &RoutingOptions,
    ) -> Result<Route, AppError> {
        if !origin.is_in_bounds() || !destination.is_in_bounds() {
            return Err(AppError::InvalidRequest(
                "Origin or destination coordinates out of range".to_string(),
            ));
        }
        if options.waypoints.iter().any(|pt| !pt.is_in_bounds()) {
            return Err(AppError::InvalidRequest(
                "Waypoint coordinates out of range".to_string(),
            ));
        }

        let mode = options.mode.unwrap_or(self.config.default_mode);
        let provider = options.provider.unwrap_or(self.config.default_provider);

        if distance_between_in_meters(origin, destination) < ZERO_DISTANCE_THRESHOLD_METERS {
            return Ok(zero_route(origin, destination, provider, mode));
        }

        let key = route_cache_key(&provider, &mode, origin, destination);
        match self.cache.get(&key).await {
            Ok(Some(route)) => {
                ROUTE_CACHE_HITS.inc();
                return Ok(route);
            }
            Ok(None) => ROUTE_CACHE_MISSES.inc(),
            Err(err) => {
                // A broken cache degrades to a miss.
                warn!(tag = "[Route Cache Read Failed]", key = %key, error = %err.message());
                ROUTE_CACHE_MISSES.inc();
            }
        }

        let query = RouteQuery {
            mode,
            waypoints: options.waypoints.to_owned(),
            alternatives: options.alternatives,
        };

        match self
            .call_provider(provider, origin, destination, &query)
            .await
        {
            Ok(route) => {
                self.store_route(&key, &route).await;
                Ok(route)
            }
            Err(err) => {
                warn!(tag = "[Provider Failed]", provider = %provider, error = %err.message());
                PROVIDER_FAILURES
                    .with_label_values(&[provider.to_string().as_str()])
                    .inc();

                if provider == self.config.default_provider {
                    return Err(AppError::RoutingUnavailable);
                }

                PROVIDER_FALLBACKS.inc();
                let fallback_provider = self.config.default_provider;
                match self
                    .call_provider(fallback_provider, origin, destination, &query)
                    .await
                {
                    Ok(route) => {
                        let fallback_key =
                            route_cache_key(&fallback_provider, &mode, origin, destination);
                        self.store_route(&fallback_key, &route).await;
                        Ok(route)
                    }
                    Err(fallback_err) => {
                        warn!(
                            tag = "[Fallback Provider Failed]",
                            provider = %fallback_provider,
                            error = %fallback_err.message()
                        );
                        PROVIDER_FAILURES
                            .with_label_values(&[fallback_provider.to_string().as_str()])
                            .inc();
                        Err(AppError::RoutingUnavailable)
                    }
                }
            }
        }
    }

    pub async fn calculate_eta(
        &self,
        origin: &Point,
        destination: &Point,
        options: &RoutingOptions,
    ) -> Result<RouteEta, AppError> {
        let route = self.get_route(origin, destination, options).await?;
        Ok(RouteEta {
            duration: route.duration,
            distance: route.distance,
        })
    }

    async fn call_provider(
        &self,
        provider: RouteProvider,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<Route, AppError> {
        let adapter = self.providers.adapter(provider);
        tokio::time::timeout(
            self.config.provider_timeout,
            adapter.compute_route(origin, destination, query),
        )
        .await
        .map_err(|_| {
            AppError::ProviderError(
                provider.to_string(),
                format!(
                    "Timed out after {}ms",
                    self.config.provider_timeout.as_millis()
                ),
            )
        })?
    }

    async fn store_route(&self, key: &str, route: &Route) {
        if let Err(err) = self
            .cache
            .put(key, route, self.config.cache_validity_seconds)
            .await
        {
            warn!(tag = "[Route Cache Store Failed]", key = %key, error = %err.message());
        }
    }
}

fn zero_route(
    origin: &Point,
    destination: &Point,
    provider: RouteProvider,
    mode: TravelMode,
) -> Route {
    let geometry = vec![*origin, *destination];
    let bounding_box = bounding_box(&geometry).unwrap_or(BoundingBox {
        min: *origin,
        max: *origin,
    });
    Route {
        geometry,
        distance: Meters(0),
        duration: Seconds(0),
        bounding_box,
        provider,
        mode,
        computed_at: TimeStamp(Utc::now()),
    }
}
