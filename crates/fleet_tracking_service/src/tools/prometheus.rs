/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::{
    opts, register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec,
};

pub static TOTAL_LOCATION_UPDATES: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("total_location_updates", "Total Location Updates")
            .expect("Failed to register total location updates metrics")
    });

pub static NOTIFICATIONS_SENT: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("notifications_sent", "Delivered Rider Notifications")
            .expect("Failed to register notifications sent metrics")
    });

pub static NOTIFICATIONS_SUPPRESSED: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!(
            "notifications_suppressed",
            "Notifications Dropped By Throttle Window"
        )
        .expect("Failed to register notifications suppressed metrics")
    });

pub static ROUTE_CACHE_HITS: once_cell::sync::Lazy<IntCounter> = once_cell::sync::Lazy::new(|| {
    register_int_counter!("route_cache_hits", "Route Cache Hits")
        .expect("Failed to register route cache hit metrics")
});

pub static ROUTE_CACHE_MISSES: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("route_cache_misses", "Route Cache Misses")
            .expect("Failed to register route cache miss metrics")
    });

pub static PROVIDER_FAILURES: once_cell::sync::Lazy<IntCounterVec> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter_vec!(
            opts!("routing_provider_failures", "Routing Provider Failures"),
            &["provider"]
        )
        .expect("Failed to register provider failure metrics")
    });

pub static PROVIDER_FALLBACKS: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!(
            "routing_provider_fallbacks",
            "Requests Retried Against The Default Provider"
        )
        .expect("Failed to register provider fallback metrics")
    });

/// Builds the `/metrics` middleware and registers the service counters on
/// its registry.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = PrometheusMetricsBuilder::new("fts")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    prometheus
        .registry
        .register(Box::new(TOTAL_LOCATION_UPDATES.to_owned()))
        .expect("Failed to register total location updates metrics");

    prometheus
        .registry
        .register(Box::new(NOTIFICATIONS_SENT.to_owned()))
        .expect("Failed to register notifications sent metrics");

    prometheus
        .registry
        .register(Box::new(NOTIFICATIONS_SUPPRESSED.to_owned()))
        .expect("Failed to register notifications suppressed metrics");

    prometheus
        .registry
        .register(Box::new(ROUTE_CACHE_HITS.to_owned()))
        .expect("Failed to register route cache hit metrics");

    prometheus
        .registry
        .register(Box::new(ROUTE_CACHE_MISSES.to_owned()))
        .expect("Failed to register route cache miss metrics");

    prometheus
        .registry
        .register(Box::new(PROVIDER_FAILURES.to_owned()))
        .expect("Failed to register provider failure metrics");

    prometheus
        .registry
        .register(Box::new(PROVIDER_FALLBACKS.to_owned()))
        .expect("Failed to register provider fallback metrics");

    prometheus
}
