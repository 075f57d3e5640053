/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::redis::types::RedisConnectionPool;
use crate::tools::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Keyed store of previously computed routes with per-entry expiry. The
/// backing store is selected by the deployment: an in-process map or Redis.
#[async_trait]
pub trait RouteCacheStore: Send + Sync {
    /// An expired entry is absent; a get never returns stale data.
    async fn get(&self, key: &str) -> Result<Option<Route>, AppError>;
    async fn put(&self, key: &str, route: &Route, validity_seconds: u32) -> Result<(), AppError>;
}

#[derive(Clone)]
struct CachedRoute {
    route: Route,
    expires_at: DateTime<Utc>,
}

pub struct InMemoryRouteCache {
    shards: Vec<RwLock<FxHashMap<String, CachedRoute>>>,
}

impl InMemoryRouteCache {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count)
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
        }
    }

    fn shard(&self, key: &str) -> &RwLock<FxHashMap<String, CachedRoute>> {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Removes entries past their deadline. Runs shard by shard with a
    /// snapshot-then-filter pass so active traffic is never blocked for the
    /// duration of the sweep.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        for shard in &self.shards {
            let expired_keys: Vec<String> = {
                let entries = shard.read().await;
                entries
                    .iter()
                    .filter(|(_, cached)| cached.expires_at <= now)
                    .map(|(key, _)| key.to_owned())
                    .collect()
            };

            if expired_keys.is_empty() {
                continue;
            }

            let mut entries = shard.write().await;
            for key in expired_keys {
                if entries
                    .get(&key)
                    .map(|cached| cached.expires_at <= now)
                    .unwrap_or(false)
                {
                    entries.remove(&key);
                    evicted += 1;
                }
            }
        }
        evicted
    }
}

#[async_trait]
impl RouteCacheStore for InMemoryRouteCache {
    async fn get(&self, key: &str) -> Result<Option<Route>, AppError> {
        let entries = self.shard(key).read().await;
        Ok(entries
            .get(key)
            .filter(|cached| cached.expires_at > Utc::now())
            .map(|cached| cached.route.to_owned()))
    }

    async fn put(&self, key: &str, route: &Route, validity_seconds: u32) -> Result<(), AppError> {
        let cached = CachedRoute {
            route: route.to_owned(),
            expires_at: Utc::now() + Duration::seconds(i64::from(validity_seconds)),
        };
        self.shard(key).write().await.insert(key.to_owned(), cached);
        Ok(())
    }
}

/// Redis-backed variant; expiry is enforced by the Redis TTL, so there is
/// no in-process sweep to run.
pub struct RedisRouteCache {
    redis: Arc<RedisConnectionPool>,
}

impl RedisRouteCache {
    pub fn new(redis: Arc<RedisConnectionPool>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl RouteCacheStore for RedisRouteCache {
    async fn get(&self, key: &str) -> Result<Option<Route>, AppError> {
        Ok(self.redis.get_key::<Route>(key).await?)
    }

    async fn put(&self, key: &str, route: &Route, validity_seconds: u32) -> Result<(), AppError> {
        self.redis
            .set_with_expiry(key, route, validity_seconds)
            .await?;
        Ok(())
    }
}

pub async fn run_cache_eviction(cache: Arc<InMemoryRouteCache>, sweep_interval_seconds: u64) {
    let mut timer = tokio::time::interval(std::time::Duration::from_secs(
        sweep_interval_seconds.max(1),
    ));
    timer.tick().await;
    loop {
        timer.tick().await;
        let evicted = cache.evict_expired(Utc::now()).await;
        if evicted > 0 {
            info!(tag = "[Route Cache Eviction]", count = %evicted);
        }
    }
}
