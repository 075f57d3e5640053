/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use chrono::{DateTime, Duration, Utc};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Outcome of a throttle claim for a candidate notification.
pub enum NotifyDecision {
    /// Window open; the claim consumed it. Deliver through this handle.
    Notify(ConnectionHandle),
    /// Inside the throttle window. The report is dropped, not queued; the
    /// next report supersedes it anyway.
    Suppressed,
    NoSubscription,
}

/// In-memory registry of live rider subscriptions, one per trip. The
/// latest subscribe call replaces the prior one. Sharded like the driver
/// store so unrelated trips never contend.
pub struct TripSubscriptionRegistry {
    shards: Vec<RwLock<FxHashMap<TripId, TripSubscription>>>,
}

impl TripSubscriptionRegistry {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count)
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
        }
    }

    fn shard(&self, trip_id: &TripId) -> &RwLock<FxHashMap<TripId, TripSubscription>> {
        let mut hasher = FxHasher::default();
        trip_id.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    pub async fn subscribe(&self, subscription: TripSubscription) {
        self.shard(&subscription.trip_id)
            .write()
            .await
            .insert(subscription.trip_id.to_owned(), subscription);
    }

    pub async fn unsubscribe(&self, trip_id: &TripId) -> bool {
        self.shard(trip_id).write().await.remove(trip_id).is_some()
    }

    pub async fn get(&self, trip_id: &TripId) -> Option<TripSubscription> {
        self.shard(trip_id).read().await.get(trip_id).cloned()
    }

    /// Throttle check and claim in one short critical section: if the
    /// window is open, `last_notified_at` is advanced before any expensive
    /// work (ETA computation) happens outside the lock.
    pub async fn claim_notification(
        &self,
        trip_id: &TripId,
        now: DateTime<Utc>,
        throttle_window_millis: u64,
    ) -> NotifyDecision {
        let mut subscriptions = self.shard(trip_id).write().await;
        match subscriptions.get_mut(trip_id) {
            Some(subscription) => {
                let within_window = subscription
                    .last_notified_at
                    .map(|TimeStamp(last)| {
                        now.signed_duration_since(last)
                            < Duration::milliseconds(throttle_window_millis as i64)
                    })
                    .unwrap_or(false);

                if within_window {
                    NotifyDecision::Suppressed
                } else {
                    subscription.last_notified_at = Some(TimeStamp(now));
                    NotifyDecision::Notify(subscription.connection.to_owned())
                }
            }
            None => NotifyDecision::NoSubscription,
        }
    }

    pub async fn record_location(&self, trip_id: &TripId, location: Point) {
        if let Some(subscription) = self.shard(trip_id).write().await.get_mut(trip_id) {
            subscription.last_location = Some(location);
        }
    }

    /// Removes subscriptions older than `max_age` or whose connection has
    /// gone away. Snapshot-then-filter per shard: the lock is never held
    /// for the duration of the sweep.
    pub async fn sweep_idle(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<TripId> {
        let mut removed = Vec::new();
        for shard in &self.shards {
            let candidates: Vec<(TripId, TimeStamp)> = {
                let subscriptions = shard.read().await;
                subscriptions
                    .iter()
                    .filter(|(_, subscription)| {
                        let TimeStamp(subscribed_at) = subscription.subscribed_at;
                        now.signed_duration_since(subscribed_at) > max_age
                            || subscription.connection.is_closed()
                    })
                    .map(|(trip_id, subscription)| {
                        (trip_id.to_owned(), subscription.subscribed_at)
                    })
                    .collect()
            };

            if candidates.is_empty() {
                continue;
            }

            let mut subscriptions = shard.write().await;
            for (trip_id, subscribed_at) in candidates {
                // A fresh subscribe may have replaced the candidate while
                // the lock was released.
                if subscriptions
                    .get(&trip_id)
                    .map(|subscription| subscription.subscribed_at == subscribed_at)
                    .unwrap_or(false)
                {
                    subscriptions.remove(&trip_id);
                    removed.push(trip_id);
                }
            }
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        let mut count = 0;
        for shard in &self.shards {
            count += shard.read().await.len();
        }
        count
    }
}

pub async fn run_subscription_sweeper(
    registry: Arc<TripSubscriptionRegistry>,
    sweep_interval_seconds: u64,
    max_age_seconds: u64,
) {
    let mut timer = tokio::time::interval(std::time::Duration::from_secs(
        sweep_interval_seconds.max(1),
    ));
    timer.tick().await;
    loop {
        timer.tick().await;
        let removed = registry
            .sweep_idle(Utc::now(), Duration::seconds(max_age_seconds as i64))
            .await;
        if !removed.is_empty() {
            info!(tag = "[Idle Subscriptions Swept]", count = %removed.len());
        }
    }
}
