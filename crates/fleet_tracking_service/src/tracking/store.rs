/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::tools::error::AppError;
use chrono::Utc;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use tokio::sync::RwLock;

/// In-memory source of truth for "where is driver X now". Records live in a
/// sharded arena so updates for unrelated drivers never contend on one
/// lock; writes for the same driver serialize on its shard.
///
/// Last write wins per driver in call order. Reports arrive over one
/// ordered channel per driver, so caller order is authoritative and
/// timestamps are not used for reordering.
pub struct DriverLocationStore {
    shards: Vec<RwLock<FxHashMap<DriverId, DriverLocationRecord>>>,
    trip_index: RwLock<FxHashMap<TripId, DriverId>>,
}

impl DriverLocationStore {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count)
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
            trip_index: RwLock::new(FxHashMap::default()),
        }
    }

    fn shard(&self, driver_id: &DriverId) -> &RwLock<FxHashMap<DriverId, DriverLocationRecord>> {
        let mut hasher = FxHasher::default();
        driver_id.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Rejects out-of-range coordinates without mutating any state.
    pub async fn update(
        &self,
        driver_id: DriverId,
        location: Location,
        trip_id: Option<TripId>,
    ) -> Result<DriverLocationRecord, AppError> {
        if !location.pt.is_in_bounds() {
            return Err(AppError::InvalidLocation(
                location.pt.lat.inner(),
                location.pt.lon.inner(),
            ));
        }

        let record = DriverLocationRecord {
            driver_id: driver_id.to_owned(),
            location,
            trip_id: trip_id.to_owned(),
            updated_at: TimeStamp(Utc::now()),
        };

        self.shard(&driver_id)
            .write()
            .await
            .insert(driver_id.to_owned(), record.to_owned());

        if let Some(trip_id) = trip_id {
            self.trip_index.write().await.insert(trip_id, driver_id);
        }

        Ok(record)
    }

    pub async fn get(&self, driver_id: &DriverId) -> Option<DriverLocationRecord> {
        self.shard(driver_id).read().await.get(driver_id).cloned()
    }

    pub async fn get_by_trip(&self, trip_id: &TripId) -> Option<DriverLocationRecord> {
        let driver_id = self.trip_index.read().await.get(trip_id).cloned()?;
        self.get(&driver_id).await
    }

    /// Snapshot of every live record, taken shard by shard.
    pub async fn list_all(&self) -> FxHashMap<DriverId, DriverLocationRecord> {
        let mut all = FxHashMap::default();
        for shard in &self.shards {
            let entries = shard.read().await;
            all.extend(
                entries
                    .iter()
                    .map(|(driver_id, record)| (driver_id.to_owned(), record.to_owned())),
            );
        }
        all
    }

    pub async fn remove_trip(&self, trip_id: &TripId) {
        self.trip_index.write().await.remove(trip_id);
    }
}
