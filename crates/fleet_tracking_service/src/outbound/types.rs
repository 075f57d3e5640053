/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use serde::{Deserialize, Serialize};

use crate::common::types::*;

// Trip access check
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    pub allowed: bool,
}

// Durable write of an accepted driver position, enriched with the zone it
// fell in. Streamed to the persistence collaborator, keyed by driver.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationStorePayload {
    pub d_id: DriverId,
    pub t_id: Option<TripId>,
    pub pt: Point,
    pub acc: Option<Accuracy>,
    pub bear: Option<Direction>,
    pub speed: Option<SpeedInMeterPerSecond>,
    pub ts: TimeStamp,
    pub st: TimeStamp,
    pub zone: Option<ZoneName>,
}
