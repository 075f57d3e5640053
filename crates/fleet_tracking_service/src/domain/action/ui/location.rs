/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::domain::types::ui::location::DriverLocationUpdateRequest;
use crate::environment::AppState;
use crate::tools::error::AppError;
use crate::tools::logger::*;
use actix_web::web::Data;

#[macros::measure_duration]
pub async fn update_driver_location(
    driver_id: DriverId,
    data: Data<AppState>,
    mut request_body: Vec<DriverLocationUpdateRequest>,
) -> Result<APISuccess, AppError> {
    // Device batches may arrive unsorted; the per-driver substream must be
    // fed in capture order.
    request_body.sort_by(|a, b| a.ts.cmp(&b.ts));

    info!(
        tag = "[Driver Location Updates]",
        driver_id = %driver_id.inner(),
        count = %request_body.len()
    );

    for request in request_body {
        data.engine
            .on_driver_report(DriverReport {
                driver_id: driver_id.to_owned(),
                location: Location {
                    pt: request.pt,
                    ts: request.ts,
                    acc: request.acc,
                    bear: request.bear,
                    speed: request.speed,
                },
                trip_id: request.trip_id,
            })
            .await?;
    }

    Ok(APISuccess::default())
}

pub async fn track_trip_location(
    data: Data<AppState>,
    trip_id: TripId,
) -> Result<DriverLocationRecord, AppError> {
    data.store
        .get_by_trip(&trip_id)
        .await
        .ok_or_else(|| AppError::DriverLocationNotFound(trip_id.inner()))
}
