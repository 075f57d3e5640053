/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get, post,
    web::{Data, Json, Path},
    HttpRequest,
};

use crate::{
    common::types::*,
    domain::{action::ui::location, types::ui::location::DriverLocationUpdateRequest},
    environment::AppState,
    tools::error::AppError,
};

#[post("/ui/driver/location")]
pub async fn update_driver_location(
    data: Data<AppState>,
    param_obj: Json<Vec<DriverLocationUpdateRequest>>,
    req: HttpRequest,
) -> Result<Json<APISuccess>, AppError> {
    let request_body = param_obj.into_inner();

    if request_body.is_empty() {
        return Err(AppError::InvalidRequest(
            "Vec<DriverLocationUpdateRequest> is empty".to_string(),
        ));
    }

    // Authentication happens upstream; the gateway forwards the resolved
    // driver identity in this header.
    let driver_id = req
        .headers()
        .get("dId")
        .and_then(|header_value| header_value.to_str().ok())
        .map(|driver_id| DriverId(driver_id.to_string()))
        .ok_or(AppError::InvalidRequest("dId not found".to_string()))?;

    Ok(Json(
        location::update_driver_location(driver_id, data, request_body).await?,
    ))
}

#[get("/ui/trip/location/{tripId}")]
pub async fn track_trip_location(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<DriverLocationRecord>, AppError> {
    let trip_id = TripId(path.into_inner());

    Ok(Json(location::track_trip_location(data, trip_id).await?))
}
