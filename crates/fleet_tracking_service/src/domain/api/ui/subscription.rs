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
    HttpRequest, HttpResponse,
};

use crate::{
    common::types::*,
    domain::action::ui::subscription,
    environment::AppState,
    tools::error::AppError,
};

/// Opens the live tracking stream for a trip. The response body stays open
/// and carries one JSON notification per line.
#[get("/ui/trip/subscribe/{tripId}")]
pub async fn subscribe_to_trip(
    data: Data<AppState>,
    path: Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let trip_id = TripId(path.into_inner());

    let rider_id = req
        .headers()
        .get("rId")
        .and_then(|header_value| header_value.to_str().ok())
        .map(|rider_id| RiderId(rider_id.to_string()))
        .ok_or(AppError::InvalidRequest("rId not found".to_string()))?;

    subscription::subscribe_to_trip(data, trip_id, rider_id).await
}

#[post("/ui/trip/unsubscribe/{tripId}")]
pub async fn unsubscribe_from_trip(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<APISuccess>, AppError> {
    let trip_id = TripId(path.into_inner());

    Ok(Json(
        subscription::unsubscribe_from_trip(data, trip_id).await?,
    ))
}
