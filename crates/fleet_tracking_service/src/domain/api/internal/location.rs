/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get,
    web::{Data, Json, Path},
};
use std::collections::HashMap;

use crate::{
    common::types::*,
    domain::action::internal::location,
    environment::AppState,
    tools::error::AppError,
};

#[get("/internal/driver/location/{driverId}")]
pub async fn get_driver_location(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<DriverLocationRecord>, AppError> {
    let driver_id = DriverId(path.into_inner());

    Ok(Json(location::get_driver_location(data, driver_id).await?))
}

#[get("/internal/driver/locations")]
pub async fn get_all_driver_locations(
    data: Data<AppState>,
) -> Result<Json<HashMap<String, DriverLocationRecord>>, AppError> {
    Ok(Json(location::get_all_driver_locations(data).await?))
}
