/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::environment::AppState;
use crate::tools::error::AppError;
use actix_web::web::Data;
use std::collections::HashMap;

/// Operator/debug visibility: the latest record for one driver.
pub async fn get_driver_location(
    data: Data<AppState>,
    driver_id: DriverId,
) -> Result<DriverLocationRecord, AppError> {
    data.store
        .get(&driver_id)
        .await
        .ok_or_else(|| AppError::DriverLocationNotFound(driver_id.inner()))
}

/// Operator/debug visibility: every live driver record.
pub async fn get_all_driver_locations(
    data: Data<AppState>,
) -> Result<HashMap<String, DriverLocationRecord>, AppError> {
    Ok(data
        .store
        .list_all()
        .await
        .into_iter()
        .map(|(DriverId(driver_id), record)| (driver_id, record))
        .collect())
}
