/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::domain::types::internal::trip::TripStatusUpdateRequest;
use crate::environment::AppState;
use crate::tools::error::AppError;
use crate::tools::logger::*;
use actix_web::web::Data;

/// Trip lifecycle signal from the trip collaborator. Terminal statuses
/// tear down the live subscription and the trip index entry.
pub async fn update_trip_status(
    data: Data<AppState>,
    trip_id: TripId,
    request_body: TripStatusUpdateRequest,
) -> Result<APISuccess, AppError> {
    info!(
        tag = "[Trip Status Changed]",
        trip_id = %trip_id.inner(),
        status = %request_body.status
    );

    data.engine
        .on_trip_status_changed(&trip_id, request_body.status)
        .await;

    Ok(APISuccess::default())
}
