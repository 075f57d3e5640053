/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::domain::types::internal::routing::RouteRequest;
use crate::environment::AppState;
use crate::tools::error::AppError;
use crate::tools::logger::*;
use actix_web::web::Data;

#[macros::measure_duration]
pub async fn get_route(data: Data<AppState>, request_body: RouteRequest) -> Result<Route, AppError> {
    data.aggregator
        .get_route(
            &request_body.origin,
            &request_body.destination,
            &request_body.options,
        )
        .await
}

#[macros::measure_duration]
pub async fn get_eta(
    data: Data<AppState>,
    request_body: RouteRequest,
) -> Result<RouteEta, AppError> {
    data.aggregator
        .calculate_eta(
            &request_body.origin,
            &request_body.destination,
            &request_body.options,
        )
        .await
}
