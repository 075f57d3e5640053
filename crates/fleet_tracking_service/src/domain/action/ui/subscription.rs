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
use actix_web::web::{Bytes, Data};
use actix_web::HttpResponse;
use tokio::sync::mpsc;

/// Registers the subscription and turns its notification channel into a
/// streaming newline-delimited JSON body. The pushed events are
/// `driver_location_initial` once, then throttled `driver_location_update`s.
pub async fn subscribe_to_trip(
    data: Data<AppState>,
    trip_id: TripId,
    rider_id: RiderId,
) -> Result<HttpResponse, AppError> {
    let (sender, receiver) =
        mpsc::channel::<TrackingNotification>(data.subscription_queue_size.max(1));

    data.engine
        .subscribe(trip_id, rider_id, sender)
        .await?;

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        let notification = receiver.recv().await?;
        let mut line = serde_json::to_vec(&notification).unwrap_or_default();
        line.push(b'\n');
        Some((Ok::<Bytes, actix_web::Error>(Bytes::from(line)), receiver))
    });

    Ok(HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(stream))
}

pub async fn unsubscribe_from_trip(
    data: Data<AppState>,
    trip_id: TripId,
) -> Result<APISuccess, AppError> {
    data.engine.unsubscribe(&trip_id).await?;
    Ok(APISuccess::default())
}
