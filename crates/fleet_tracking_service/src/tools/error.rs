/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    error_message: String,
    pub error_code: String,
}

#[macros::add_error]
pub enum AppError {
    InternalError(String),
    InvalidRequest(String),
    InvalidLocation(f64, f64),
    AccessDenied(String, String),
    InvalidTripStatus(String, String),
    SubscriptionNotFound(String),
    DriverLocationNotFound(String),
    ProviderError(String, String),
    RoutingUnavailable,
    RequestTimeout,
    ExternalAPICallError(String),
    SerializationError(String),
    DeserializationError(String),
    PersistenceFailure(String),
    InvalidConfiguration(String),
}

impl AppError {
    fn error_message(&self) -> ErrorBody {
        ErrorBody {
            error_message: self.message(),
            error_code: self.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::InternalError(err) => err.to_string(),
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::InvalidLocation(lat, lon) => {
                format!("Coordinates out of range : (Lat : {lat}, Lon : {lon})")
            }
            AppError::AccessDenied(party_id, trip_id) => {
                format!("Party {party_id} is not authorized for trip {trip_id}")
            }
            AppError::InvalidTripStatus(trip_id, trip_status) => {
                format!("Invalid Trip Status : TripId - {trip_id}, Trip Status - {trip_status}")
            }
            AppError::SubscriptionNotFound(trip_id) => {
                format!("No live subscription for trip {trip_id}")
            }
            AppError::DriverLocationNotFound(id) => {
                format!("No live location known for {id}")
            }
            AppError::ProviderError(provider, reason) => {
                format!("Routing provider {provider} failed : {reason}")
            }
            AppError::RoutingUnavailable => "All routing providers exhausted".to_string(),
            AppError::ExternalAPICallError(err) => err.to_string(),
            AppError::SerializationError(err) => err.to_string(),
            AppError::DeserializationError(err) => err.to_string(),
            AppError::PersistenceFailure(err) => {
                format!("Durable persistence failed : {err}")
            }
            AppError::InvalidConfiguration(err) => err.to_string(),
            _ => "Some Error Occured".to_string(),
        }
    }

    fn code(&self) -> String {
        match self {
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::InvalidLocation(_, _) => "INVALID_LOCATION",
            AppError::AccessDenied(_, _) => "ACCESS_DENIED",
            AppError::InvalidTripStatus(_, _) => "INVALID_TRIP_STATUS",
            AppError::SubscriptionNotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            AppError::DriverLocationNotFound(_) => "DRIVER_LOCATION_NOT_FOUND",
            AppError::ProviderError(_, _) => "PROVIDER_ERROR",
            AppError::RoutingUnavailable => "ROUTING_UNAVAILABLE",
            AppError::RequestTimeout => "REQUEST_TIMEOUT",
            AppError::ExternalAPICallError(_) => "EXTERNAL_API_CALL_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::DeserializationError(_) => "DESERIALIZATION_ERROR",
            AppError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            AppError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
        }
        .to_string()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.error_message())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidLocation(_, _) => StatusCode::BAD_REQUEST,
            AppError::AccessDenied(_, _) => StatusCode::FORBIDDEN,
            AppError::InvalidTripStatus(_, _) => StatusCode::BAD_REQUEST,
            AppError::SubscriptionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DriverLocationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ProviderError(_, _) => StatusCode::BAD_GATEWAY,
            AppError::RoutingUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::ExternalAPICallError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DeserializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
