/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use crate::common::{kafka::push_to_kafka, types::*};
use crate::tools::{callapi::call_api, error::AppError};
use async_trait::async_trait;
use rdkafka::producer::FutureProducer;
use reqwest::{Client, Method, Url};

/// Authorization collaborator. Must be consulted before accepting a
/// trip-bound location update or a subscribe request.
#[async_trait]
pub trait TripAccessValidator: Send + Sync {
    async fn validate_rider_trip_access(
        &self,
        rider_id: &RiderId,
        trip_id: &TripId,
    ) -> Result<bool, AppError>;

    async fn validate_driver_trip_access(
        &self,
        driver_id: &DriverId,
        trip_id: &TripId,
    ) -> Result<bool, AppError>;
}

/// Trip state collaborator: subscription eligibility and the ETA target
/// (pickup vs destination) both derive from its answer.
#[async_trait]
pub trait TripStatusProvider: Send + Sync {
    async fn get_trip_status(&self, trip_id: &TripId) -> Result<TripDetails, AppError>;
}

/// Durable persistence collaborator. Strictly fire-and-forget: failures
/// are absorbed here and never reach the broadcast path.
#[async_trait]
pub trait LocationPersistor: Send + Sync {
    async fn persist(&self, payload: LocationStorePayload);
}

pub struct HttpAccessValidator {
    client: Client,
    access_check_url: Url,
    api_key: String,
}

impl HttpAccessValidator {
    pub fn new(client: Client, access_check_url: Url, api_key: String) -> Self {
        Self {
            client,
            access_check_url,
            api_key,
        }
    }

    async fn check(&self, party_header: (&str, &str), trip_id: &TripId) -> Result<bool, AppError> {
        let response = call_api::<AccessCheckResponse, String>(
            &self.client,
            Method::GET,
            &self.access_check_url,
            vec![
                ("content-type", "application/json"),
                ("api-key", self.api_key.as_str()),
                ("trip-id", trip_id.inner().as_str()),
                party_header,
            ],
            None,
        )
        .await?;

        Ok(response.allowed)
    }
}

#[async_trait]
impl TripAccessValidator for HttpAccessValidator {
    async fn validate_rider_trip_access(
        &self,
        rider_id: &RiderId,
        trip_id: &TripId,
    ) -> Result<bool, AppError> {
        self.check(("rider-id", rider_id.inner().as_str()), trip_id)
            .await
    }

    async fn validate_driver_trip_access(
        &self,
        driver_id: &DriverId,
        trip_id: &TripId,
    ) -> Result<bool, AppError> {
        self.check(("driver-id", driver_id.inner().as_str()), trip_id)
            .await
    }
}

pub struct HttpTripStatusProvider {
    client: Client,
    trip_status_url: Url,
    api_key: String,
}

impl HttpTripStatusProvider {
    pub fn new(client: Client, trip_status_url: Url, api_key: String) -> Self {
        Self {
            client,
            trip_status_url,
            api_key,
        }
    }
}

#[async_trait]
impl TripStatusProvider for HttpTripStatusProvider {
    async fn get_trip_status(&self, trip_id: &TripId) -> Result<TripDetails, AppError> {
        call_api::<TripDetails, String>(
            &self.client,
            Method::GET,
            &self.trip_status_url,
            vec![
                ("content-type", "application/json"),
                ("api-key", self.api_key.as_str()),
                ("trip-id", trip_id.inner().as_str()),
            ],
            None,
        )
        .await
    }
}

/// Kafka-backed persistence. An absent producer (broker unreachable at
/// boot) degrades to logging; the real-time path is unaffected either way.
pub struct KafkaLocationPersistor {
    producer: Option<FutureProducer>,
    topic: String,
}

impl KafkaLocationPersistor {
    pub fn new(producer: Option<FutureProducer>, topic: String) -> Self {
        Self { producer, topic }
    }
}

#[async_trait]
impl LocationPersistor for KafkaLocationPersistor {
    async fn persist(&self, payload: LocationStorePayload) {
        let DriverId(key) = payload.d_id.to_owned();
        push_to_kafka(&self.producer, &self.topic, key.as_str(), payload).await;
    }
}
