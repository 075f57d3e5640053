/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tokio::sync::mpsc::Sender;

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct TripId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct DriverId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct RiderId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct ZoneName(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct Latitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct Longitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
#[macros::impl_getter]
pub struct Direction(pub f64);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Hash, Ord)]
#[macros::impl_getter]
pub struct TimeStamp(pub DateTime<Utc>);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct Accuracy(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct SpeedInMeterPerSecond(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct Seconds(pub u32);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct Meters(pub u32);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

impl Point {
    pub fn is_in_bounds(&self) -> bool {
        let Latitude(lat) = self.lat;
        let Longitude(lon) = self.lon;
        (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
    }
}

/// A single position report as captured by the driver device. Immutable.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub pt: Point,
    pub ts: TimeStamp,
    pub acc: Option<Accuracy>,
    pub bear: Option<Direction>,
    pub speed: Option<SpeedInMeterPerSecond>,
}

#[derive(Debug, Clone, EnumString, EnumIter, Display, Serialize, Deserialize, Eq, Hash, PartialEq, Copy)]
pub enum TravelMode {
    #[strum(serialize = "DRIVE")]
    #[serde(rename = "DRIVE")]
    Drive,
    #[strum(serialize = "WALK")]
    #[serde(rename = "WALK")]
    Walk,
    #[strum(serialize = "BICYCLE")]
    #[serde(rename = "BICYCLE")]
    Bicycle,
    #[strum(serialize = "TWO_WHEELER")]
    #[serde(rename = "TWO_WHEELER")]
    TwoWheeler,
}

/// Closed set of routing providers. Selection is by enum value, so an
/// unknown provider cannot reach the adapters at runtime.
#[derive(Debug, Clone, EnumString, EnumIter, Display, Serialize, Deserialize, Eq, Hash, PartialEq, Copy)]
pub enum RouteProvider {
    #[strum(serialize = "OSRM")]
    #[serde(rename = "OSRM")]
    Osrm,
    #[strum(serialize = "GOOGLE_ROUTES")]
    #[serde(rename = "GOOGLE_ROUTES")]
    GoogleRoutes,
    #[strum(serialize = "MAPBOX")]
    #[serde(rename = "MAPBOX")]
    Mapbox,
}

#[derive(Debug, Clone, EnumString, EnumIter, Display, Serialize, Deserialize, Eq, Hash, PartialEq, Copy)]
pub enum TripStatus {
    ACCEPTED,
    #[strum(serialize = "DRIVER_EN_ROUTE")]
    #[serde(rename = "DRIVER_EN_ROUTE")]
    DriverEnRoute,
    ARRIVED,
    INPROGRESS,
    COMPLETED,
    CANCELLED,
}

impl TripStatus {
    /// Statuses during which a rider may hold a live subscription.
    pub fn is_trackable(&self) -> bool {
        matches!(
            self,
            TripStatus::ACCEPTED
                | TripStatus::DriverEnRoute
                | TripStatus::ARRIVED
                | TripStatus::INPROGRESS
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::COMPLETED | TripStatus::CANCELLED)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub status: TripStatus,
    pub pickup_location: Point,
    pub destination_location: Point,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

/// Canonical route, normalized from whichever provider produced it.
/// Immutable after creation; shared across requests through the cache.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub geometry: Vec<Point>,
    pub distance: Meters,
    pub duration: Seconds,
    pub bounding_box: BoundingBox,
    pub provider: RouteProvider,
    pub mode: TravelMode,
    pub computed_at: TimeStamp,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteEta {
    pub duration: Seconds,
    pub distance: Meters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoutingOptions {
    pub mode: Option<TravelMode>,
    pub provider: Option<RouteProvider>,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub alternatives: bool,
}

/// Latest known position of a driver. Owned by `DriverLocationStore`;
/// last write wins per driver.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocationRecord {
    pub driver_id: DriverId,
    pub location: Location,
    pub trip_id: Option<TripId>,
    pub updated_at: TimeStamp,
}

/// One position report flowing through the broadcast engine. Reports for
/// the same driver are consumed in arrival order by a single worker.
#[derive(Clone, Debug)]
pub struct DriverReport {
    pub driver_id: DriverId,
    pub location: Location,
    pub trip_id: Option<TripId>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotificationKind {
    #[serde(rename = "driver_location_initial")]
    Initial,
    #[serde(rename = "driver_location_update")]
    Update,
}

/// Event pushed to the single subscribed rider connection of a trip.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackingNotification {
    pub kind: NotificationKind,
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub location: Location,
    pub eta: Option<RouteEta>,
    pub distance_to_target: Meters,
    pub ts: TimeStamp,
}

pub type ConnectionHandle = Sender<TrackingNotification>;

/// Live rider subscription for a trip. At most one per trip; the latest
/// subscribe call replaces the prior one.
#[derive(Clone)]
pub struct TripSubscription {
    pub trip_id: TripId,
    pub rider_id: RiderId,
    pub connection: ConnectionHandle,
    pub subscribed_at: TimeStamp,
    pub last_notified_at: Option<TimeStamp>,
    pub last_location: Option<Point>,
}

#[derive(Clone)]
pub struct MultiPolygonBody {
    pub region: String,
    pub multipolygon: MultiPolygon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionPoint {
    pub segment_index: usize,
    pub projection_point: Point,
    pub projection_point_to_point_distance: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct APISuccess {
    result: String,
}

impl Default for APISuccess {
    fn default() -> Self {
        Self {
            result: "Success".to_string(),
        }
    }
}
