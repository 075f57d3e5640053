use crate::common::types::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DriverLocationUpdateRequest {
    pub pt: Point,
    pub ts: TimeStamp,
    pub acc: Option<Accuracy>,
    pub bear: Option<Direction>,
    pub speed: Option<SpeedInMeterPerSecond>,
    #[serde(rename = "tripId")]
    pub trip_id: Option<TripId>,
}
