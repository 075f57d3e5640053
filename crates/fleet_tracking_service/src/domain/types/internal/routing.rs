use crate::common::types::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub origin: Point,
    pub destination: Point,
    #[serde(default)]
    pub options: RoutingOptions,
}
