/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::{geo::bounding_box, types::*};
use crate::routing::polyline::decode_polyline;
use crate::tools::{callapi::call_api, error::AppError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Resolved request handed to an adapter: every optional field of the
/// caller's `RoutingOptions` already defaulted.
#[derive(Debug, Clone)]
pub struct RouteQuery {
    pub mode: TravelMode,
    pub waypoints: Vec<Point>,
    pub alternatives: bool,
}

/// One variant per upstream provider. Adapters own request construction
/// (coordinate ordering, formatting), geometry decoding and normalization
/// into the canonical `Route`. A malformed or error-status upstream
/// response surfaces as `ProviderError`, never as partial data.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> RouteProvider;

    async fn compute_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<Route, AppError>;
}

/// Closed lookup over the provider enum. Every variant has an adapter by
/// construction, so an unknown provider is unrepresentable.
pub struct ProviderRegistry {
    osrm: Arc<dyn ProviderAdapter>,
    google_routes: Arc<dyn ProviderAdapter>,
    mapbox: Arc<dyn ProviderAdapter>,
}

impl ProviderRegistry {
    pub fn new(
        osrm: Arc<dyn ProviderAdapter>,
        google_routes: Arc<dyn ProviderAdapter>,
        mapbox: Arc<dyn ProviderAdapter>,
    ) -> Self {
        Self {
            osrm,
            google_routes,
            mapbox,
        }
    }

    pub fn adapter(&self, provider: RouteProvider) -> Arc<dyn ProviderAdapter> {
        match provider {
            RouteProvider::Osrm => self.osrm.to_owned(),
            RouteProvider::GoogleRoutes => self.google_routes.to_owned(),
            RouteProvider::Mapbox => self.mapbox.to_owned(),
        }
    }
}

fn provider_error(provider: RouteProvider, reason: impl Into<String>) -> AppError {
    AppError::ProviderError(provider.to_string(), reason.into())
}

fn route_from_parts(
    provider: RouteProvider,
    mode: TravelMode,
    encoded_geometry: &str,
    distance: Meters,
    duration: Seconds,
) -> Result<Route, AppError> {
    let geometry = decode_polyline(encoded_geometry)
        .map_err(|err| provider_error(provider, err.message()))?;

    let bounding_box = bounding_box(&geometry)
        .ok_or_else(|| provider_error(provider, "Empty route geometry"))?;

    Ok(Route {
        geometry,
        distance,
        duration,
        bounding_box,
        provider,
        mode,
        computed_at: TimeStamp(Utc::now()),
    })
}

// ---------------------------------------------------------------------------
// OSRM
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub geometry: String,
    pub distance: f64,
    pub duration: f64,
}

pub struct OsrmAdapter {
    client: Client,
    base_url: Url,
}

impl OsrmAdapter {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn profile(mode: TravelMode) -> &'static str {
        match mode {
            TravelMode::Drive | TravelMode::TwoWheeler => "driving",
            TravelMode::Walk => "walking",
            TravelMode::Bicycle => "cycling",
        }
    }

    // OSRM orders coordinates longitude-first.
    fn coordinates(origin: &Point, destination: &Point, waypoints: &[Point]) -> String {
        std::iter::once(origin)
            .chain(waypoints.iter())
            .chain(std::iter::once(destination))
            .map(|pt| format!("{},{}", pt.lon.inner(), pt.lat.inner()))
            .collect::<Vec<String>>()
            .join(";")
    }

    pub async fn fetch_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<OsrmResponse, AppError> {
        let url = Url::parse(&format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline&alternatives={}",
            self.base_url.as_str().trim_end_matches('/'),
            Self::profile(query.mode),
            Self::coordinates(origin, destination, &query.waypoints),
            query.alternatives
        ))
        .map_err(|err| AppError::InvalidRequest(err.to_string()))?;

        call_api::<OsrmResponse, String>(&self.client, Method::GET, &url, vec![], None)
            .await
            .map_err(|err| provider_error(RouteProvider::Osrm, err.message()))
    }

    pub fn normalize(response: OsrmResponse, mode: TravelMode) -> Result<Route, AppError> {
        if response.code != "Ok" {
            return Err(provider_error(
                RouteProvider::Osrm,
                format!("Response code : {}", response.code),
            ));
        }

        let route = response
            .routes
            .first()
            .ok_or_else(|| provider_error(RouteProvider::Osrm, "No routes in response"))?;

        route_from_parts(
            RouteProvider::Osrm,
            mode,
            &route.geometry,
            Meters(route.distance.max(0.0) as u32),
            Seconds(route.duration.max(0.0) as u32),
        )
    }
}

#[async_trait]
impl ProviderAdapter for OsrmAdapter {
    fn provider(&self) -> RouteProvider {
        RouteProvider::Osrm
    }

    async fn compute_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<Route, AppError> {
        let response = self.fetch_route(origin, destination, query).await?;
        Self::normalize(response, query.mode)
    }
}

// ---------------------------------------------------------------------------
// Google Routes (computeRoutes)
// ---------------------------------------------------------------------------

const GOOGLE_FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline,routes.legs.distanceMeters";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLocation {
    pub lat_lng: GoogleLatLng,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleWaypoint {
    pub location: GoogleLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRoutesRequest {
    pub origin: GoogleWaypoint,
    pub destination: GoogleWaypoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intermediates: Vec<GoogleWaypoint>,
    pub travel_mode: String,
    pub compute_alternative_routes: bool,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRoutesResponse {
    #[serde(default)]
    pub routes: Vec<GoogleRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleRoute {
    pub distance_meters: Option<u32>,
    // Durations arrive as strings with a trailing unit, e.g. "3600s".
    pub duration: String,
    pub polyline: GooglePolyline,
    #[serde(default)]
    pub legs: Vec<GoogleLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLeg {
    pub distance_meters: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePolyline {
    pub encoded_polyline: String,
}

pub struct GoogleRoutesAdapter {
    client: Client,
    compute_routes_url: Url,
    api_key: String,
}

impl GoogleRoutesAdapter {
    pub fn new(client: Client, compute_routes_url: Url, api_key: String) -> Self {
        Self {
            client,
            compute_routes_url,
            api_key,
        }
    }

    fn to_waypoint(pt: &Point) -> GoogleWaypoint {
        GoogleWaypoint {
            location: GoogleLocation {
                lat_lng: GoogleLatLng {
                    latitude: pt.lat.inner(),
                    longitude: pt.lon.inner(),
                },
            },
        }
    }

    pub async fn fetch_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<ComputeRoutesResponse, AppError> {
        let request = ComputeRoutesRequest {
            origin: Self::to_waypoint(origin),
            destination: Self::to_waypoint(destination),
            intermediates: query.waypoints.iter().map(Self::to_waypoint).collect(),
            travel_mode: query.mode.to_string(),
            compute_alternative_routes: query.alternatives,
        };

        call_api::<ComputeRoutesResponse, ComputeRoutesRequest>(
            &self.client,
            Method::POST,
            &self.compute_routes_url,
            vec![
                ("content-type", "application/json"),
                ("X-Goog-Api-Key", self.api_key.as_str()),
                ("X-Goog-FieldMask", GOOGLE_FIELD_MASK),
            ],
            Some(request),
        )
        .await
        .map_err(|err| provider_error(RouteProvider::GoogleRoutes, err.message()))
    }

    pub fn normalize(response: ComputeRoutesResponse, mode: TravelMode) -> Result<Route, AppError> {
        let route = response
            .routes
            .first()
            .ok_or_else(|| provider_error(RouteProvider::GoogleRoutes, "No routes in response"))?;

        let duration = route
            .duration
            .trim_end_matches('s')
            .parse::<u32>()
            .map_err(|_| {
                provider_error(
                    RouteProvider::GoogleRoutes,
                    format!("Unparseable duration : {}", route.duration),
                )
            })?;

        // Zero-length routes omit the top-level distance; the per-leg
        // breakdown still carries it.
        let distance = route
            .distance_meters
            .or_else(|| {
                if route.legs.is_empty() {
                    None
                } else {
                    route
                        .legs
                        .iter()
                        .map(|leg| leg.distance_meters)
                        .sum::<Option<u32>>()
                }
            })
            .ok_or_else(|| provider_error(RouteProvider::GoogleRoutes, "Missing distanceMeters"))?;

        route_from_parts(
            RouteProvider::GoogleRoutes,
            mode,
            &route.polyline.encoded_polyline,
            Meters(distance),
            Seconds(duration),
        )
    }
}

#[async_trait]
impl ProviderAdapter for GoogleRoutesAdapter {
    fn provider(&self) -> RouteProvider {
        RouteProvider::GoogleRoutes
    }

    async fn compute_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<Route, AppError> {
        let response = self.fetch_route(origin, destination, query).await?;
        Self::normalize(response, query.mode)
    }
}

// ---------------------------------------------------------------------------
// Mapbox Directions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MapboxResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
pub struct MapboxRoute {
    pub geometry: String,
    pub distance: f64,
    pub duration: f64,
}

pub struct MapboxAdapter {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl MapboxAdapter {
    pub fn new(client: Client, base_url: Url, access_token: String) -> Self {
        Self {
            client,
            base_url,
            access_token,
        }
    }

    fn profile(mode: TravelMode) -> &'static str {
        match mode {
            TravelMode::Drive | TravelMode::TwoWheeler => "driving",
            TravelMode::Walk => "walking",
            TravelMode::Bicycle => "cycling",
        }
    }

    pub async fn fetch_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<MapboxResponse, AppError> {
        let coordinates = std::iter::once(origin)
            .chain(query.waypoints.iter())
            .chain(std::iter::once(destination))
            .map(|pt| format!("{},{}", pt.lon.inner(), pt.lat.inner()))
            .collect::<Vec<String>>()
            .join(";");

        let url = Url::parse(&format!(
            "{}/directions/v5/mapbox/{}/{}?geometries=polyline&overview=full&alternatives={}&access_token={}",
            self.base_url.as_str().trim_end_matches('/'),
            Self::profile(query.mode),
            coordinates,
            query.alternatives,
            self.access_token
        ))
        .map_err(|err| AppError::InvalidRequest(err.to_string()))?;

        call_api::<MapboxResponse, String>(&self.client, Method::GET, &url, vec![], None)
            .await
            .map_err(|err| provider_error(RouteProvider::Mapbox, err.message()))
    }

    pub fn normalize(response: MapboxResponse, mode: TravelMode) -> Result<Route, AppError> {
        if response.code != "Ok" {
            return Err(provider_error(
                RouteProvider::Mapbox,
                format!("Response code : {}", response.code),
            ));
        }

        let route = response
            .routes
            .first()
            .ok_or_else(|| provider_error(RouteProvider::Mapbox, "No routes in response"))?;

        route_from_parts(
            RouteProvider::Mapbox,
            mode,
            &route.geometry,
            Meters(route.distance.max(0.0) as u32),
            Seconds(route.duration.max(0.0) as u32),
        )
    }
}

#[async_trait]
impl ProviderAdapter for MapboxAdapter {
    fn provider(&self) -> RouteProvider {
        RouteProvider::Mapbox
    }

    async fn compute_route(
        &self,
        origin: &Point,
        destination: &Point,
        query: &RouteQuery,
    ) -> Result<Route, AppError> {
        let response = self.fetch_route(origin, destination, query).await?;
        Self::normalize(response, query.mode)
    }
}
