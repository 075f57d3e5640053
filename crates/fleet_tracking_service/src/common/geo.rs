/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::f64::consts::PI;

fn deg2rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn distance_between_in_meters(latlong1: &Point, latlong2: &Point) -> f64 {
    // Calculating using haversine formula
    // Radius of Earth in meters
    let r: f64 = 6371000.0;

    let Latitude(lat1) = latlong1.lat;
    let Longitude(lon1) = latlong1.lon;
    let Latitude(lat2) = latlong2.lat;
    let Longitude(lon2) = latlong2.lon;

    let dlat = deg2rad(lat2 - lat1);
    let dlon = deg2rad(lon2 - lon1);

    let rlat1 = deg2rad(lat1);
    let rlat2 = deg2rad(lat2);

    let sq = |x: f64| x * x;

    // Calculated distance is real (not imaginary) when 0 <= h <= 1
    // Ideally in our use case h wouldn't go out of bounds
    let h = sq((dlat / 2.0).sin()) + rlat1.cos() * rlat2.cos() * sq((dlon / 2.0).sin());

    2.0 * r * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Even-odd ray casting against a single closed ring.
///
/// Boundary convention is half-open: an edge is counted when the ring
/// vertices straddle the point's latitude with a strict `>` on one side,
/// so points on a lower/left boundary test inside and points on an
/// upper/right boundary test outside. Antimeridian-crossing and
/// pole-adjacent rings are not supported.
fn point_in_ring(pt: &Point, ring: &[Coord<f64>]) -> bool {
    let x = pt.lon.inner();
    let y = pt.lat.inner();

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn ring_coords(line: &LineString<f64>) -> &[Coord<f64>] {
    &line.0
}

pub fn point_in_polygon(pt: &Point, polygon: &Polygon<f64>) -> bool {
    let exterior = ring_coords(polygon.exterior());
    if exterior.len() < 3 || !point_in_ring(pt, exterior) {
        return false;
    }
    !polygon
        .interiors()
        .iter()
        .any(|hole| ring_coords(hole).len() >= 3 && point_in_ring(pt, ring_coords(hole)))
}

pub fn multipolygon_contains(multipolygon: &MultiPolygon<f64>, pt: &Point) -> bool {
    multipolygon
        .0
        .iter()
        .any(|polygon| point_in_polygon(pt, polygon))
}

/// Resolves the zone a point falls in, if any. Zone membership only
/// enriches persisted payloads, so a miss is not an error.
pub fn get_zone(lat: &Latitude, lon: &Longitude, polygon: &[MultiPolygonBody]) -> Option<ZoneName> {
    let pt = Point {
        lat: *lat,
        lon: *lon,
    };
    polygon
        .iter()
        .find(|multi_polygon_body| multipolygon_contains(&multi_polygon_body.multipolygon, &pt))
        .map(|multi_polygon_body| ZoneName(multi_polygon_body.region.to_owned()))
}

pub fn closest_point_on_segment(p1: &Point, p2: &Point, p: &Point) -> Point {
    let x = p.lon.inner();
    let y = p.lat.inner();
    let x1 = p1.lon.inner();
    let y1 = p1.lat.inner();
    let x2 = p2.lon.inner();
    let y2 = p2.lat.inner();

    let a = x - x1;
    let b = y - y1;
    let c = x2 - x1;
    let d = y2 - y1;

    let dot = a * c + b * d;
    let len_sq = c * c + d * d;
    let mut param = -1.0;

    if len_sq != 0.0 {
        param = dot / len_sq;
    }

    let xx;
    let yy;

    if param < 0.0 {
        xx = x1;
        yy = y1;
    } else if param > 1.0 {
        xx = x2;
        yy = y2;
    } else {
        xx = x1 + param * c;
        yy = y1 + param * d;
    }

    Point {
        lat: Latitude(yy),
        lon: Longitude(xx),
    }
}

pub fn find_closest_point_on_route(route: &[Point], pt: &Point) -> Option<ProjectionPoint> {
    if route.len() < 2 {
        return None;
    }

    let mut closest: Option<ProjectionPoint> = None;
    for i in 0..route.len() - 1 {
        let projection = closest_point_on_segment(&route[i], &route[i + 1], pt);
        let distance = distance_between_in_meters(&projection, pt);
        if closest
            .as_ref()
            .map(|c| distance < c.projection_point_to_point_distance)
            .unwrap_or(true)
        {
            closest = Some(ProjectionPoint {
                segment_index: i,
                projection_point: projection,
                projection_point_to_point_distance: distance,
            });
        }
    }
    closest
}

pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let init = BoundingBox {
        min: *first,
        max: *first,
    };
    Some(points.iter().skip(1).fold(init, |bbox, pt| BoundingBox {
        min: Point {
            lat: Latitude(bbox.min.lat.inner().min(pt.lat.inner())),
            lon: Longitude(bbox.min.lon.inner().min(pt.lon.inner())),
        },
        max: Point {
            lat: Latitude(bbox.max.lat.inner().max(pt.lat.inner())),
            lon: Longitude(bbox.max.lon.inner().max(pt.lon.inner())),
        },
    }))
}
