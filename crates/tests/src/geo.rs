/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::support::point;
use fleet_tracking_service::common::geo::*;
use fleet_tracking_service::common::geo_polygon::create_multipolygon_body;
use fleet_tracking_service::common::types::*;
use geo::polygon;

#[test]
fn haversine_distance_between_known_points() {
    let origin = point(4.05, 9.77);
    let pickup = point(4.06, 9.78);

    let distance = distance_between_in_meters(&origin, &pickup);

    // ~1.11km per 0.01 degree of latitude at the equator; the diagonal of
    // this pair lands a bit above 1.5km.
    assert!(distance > 1500.0 && distance < 1650.0, "got {distance}");
}

#[test]
fn haversine_distance_of_identical_points_is_zero() {
    let origin = point(12.9716, 77.5946);
    assert_eq!(distance_between_in_meters(&origin, &origin), 0.0);
}

#[test]
fn point_in_polygon_interior_and_exterior() {
    let square = polygon![
        (x: 0.0, y: 0.0),
        (x: 10.0, y: 0.0),
        (x: 10.0, y: 10.0),
        (x: 0.0, y: 10.0),
        (x: 0.0, y: 0.0),
    ];

    assert!(point_in_polygon(&point(5.0, 5.0), &square));
    assert!(!point_in_polygon(&point(5.0, 15.0), &square));
    assert!(!point_in_polygon(&point(-1.0, 5.0), &square));
}

#[test]
fn point_in_polygon_half_open_boundary_rule() {
    let square = polygon![
        (x: 0.0, y: 0.0),
        (x: 10.0, y: 0.0),
        (x: 10.0, y: 10.0),
        (x: 0.0, y: 10.0),
        (x: 0.0, y: 0.0),
    ];

    // Lower boundary counts as inside, upper boundary as outside.
    assert!(point_in_polygon(&point(0.0, 5.0), &square));
    assert!(!point_in_polygon(&point(10.0, 5.0), &square));
}

#[test]
fn point_in_polygon_respects_holes() {
    let with_hole = geo::Polygon::new(
        geo::LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]),
        vec![geo::LineString::from(vec![
            (4.0, 4.0),
            (6.0, 4.0),
            (6.0, 6.0),
            (4.0, 6.0),
            (4.0, 4.0),
        ])],
    );

    assert!(point_in_polygon(&point(2.0, 2.0), &with_hole));
    assert!(!point_in_polygon(&point(5.0, 5.0), &with_hole));
}

#[test]
fn zone_resolution_hits_the_containing_region() {
    let zones = vec![create_multipolygon_body(
        "metro-central",
        vec![vec![vec![
            vec![9.60, 3.90],
            vec![9.95, 3.90],
            vec![9.95, 4.20],
            vec![9.60, 4.20],
            vec![9.60, 3.90],
        ]]],
    )];

    assert_eq!(
        get_zone(&Latitude(4.05), &Longitude(9.77), &zones),
        Some(ZoneName("metro-central".to_string()))
    );
    assert_eq!(get_zone(&Latitude(48.85), &Longitude(2.35), &zones), None);
}

#[test]
fn projection_onto_horizontal_segment() {
    let p1 = point(0.0, 0.0);
    let p2 = point(0.0, 10.0);

    let projected = closest_point_on_segment(&p1, &p2, &point(3.0, 5.0));
    assert_eq!(projected, point(0.0, 5.0));

    // Beyond either end the projection clamps to the endpoint.
    let clamped = closest_point_on_segment(&p1, &p2, &point(2.0, -4.0));
    assert_eq!(clamped, p1);
}

#[test]
fn projection_onto_polyline_selects_nearest_segment() {
    let route = vec![point(0.0, 0.0), point(0.0, 10.0), point(10.0, 10.0)];

    let projection =
        find_closest_point_on_route(&route, &point(4.0, 10.5)).expect("route has segments");

    assert_eq!(projection.segment_index, 1);
    assert_eq!(projection.projection_point, point(4.0, 10.0));

    assert!(find_closest_point_on_route(&route[..1], &point(1.0, 1.0)).is_none());
}

#[test]
fn bounding_box_spans_all_points() {
    let points = vec![point(4.05, 9.77), point(4.10, 9.60), point(3.95, 9.90)];

    let bbox = bounding_box(&points).expect("non-empty");

    assert_eq!(bbox.min, point(3.95, 9.60));
    assert_eq!(bbox.max, point(4.10, 9.90));

    assert!(bounding_box(&[]).is_none());
}
