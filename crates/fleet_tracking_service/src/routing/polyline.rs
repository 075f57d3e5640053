/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::tools::error::AppError;

// Signed delta encoding over the base-64 alphabet starting at '?' (63),
// 1e-5 coordinate precision. All providers we integrate ship this format.
const PRECISION: f64 = 100000.0;

fn encode_value(value: i64, encoded: &mut String) {
    let mut value = if value < 0 {
        !(value << 1)
    } else {
        value << 1
    };
    while value >= 0x20 {
        encoded.push((((0x20 | (value & 0x1F)) + 63) as u8) as char);
        value >>= 5;
    }
    encoded.push(((value + 63) as u8) as char);
}

pub fn encode_polyline(points: &[Point]) -> String {
    let mut encoded = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in points {
        let lat = (point.lat.inner() * PRECISION).round() as i64;
        let lon = (point.lon.inner() * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lon - prev_lon, &mut encoded);
        prev_lat = lat;
        prev_lon = lon;
    }

    encoded
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, AppError> {
    let mut shift: u32 = 0;
    let mut result: i64 = 0;

    loop {
        let byte = *bytes.get(*index).ok_or_else(|| {
            AppError::DeserializationError("Truncated polyline chunk".to_string())
        })?;
        if byte < 63 {
            return Err(AppError::DeserializationError(format!(
                "Invalid polyline byte : {byte}"
            )));
        }
        *index += 1;
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1F) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    if result & 1 == 1 {
        Ok(!(result >> 1))
    } else {
        Ok(result >> 1)
    }
}

/// Deltas are accumulated as integers so that a sequence of coordinates
/// rounded to 5 decimal places round-trips exactly through
/// `decode_polyline(encode_polyline(points))`.
pub fn decode_polyline(encoded: &str) -> Result<Vec<Point>, AppError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat += decode_value(bytes, &mut index)?;
        lon += decode_value(bytes, &mut index)?;

        points.push(Point {
            lat: Latitude(lat as f64 / PRECISION),
            lon: Longitude(lon as f64 / PRECISION),
        });
    }

    Ok(points)
}
