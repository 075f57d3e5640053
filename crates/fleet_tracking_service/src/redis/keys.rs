/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;

/// Route cache key. Coordinates are rounded to 4 decimal places (~11m) so
/// that logically identical requests inside the validity window always
/// derive the same key.
pub fn route_cache_key(
    provider: &RouteProvider,
    mode: &TravelMode,
    origin: &Point,
    destination: &Point,
) -> String {
    format!(
        "fts:route:{provider}:{mode}:{:.4}:{:.4}:{:.4}:{:.4}",
        origin.lat.inner(),
        origin.lon.inner(),
        destination.lat.inner(),
        destination.lon.inner()
    )
}
