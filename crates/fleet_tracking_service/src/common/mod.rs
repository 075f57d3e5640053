pub mod geo;
pub mod geo_polygon;
pub mod kafka;
pub mod types;
