//! Points in geographic coordinates (latitude and longitude) and the ellipsoid they refer to.

mod datum;
mod point;

pub use datum::Datum;
pub use point::{GeoPoint, LatLon, NewGeoPoint};
