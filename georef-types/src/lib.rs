//! Primitive types shared by the georeferencing engine: points in geographic coordinates
//! (see [`geo::LatLon`]), the reference ellipsoid (see [`geo::Datum`]) and points in planar
//! coordinates (see [`cartesian::Point2d`]).

pub mod cartesian;
pub mod geo;

pub use cartesian::Point2d;
pub use geo::{Datum, GeoPoint, LatLon, NewGeoPoint};
