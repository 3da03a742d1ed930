//! Georeferencing of map documents.
//!
//! A [`Georeferencing`] ties the local drawing surface of a map (map coordinates, millimetres on
//! paper) to the projected coordinates of a coordinate reference system (CRS) and to WGS84
//! latitude and longitude. Without a CRS it works in local mode, where only the map scale
//! applies.
//!
//! ```
//! use georef::Georeferencing;
//! use georef_types::latlon;
//!
//! let mut georef = Georeferencing::new();
//! assert!(georef.set_projected_crs("UTM", "+proj=utm +zone=32 +datum=WGS84", &["32"]));
//! georef.set_geographic_ref_point(latlon!(50.0, 10.0)).unwrap();
//!
//! let projected = georef.to_projected_coords(&latlon!(50.01, 10.01)).unwrap();
//! let map = georef.to_map_coord_f(&projected);
//! ```
//!
//! CRS specifications are built into transformations by the [`engine`]. Frequently used CRSs
//! are available as parametrized templates in the [`crs`] module.

pub mod crs;
pub mod engine;
pub mod error;
pub mod georeferencing;

pub use crs::{CrsTemplate, CrsTemplateRegistry};
pub use engine::Transform;
pub use error::GeorefError;
pub use georeferencing::{Georeferencing, GeoreferencingRecord, GridCompensation, State};

pub use georef_types;
