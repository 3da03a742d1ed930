//! Adapter around the `geodesy` transformation engine.
//!
//! A [`Transform`] is built from a CRS specification string and converts points between
//! geographic coordinates and the projected coordinates of that CRS.

mod definition;
mod resources;
mod transform;

pub use resources::{reset_resource_finder, set_resource_finder, BundledResources, ResourceFinder};
pub use transform::Transform;
