//! Points in planar coordinates.
//!
//! Both map coordinates (millimetres on paper, y axis pointing down) and projected coordinates
//! (metres, y axis pointing north) are represented with the same point type. Which space a
//! point belongs to is determined by the method that produced it.

pub use nalgebra::{Point2, Vector2};

/// 2d point with `f64` coordinates.
pub type Point2d = Point2<f64>;

/// Euclidean distance between two planar points.
pub fn distance(a: &Point2d, b: &Point2d) -> f64 {
    nalgebra::distance(a, b)
}
