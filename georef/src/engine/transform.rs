use std::fmt::{Debug, Formatter};

use geodesy::prelude::*;
use georef_types::geo::{Datum, GeoPoint, LatLon, NewGeoPoint};
use georef_types::Point2d;
use log::debug;

use super::definition::{self, Definition};
use super::resources::{ProcessResources, ResourceFinder};
use crate::error::GeorefError;

/// Largest deviation of a geographic round trip accepted by [`Transform::forward`], in degrees
/// (about a centimetre).
const GEOGRAPHIC_TOLERANCE: f64 = 1e-7;

/// Largest deviation of a projected round trip accepted by [`Transform::inverse`], in metres.
const PROJECTED_TOLERANCE: f64 = 0.01;

/// Forward and inverse transformation between geographic coordinates (WGS84, degrees) and
/// projected coordinates (metres).
///
/// The transformation owns the engine context it was built in. Dropping the value releases
/// everything the engine allocated for it.
pub struct Transform {
    context: Minimal,
    op: OpHandle,
    definition: Definition,
}

impl Transform {
    /// Builds a transformation from a CRS specification.
    ///
    /// `+init` references are resolved with the process-wide resource finder (see
    /// [`set_resource_finder`](super::set_resource_finder)) and the bundled resources.
    pub fn build(spec: &str) -> Result<Self, GeorefError> {
        Self::build_with_finder(spec, &ProcessResources)
    }

    /// Builds a transformation, resolving `+init` references with the given finder only.
    pub fn build_with_finder(spec: &str, finder: &dyn ResourceFinder) -> Result<Self, GeorefError> {
        let definition = definition::normalize(spec, finder)?;

        let mut context = Minimal::new();
        let op = context
            .op(&definition.operator)
            .map_err(|err| GeorefError::Build(err.to_string()))?;

        debug!("Built transformation '{}' from '{spec}'", definition.operator);

        Ok(Self {
            context,
            op,
            definition,
        })
    }

    /// Operator definition passed to the engine.
    pub fn definition(&self) -> &str {
        &self.definition.operator
    }

    /// Returns true if the projected coordinates of this transformation are longitude and
    /// latitude in degrees.
    pub fn is_geographic(&self) -> bool {
        self.definition.geographic
    }

    /// Ellipsoid the geographic coordinates refer to.
    ///
    /// This is WGS84 unless the specification names an ellipsoid without a shift to WGS84.
    pub fn datum(&self) -> Datum {
        self.definition.datum
    }

    /// Converts geographic coordinates to projected coordinates.
    ///
    /// Fails when the point is outside of the domain of the projection, i.e. when the result
    /// does not lead back to the point.
    pub fn forward(&self, point: &LatLon) -> Result<Point2d, GeorefError> {
        let projected = self.project(point)?;
        let back = self.unproject(&projected)?;

        let d_lat = back.lat() - point.lat();
        let d_lon = (back.lon() - point.lon() + 540.0).rem_euclid(360.0) - 180.0;
        if d_lat.hypot(d_lon * point.lat_rad().cos()) > GEOGRAPHIC_TOLERANCE {
            debug!("{point:?} is outside of the domain of '{}'", self.definition.operator);
            return Err(GeorefError::Transform);
        }

        Ok(projected)
    }

    /// Converts projected coordinates to geographic coordinates.
    ///
    /// Fails when the point is outside of the domain of the projection, i.e. when the result
    /// does not lead back to the point.
    pub fn inverse(&self, point: &Point2d) -> Result<LatLon, GeorefError> {
        let geographic = self.unproject(point)?;
        let back = self.project(&geographic)?;

        let tolerance = if self.definition.geographic {
            GEOGRAPHIC_TOLERANCE
        } else {
            PROJECTED_TOLERANCE
        };
        if (back - *point).norm() > tolerance {
            debug!("{point:?} is outside of the domain of '{}'", self.definition.operator);
            return Err(GeorefError::Transform);
        }

        Ok(geographic)
    }

    fn project(&self, point: &LatLon) -> Result<Point2d, GeorefError> {
        if !point.is_valid() {
            return Err(GeorefError::Transform);
        }

        let [x, y] = self.apply(Coor4D::geo(point.lat(), point.lon(), 0.0, 0.0), Fwd)?;
        if self.definition.geographic {
            Ok(Point2d::new(x.to_degrees(), y.to_degrees()))
        } else {
            Ok(Point2d::new(x, y))
        }
    }

    fn unproject(&self, point: &Point2d) -> Result<LatLon, GeorefError> {
        let input = if self.definition.geographic {
            Coor4D::geo(point.y, point.x, 0.0, 0.0)
        } else {
            Coor4D([point.x, point.y, 0.0, 0.0])
        };

        let [lon, lat] = self.apply(input, Inv)?;
        let result = LatLon::latlon(lat.to_degrees(), lon.to_degrees());
        if result.is_valid() {
            Ok(result)
        } else {
            Err(GeorefError::Transform)
        }
    }

    /// Applies the operator to a single coordinate. The height and time components carry the
    /// intermediate cartesian coordinates of datum shift pipelines.
    fn apply(&self, coordinate: Coor4D, direction: Direction) -> Result<[f64; 2], GeorefError> {
        let mut data = [coordinate];
        let transformed = self
            .context
            .apply(self.op, direction, &mut data)
            .map_err(|_| GeorefError::Transform)?;

        let [a, b, _, _] = data[0].0;
        if transformed == 0 || !a.is_finite() || !b.is_finite() {
            return Err(GeorefError::Transform);
        }

        Ok([a, b])
    }
}

impl Debug for Transform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("definition", &self.definition.operator)
            .field("geographic", &self.definition.geographic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use georef_types::latlon;

    fn dms(d: f64, m: f64, s: f64) -> f64 {
        d + m / 60.0 + s / 3600.0
    }

    #[test]
    fn utm_reference_point() {
        // Koblenz, LVermGeo Rheinland-Pfalz
        let transform = Transform::build("+proj=utm +zone=32 +datum=WGS84").unwrap();
        let projected = transform
            .forward(&latlon!(dms(50.0, 21.0, 32.2), dms(7.0, 34.0, 4.0)))
            .unwrap();
        assert_abs_diff_eq!(projected.x, 398125.0, epsilon = 2.2);
        assert_abs_diff_eq!(projected.y, 5579523.0, epsilon = 2.2);

        let geographic = transform.inverse(&Point2d::new(398125.0, 5579523.0)).unwrap();
        assert_abs_diff_eq!(geographic.lat(), dms(50.0, 21.0, 32.2), epsilon = 0.00005);
        assert_abs_diff_eq!(geographic.lon(), dms(7.0, 34.0, 4.0), epsilon = 0.00005);
    }

    #[test]
    fn round_trip() {
        let transform = Transform::build("+init=epsg:3035").unwrap();
        let point = latlon!(48.2, 16.37);
        let projected = transform.forward(&point).unwrap();
        let back = transform.inverse(&projected).unwrap();
        assert_abs_diff_eq!(back.lat(), point.lat(), epsilon = 1e-7);
        assert_abs_diff_eq!(back.lon(), point.lon(), epsilon = 1e-7);
    }

    #[test]
    fn geographic_crs_uses_degrees() {
        let transform = Transform::build("+init=epsg:4326").unwrap();
        assert!(transform.is_geographic());
        let projected = transform.forward(&latlon!(50.0, 7.5)).unwrap();
        assert_abs_diff_eq!(projected, Point2d::new(7.5, 50.0), epsilon = 1e-12);
        let back = transform.inverse(&projected).unwrap();
        assert_abs_diff_eq!(back.lat(), 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back.lon(), 7.5, epsilon = 1e-12);
    }

    #[test]
    fn invalid_specification() {
        assert_matches!(Transform::build("+proj=nonsense"), Err(GeorefError::Build(_)));
        assert_matches!(Transform::build("nonsense zone=1"), Err(GeorefError::Build(_)));
    }

    #[test]
    fn invalid_points() {
        let transform = Transform::build("+proj=utm +zone=32 +datum=WGS84").unwrap();
        assert_matches!(transform.forward(&latlon!(f64::NAN, 9.0)), Err(GeorefError::Transform));
        assert_matches!(transform.forward(&latlon!(91.0, 9.0)), Err(GeorefError::Transform));
        assert_matches!(
            transform.inverse(&Point2d::new(f64::INFINITY, 0.0)),
            Err(GeorefError::Transform)
        );
    }

    #[test]
    fn points_outside_of_domain() {
        let transform = Transform::build("+proj=utm +zone=32 +datum=WGS84").unwrap();
        // Nearly antipodal to the central meridian
        assert_matches!(transform.forward(&latlon!(0.0, -170.0)), Err(GeorefError::Transform));
        assert!(transform.forward(&latlon!(50.0, 15.0)).is_ok());
    }

    #[test]
    fn datum_shift() {
        // Koblenz, LVermGeo Rheinland-Pfalz, DHDN / Gauss-Krueger zone 3
        let transform = Transform::build("+init=epsg:31467").unwrap();
        assert_eq!(transform.datum(), Datum::WGS84);
        let point = latlon!(dms(50.0, 21.0, 32.2), dms(7.0, 34.0, 4.0));
        let projected = transform.forward(&point).unwrap();
        assert_abs_diff_eq!(projected.x, 3398159.0, epsilon = 2.2);
        assert_abs_diff_eq!(projected.y, 5581315.0, epsilon = 2.2);

        let back = transform.inverse(&projected).unwrap();
        assert_abs_diff_eq!(back.lat(), point.lat(), epsilon = 1e-7);
        assert_abs_diff_eq!(back.lon(), point.lon(), epsilon = 1e-7);
    }

    #[test]
    fn explicit_finder() {
        let finder = |name: &str| {
            (name == "local").then(|| "<7> +proj=utm +zone=33 +ellps=GRS80 <>".to_string())
        };
        let transform = Transform::build_with_finder("+init=local:7", &finder).unwrap();
        assert_eq!(transform.definition(), "utm zone=33 ellps=GRS80");
        assert_matches!(
            Transform::build_with_finder("+init=epsg:3857", &finder),
            Err(GeorefError::Build(_))
        );
    }
}
