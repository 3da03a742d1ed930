use georef_types::geo::{GeoPoint, LatLon, NewGeoPoint};

use crate::engine::Transform;
use crate::error::GeorefError;

/// Latitude and longitude step of the central differences, in degrees (about one metre).
const STEP: f64 = 1e-5;

/// Local distortion of a projection at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Distortion {
    /// Scale factor along the meridian.
    pub meridian_scale: f64,
    /// Scale factor along the parallel.
    pub parallel_scale: f64,
    /// Ratio of a projected area to the corresponding area on the ellipsoid.
    pub areal_scale: f64,
    /// Angle from grid north to true north in degrees, positive when grid north is east of
    /// true north.
    pub convergence: f64,
}

impl Distortion {
    /// Estimates the distortion of `transform` at `point` from the Jacobian of the forward
    /// transformation. Lengths on the ground refer to the ellipsoid of the geographic
    /// coordinates.
    pub fn measure(transform: &Transform, point: &LatLon) -> Result<Self, GeorefError> {
        let (lat, lon) = (point.lat(), point.lon());
        if lat.abs() + STEP >= 90.0 {
            return Err(GeorefError::Transform);
        }

        let north = transform.forward(&LatLon::latlon(lat + STEP, lon))?;
        let south = transform.forward(&LatLon::latlon(lat - STEP, lon))?;
        let east = transform.forward(&LatLon::latlon(lat, lon + STEP))?;
        let west = transform.forward(&LatLon::latlon(lat, lon - STEP))?;

        let delta = (2.0 * STEP).to_radians();
        let d_phi = (north - south) / delta;
        let d_lambda = (east - west) / delta;

        let datum = transform.datum();
        let m = datum.meridional_radius(point.lat_rad());
        let n = datum.parallel_radius(point.lat_rad());

        let areal_scale = (d_phi.x * d_lambda.y - d_phi.y * d_lambda.x).abs() / (m * n);
        if !areal_scale.is_normal() {
            return Err(GeorefError::Transform);
        }

        Ok(Self {
            meridian_scale: d_phi.norm() / m,
            parallel_scale: d_lambda.norm() / n,
            areal_scale,
            convergence: (-d_phi.x).atan2(d_phi.y).to_degrees(),
        })
    }

    /// Linear scale factor averaged over all directions in the sense of areas.
    pub fn linear_scale(&self) -> f64 {
        self.areal_scale.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use georef_types::geo::Datum;
    use georef_types::latlon;

    fn measure(spec: &str, point: LatLon) -> Distortion {
        let transform = Transform::build(spec).unwrap();
        Distortion::measure(&transform, &point).unwrap()
    }

    #[test]
    fn utm_central_meridian() {
        let distortion = measure("+proj=utm +zone=32 +datum=WGS84", latlon!(50.0, 9.0));
        assert_abs_diff_eq!(distortion.meridian_scale, 0.9996, epsilon = 1e-6);
        assert_abs_diff_eq!(distortion.parallel_scale, 0.9996, epsilon = 1e-6);
        assert_abs_diff_eq!(distortion.linear_scale(), 0.9996, epsilon = 1e-6);
        assert_abs_diff_eq!(distortion.convergence, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn utm_convergence_sign() {
        // East of the central meridian grid north is east of true north.
        let east = measure("+proj=utm +zone=32 +datum=WGS84", latlon!(50.0, 11.0));
        assert!(east.convergence > 0.0);
        // gamma ~ (lon - lon_0) * sin(lat)
        assert_abs_diff_eq!(east.convergence, 2.0 * 50f64.to_radians().sin(), epsilon = 0.01);

        let west = measure("+proj=utm +zone=32 +datum=WGS84", latlon!(50.0, 7.0));
        assert_abs_diff_eq!(west.convergence, -east.convergence, epsilon = 1e-6);
    }

    #[test]
    fn web_mercator_is_not_conformal() {
        let phi = 50f64.to_radians();
        let e2 = Datum::WGS84.eccentricity_sq();
        let w = 1.0 - e2 * phi.sin().powi(2);
        let scale_x = w.sqrt() / phi.cos();
        let scale_y = w.powf(1.5) / (1.0 - e2) / phi.cos();

        let distortion = measure("+init=epsg:3857", latlon!(50.0, 6.48));
        assert_abs_diff_eq!(distortion.parallel_scale, scale_x, epsilon = 1e-6);
        assert_abs_diff_eq!(distortion.meridian_scale, scale_y, epsilon = 1e-6);
        assert_abs_diff_eq!(distortion.linear_scale(), (scale_x * scale_y).sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(distortion.convergence, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn scale_refers_to_ellipsoid_of_the_crs() {
        // Without a datum shift, latitude and longitude are on the Bessel ellipsoid.
        let bessel = measure(
            "+proj=tmerc +lon_0=9 +k=1 +x_0=500000 +ellps=bessel",
            latlon!(50.0, 9.0),
        );
        assert_abs_diff_eq!(bessel.linear_scale(), 1.0, epsilon = 1e-7);

        // With a datum shift they are WGS84, the shift itself barely scales.
        let shifted = measure("+init=epsg:31467", latlon!(50.0, 9.0));
        assert_abs_diff_eq!(shifted.linear_scale(), 1.0, epsilon = 5e-5);
        assert_abs_diff_eq!(shifted.convergence, 0.0, epsilon = 0.01);
    }

    #[test]
    fn pole_is_rejected() {
        let transform = Transform::build("+proj=utm +zone=32 +datum=WGS84").unwrap();
        assert!(Distortion::measure(&transform, &latlon!(90.0, 9.0)).is_err());
    }
}
