use georef_types::Point2d;
use log::warn;
use serde::{Deserialize, Serialize};

use super::Georeferencing;

/// Differences below this are treated as numerical noise when restoring derived values.
const RESTORE_EPSILON: f64 = 1e-9;

/// Persisted form of a [`Georeferencing`], with the fields stored in project documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoreferencingRecord {
    /// Identifier of the CRS or CRS template. Empty for local georeferencing.
    pub projected_crs_id: String,
    /// CRS specification. Empty for local georeferencing.
    pub projected_crs_spec: String,
    /// Map scale denominator.
    pub scale_denominator: u32,
    /// Grid scale factor.
    pub combined_scale_factor: f64,
    /// Additional scale factor.
    pub auxiliary_scale_factor: f64,
    /// Magnetic declination in degrees.
    pub declination: f64,
    /// Grivation in degrees.
    pub grivation: f64,
    /// Reference point in map coordinates.
    pub map_ref_point: Point2d,
    /// Reference point in projected coordinates.
    pub projected_ref_point: Point2d,
}

impl Default for GeoreferencingRecord {
    fn default() -> Self {
        Self::from(&Georeferencing::new())
    }
}

impl From<&Georeferencing> for GeoreferencingRecord {
    fn from(georef: &Georeferencing) -> Self {
        Self {
            projected_crs_id: georef.projected_crs_id.clone(),
            projected_crs_spec: georef.projected_crs_spec.clone(),
            scale_denominator: georef.scale_denominator,
            combined_scale_factor: georef.grid.combined_scale_factor(),
            auxiliary_scale_factor: georef.grid.auxiliary_scale_factor(),
            declination: georef.grid.declination(),
            grivation: georef.grid.grivation(),
            map_ref_point: georef.map_ref_point,
            projected_ref_point: georef.projected_ref_point,
        }
    }
}

impl From<&GeoreferencingRecord> for Georeferencing {
    fn from(record: &GeoreferencingRecord) -> Self {
        let mut georef = Georeferencing::new();

        if let Err(err) = georef.set_scale_denominator(record.scale_denominator) {
            warn!("Ignoring stored scale denominator: {err}");
        }
        if let Err(err) = georef.set_auxiliary_scale_factor(record.auxiliary_scale_factor) {
            warn!("Ignoring stored auxiliary scale factor: {err}");
        }
        georef.map_ref_point = record.map_ref_point;
        georef.projected_ref_point = record.projected_ref_point;

        if record.projected_crs_spec.is_empty() {
            return georef;
        }

        if georef.set_projected_crs(&record.projected_crs_id, &record.projected_crs_spec, &[]) {
            if let Err(err) = georef.set_projected_ref_point(record.projected_ref_point) {
                warn!("Stored projected reference point cannot be transformed: {err}");
            }
        }

        let combined_scale_factor = record.combined_scale_factor;
        if (combined_scale_factor - georef.grid.combined_scale_factor()).abs() > RESTORE_EPSILON {
            if let Err(err) = georef.set_combined_scale_factor(combined_scale_factor) {
                warn!("Ignoring stored combined scale factor: {err}");
            }
        }

        georef.grid.set_declination(record.declination);
        if (record.grivation - georef.grid.grivation()).abs() > RESTORE_EPSILON {
            georef.grid.set_grivation(record.grivation);
        }

        georef
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::georeferencing::State;
    use approx::assert_abs_diff_eq;
    use georef_types::geo::GeoPoint;
    use georef_types::latlon;

    const UTM32: &str = "+proj=utm +zone=32 +datum=WGS84";

    #[test]
    fn local_record() {
        let record = GeoreferencingRecord::default();
        assert_eq!(record.projected_crs_spec, "");
        assert_eq!(record.scale_denominator, 1000);
        assert_eq!(record.combined_scale_factor, 1.0);

        let georef = Georeferencing::from(&record);
        assert!(georef.is_local());
        assert_eq!(GeoreferencingRecord::from(&georef), record);
    }

    #[test]
    fn field_names() {
        let json = serde_json::to_value(GeoreferencingRecord::default()).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "auxiliary_scale_factor",
                "combined_scale_factor",
                "declination",
                "grivation",
                "map_ref_point",
                "projected_crs_id",
                "projected_crs_spec",
                "projected_ref_point",
                "scale_denominator",
            ]
        );
        assert_eq!(json["map_ref_point"], serde_json::json!([0.0, 0.0]));
    }

    #[test]
    fn geospatial_round_trip() {
        let mut georef = Georeferencing::new();
        assert!(georef.set_projected_crs("UTM", UTM32, &["32"]));
        georef.set_geographic_ref_point(latlon!(50.0, 10.0)).unwrap();
        georef.set_scale_denominator(15000).unwrap();
        georef.set_auxiliary_scale_factor(1.01).unwrap();
        georef.set_declination(2.5);
        georef.set_map_ref_point(Point2d::new(10.0, -20.0));

        let json = serde_json::to_string(&georef.to_record()).unwrap();
        let record: GeoreferencingRecord = serde_json::from_str(&json).unwrap();
        let restored = Georeferencing::from_record(&record);

        assert_eq!(restored.state(), &State::Geospatial);
        assert_eq!(restored.scale_denominator(), 15000);
        assert_eq!(restored.auxiliary_scale_factor(), 1.01);
        assert_eq!(restored.map_ref_point(), Point2d::new(10.0, -20.0));
        assert_eq!(restored.projected_ref_point(), georef.projected_ref_point());
        assert!(!restored.grid_compensation().is_combined_scale_factor_pinned());
        assert_abs_diff_eq!(
            restored.combined_scale_factor(),
            georef.combined_scale_factor(),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(restored.convergence(), georef.convergence(), epsilon = 1e-9);
        assert_eq!(restored.declination(), 2.5);
        assert_eq!(restored.grivation_error(), 0.0);

        let geographic = restored.geographic_ref_point().unwrap();
        assert_abs_diff_eq!(geographic.lat(), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geographic.lon(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn explicit_values_are_restored() {
        let mut georef = Georeferencing::new();
        assert!(georef.set_projected_crs("UTM", UTM32, &[]));
        georef.set_geographic_ref_point(latlon!(50.0, 10.0)).unwrap();
        georef.set_combined_scale_factor(1.25).unwrap();
        georef.set_declination(1.0);
        georef.set_grivation(5.0);

        let restored = Georeferencing::from_record(&georef.to_record());
        assert_eq!(restored.combined_scale_factor(), 1.25);
        assert!(restored.grid_compensation().is_combined_scale_factor_pinned());
        assert_eq!(restored.grivation(), 5.0);
        assert_abs_diff_eq!(restored.grivation_error(), georef.grivation_error(), epsilon = 1e-9);
        assert!(restored.grivation_error().abs() > 1.0);
    }

    #[test]
    fn invalid_specification_is_kept() {
        let record = GeoreferencingRecord {
            projected_crs_id: "broken".into(),
            projected_crs_spec: "+proj=nonsense".into(),
            ..Default::default()
        };
        let georef = Georeferencing::from_record(&record);
        assert!(!georef.is_valid());
        assert_eq!(georef.projected_crs_spec(), "+proj=nonsense");
        assert_eq!(georef.to_record().projected_crs_spec, "+proj=nonsense");
    }
}
