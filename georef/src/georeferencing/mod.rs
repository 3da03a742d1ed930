//! The georeferencing of a map: the relation between map coordinates, projected coordinates of
//! a CRS and geographic coordinates.
//!
//! Map coordinates are millimetres on paper with the y axis pointing down. They are related to
//! projected coordinates by an affine map anchored at the reference point triple (map,
//! projected, geographic), rotated by the grivation and scaled by the scale denominator and the
//! scale factors. Projected and geographic coordinates are related by the [`Transform`] built
//! from the CRS specification.

mod distortion;
mod grid;
mod record;

use georef_types::geo::LatLon;
use georef_types::Point2d;
use log::{debug, warn};
use nalgebra::{Matrix3, Rotation2, Translation2, Vector2};

use self::distortion::Distortion;
use crate::crs::CrsTemplateRegistry;
use crate::engine::Transform;
use crate::error::GeorefError;

pub use grid::GridCompensation;
pub use record::GeoreferencingRecord;

/// State of a [`Georeferencing`].
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// No CRS is configured. Map coordinates are the only coordinate space.
    Local,
    /// A CRS is configured and its transformation is available.
    Geospatial,
    /// The last CRS assignment failed.
    Invalid(GeorefError),
}

/// Georeferencing of a map document.
///
/// A new georeferencing is local, with scale 1:1000 and no rotation. Calling
/// [`set_projected_crs`](Self::set_projected_crs) connects it to a CRS.
#[derive(Debug)]
pub struct Georeferencing {
    state: State,
    scale_denominator: u32,
    grid: GridCompensation,
    map_ref_point: Point2d,
    projected_ref_point: Point2d,
    geographic_ref_point: Option<LatLon>,
    projected_crs_id: String,
    projected_crs_spec: String,
    projected_crs_parameters: Vec<String>,
    transform: Option<Transform>,
}

impl Default for Georeferencing {
    fn default() -> Self {
        Self::new()
    }
}

impl Georeferencing {
    /// Scale denominator of a new georeferencing.
    pub const DEFAULT_SCALE_DENOMINATOR: u32 = 1000;

    /// Creates a local georeferencing.
    pub fn new() -> Self {
        Self {
            state: State::Local,
            scale_denominator: Self::DEFAULT_SCALE_DENOMINATOR,
            grid: GridCompensation::default(),
            map_ref_point: Point2d::origin(),
            projected_ref_point: Point2d::origin(),
            geographic_ref_point: None,
            projected_crs_id: String::new(),
            projected_crs_spec: String::new(),
            projected_crs_parameters: vec![],
            transform: None,
        }
    }

    /// Restores a georeferencing from its persisted form.
    ///
    /// A specification that cannot be built results in an [`State::Invalid`] georeferencing
    /// which still carries the stored specification.
    pub fn from_record(record: &GeoreferencingRecord) -> Self {
        Self::from(record)
    }

    /// Returns the persisted form of the georeferencing.
    pub fn to_record(&self) -> GeoreferencingRecord {
        GeoreferencingRecord::from(self)
    }

    /// Current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns false if the last CRS assignment failed.
    pub fn is_valid(&self) -> bool {
        !matches!(self.state, State::Invalid(_))
    }

    /// Returns true if no CRS is configured.
    pub fn is_local(&self) -> bool {
        self.state == State::Local
    }

    /// Diagnostic of the last failed CRS assignment. Empty if the georeferencing is valid.
    pub fn error_text(&self) -> String {
        match &self.state {
            State::Invalid(err) => err.to_string(),
            _ => String::new(),
        }
    }

    /// Map scale denominator.
    pub fn scale_denominator(&self) -> u32 {
        self.scale_denominator
    }

    /// Scale factors and angles of the georeferencing.
    pub fn grid_compensation(&self) -> &GridCompensation {
        &self.grid
    }

    /// Grid scale factor.
    pub fn combined_scale_factor(&self) -> f64 {
        self.grid.combined_scale_factor()
    }

    /// Additional scale factor, e.g. for the elevation of the mapped area.
    pub fn auxiliary_scale_factor(&self) -> f64 {
        self.grid.auxiliary_scale_factor()
    }

    /// Magnetic declination in degrees.
    pub fn declination(&self) -> f64 {
        self.grid.declination()
    }

    /// Meridian convergence at the reference point in degrees.
    pub fn convergence(&self) -> f64 {
        self.grid.convergence()
    }

    /// Rotation of the map (grid north to magnetic north) in degrees.
    pub fn grivation(&self) -> f64 {
        self.grid.grivation()
    }

    /// Deviation of an explicitly set grivation from `declination - convergence`.
    pub fn grivation_error(&self) -> f64 {
        self.grid.grivation_error()
    }

    /// Reference point in map coordinates.
    pub fn map_ref_point(&self) -> Point2d {
        self.map_ref_point
    }

    /// Reference point in projected coordinates.
    pub fn projected_ref_point(&self) -> Point2d {
        self.projected_ref_point
    }

    /// Reference point in geographic coordinates, if it was set or derived.
    pub fn geographic_ref_point(&self) -> Option<LatLon> {
        self.geographic_ref_point
    }

    /// Identifier of the CRS or CRS template.
    pub fn projected_crs_id(&self) -> &str {
        &self.projected_crs_id
    }

    /// CRS specification.
    pub fn projected_crs_spec(&self) -> &str {
        &self.projected_crs_spec
    }

    /// Template parameter values the specification was created from.
    pub fn projected_crs_parameters(&self) -> &[String] {
        &self.projected_crs_parameters
    }

    /// Display name of the projected coordinates.
    ///
    /// Empty unless the CRS id refers to a template in the global registry.
    pub fn projected_coordinates_name(&self) -> String {
        if self.is_local() {
            return String::new();
        }

        let values: Vec<&str> = self.projected_crs_parameters.iter().map(String::as_str).collect();
        CrsTemplateRegistry::global()
            .find(&self.projected_crs_id)
            .map(|template| template.coordinates_name(&values))
            .unwrap_or_default()
    }

    /// Sets the projected CRS.
    ///
    /// Returns false if no transformation can be built from `spec`. The georeferencing is then
    /// [`State::Invalid`] and [`error_text`](Self::error_text) describes the problem. On success
    /// the projected reference point and the derived values are updated from the geographic
    /// reference point, if there is one. The auxiliary scale factor is never changed.
    pub fn set_projected_crs(&mut self, id: &str, spec: &str, params: &[&str]) -> bool {
        self.projected_crs_id = id.to_string();
        self.projected_crs_spec = spec.to_string();
        self.projected_crs_parameters = params.iter().map(|p| p.to_string()).collect();

        // Release the previous transformation before building the new one.
        self.transform = None;

        match Transform::build(spec) {
            Ok(transform) => {
                self.transform = Some(transform);
                self.state = State::Geospatial;
                if let Err(err) = self.update_from_geographic_ref_point() {
                    warn!("Geographic reference point is not valid in CRS {id}: {err}");
                }
                true
            }
            Err(err) => {
                warn!("Failed to set projected CRS {id}: {err}");
                self.state = State::Invalid(err);
                false
            }
        }
    }

    /// Sets the projected CRS from a template of the global registry.
    ///
    /// Parameter values are validated before the georeferencing is touched.
    pub fn set_projected_crs_from_template(
        &mut self,
        id: &str,
        values: &[&str],
    ) -> Result<(), GeorefError> {
        let template = CrsTemplateRegistry::global()
            .find(id)
            .ok_or_else(|| GeorefError::NotFound(id.to_string()))?;
        let spec = template.specification(values)?;

        if self.set_projected_crs(id, &spec, values) {
            Ok(())
        } else {
            Err(self.transform().err().unwrap_or(GeorefError::Local))
        }
    }

    /// Removes the projected CRS and returns to local georeferencing.
    ///
    /// Scale factors and angles are reset, except for the auxiliary scale factor.
    pub fn clear_projected_crs(&mut self) {
        self.transform = None;
        self.state = State::Local;
        self.projected_crs_id.clear();
        self.projected_crs_spec.clear();
        self.projected_crs_parameters.clear();
        self.geographic_ref_point = None;
        self.grid.reset();
    }

    /// Sets the map scale denominator.
    pub fn set_scale_denominator(&mut self, value: u32) -> Result<(), GeorefError> {
        if value == 0 {
            return Err(GeorefError::invalid_parameter("scale denominator", value));
        }
        self.scale_denominator = value;
        Ok(())
    }

    /// Sets the map reference point.
    pub fn set_map_ref_point(&mut self, point: Point2d) {
        self.map_ref_point = point;
    }

    /// Sets the projected reference point.
    ///
    /// With a projected CRS the geographic reference point and the derived values are updated,
    /// too.
    ///
    /// Nothing changes if the point cannot be transformed.
    pub fn set_projected_ref_point(&mut self, point: Point2d) -> Result<(), GeorefError> {
        let Some(transform) = &self.transform else {
            self.projected_ref_point = point;
            return Ok(());
        };

        let geographic = transform.inverse(&point)?;
        let distortion = Distortion::measure(transform, &geographic)?;

        self.projected_ref_point = point;
        self.geographic_ref_point = Some(geographic);
        self.grid.apply_distortion(&distortion);
        Ok(())
    }

    /// Sets the geographic reference point.
    ///
    /// With a projected CRS the projected reference point, the convergence and, unless set
    /// explicitly, the combined scale factor are recomputed at the new point. Nothing changes if
    /// the point cannot be transformed.
    pub fn set_geographic_ref_point(&mut self, point: LatLon) -> Result<(), GeorefError> {
        if !point.is_valid() {
            return Err(GeorefError::invalid_parameter(
                "geographic reference point",
                format!("{point:?}"),
            ));
        }

        let reference = self.reference_at(&point)?;
        self.geographic_ref_point = Some(point);
        if let Some((projected, distortion)) = reference {
            self.projected_ref_point = projected;
            self.grid.apply_distortion(&distortion);
        }
        Ok(())
    }

    /// Sets and pins the combined scale factor. Ignored for local georeferencing.
    pub fn set_combined_scale_factor(&mut self, value: f64) -> Result<(), GeorefError> {
        check_scale_factor("combined scale factor", value)?;
        if self.is_local() {
            debug!("Combined scale factor is fixed for local georeferencing");
            return Ok(());
        }
        self.grid.set_combined_scale_factor(value);
        Ok(())
    }

    /// Drops an explicitly set combined scale factor and returns to the automatic one.
    pub fn reset_combined_scale_factor(&mut self) -> Result<(), GeorefError> {
        self.grid.unpin_combined_scale_factor();
        self.update_from_geographic_ref_point()
    }

    /// Sets the auxiliary scale factor.
    pub fn set_auxiliary_scale_factor(&mut self, value: f64) -> Result<(), GeorefError> {
        check_scale_factor("auxiliary scale factor", value)?;
        self.grid.set_auxiliary_scale_factor(value);
        Ok(())
    }

    /// Sets the magnetic declination and recomputes the grivation.
    pub fn set_declination(&mut self, value: f64) {
        if self.ignore_angle("declination") {
            return;
        }
        self.grid.set_declination(value);
    }

    /// Sets the convergence and recomputes the grivation.
    pub fn set_convergence(&mut self, value: f64) {
        if self.ignore_angle("convergence") {
            return;
        }
        self.grid.set_convergence(value);
    }

    /// Sets the grivation. Declination and convergence are kept, the difference is reported by
    /// [`grivation_error`](Self::grivation_error).
    pub fn set_grivation(&mut self, value: f64) {
        if self.ignore_angle("grivation") {
            return;
        }
        self.grid.set_grivation(value);
    }

    /// Converts geographic coordinates to projected coordinates.
    pub fn to_projected_coords(&self, point: &LatLon) -> Result<Point2d, GeorefError> {
        self.transform()?.forward(point)
    }

    /// Converts projected coordinates to geographic coordinates.
    pub fn to_geographic_coords(&self, point: &Point2d) -> Result<LatLon, GeorefError> {
        self.transform()?.inverse(point)
    }

    /// Converts projected coordinates to map coordinates.
    pub fn to_map_coord_f(&self, projected: &Point2d) -> Point2d {
        self.projected_to_map().transform_point(projected)
    }

    /// Converts map coordinates to projected coordinates.
    pub fn to_projected_coords_from_map(&self, map: &Point2d) -> Point2d {
        self.map_to_projected().transform_point(map)
    }

    /// Converts map coordinates to geographic coordinates.
    pub fn to_geographic_coords_from_map(&self, map: &Point2d) -> Result<LatLon, GeorefError> {
        self.to_geographic_coords(&self.to_projected_coords_from_map(map))
    }

    /// Converts geographic coordinates to map coordinates.
    pub fn to_map_coord_f_from_geographic(&self, point: &LatLon) -> Result<Point2d, GeorefError> {
        Ok(self.to_map_coord_f(&self.to_projected_coords(point)?))
    }

    fn transform(&self) -> Result<&Transform, GeorefError> {
        match (&self.transform, &self.state) {
            (Some(transform), _) => Ok(transform),
            (None, State::Invalid(err)) => Err(err.clone()),
            (None, _) => Err(GeorefError::Local),
        }
    }

    fn ignore_angle(&self, name: &str) -> bool {
        if self.is_local() {
            debug!("The {name} is fixed for local georeferencing");
        }
        self.is_local()
    }

    fn update_from_geographic_ref_point(&mut self) -> Result<(), GeorefError> {
        let Some(point) = self.geographic_ref_point else {
            return Ok(());
        };

        if let Some((projected, distortion)) = self.reference_at(&point)? {
            self.projected_ref_point = projected;
            self.grid.apply_distortion(&distortion);
        }
        Ok(())
    }

    /// Projected coordinates and distortion at a geographic reference point, if there is a
    /// transformation.
    fn reference_at(&self, point: &LatLon) -> Result<Option<(Point2d, Distortion)>, GeorefError> {
        let Some(transform) = &self.transform else {
            return Ok(None);
        };

        let projected = transform.forward(point)?;
        let distortion = Distortion::measure(transform, point)?;
        debug!(
            "Distortion at {point:?}: scale {} x {}, convergence {}",
            distortion.parallel_scale, distortion.meridian_scale, distortion.convergence
        );

        Ok(Some((projected, distortion)))
    }

    fn map_to_projected(&self) -> Matrix3<f64> {
        let scale = self.grid.projected_per_map_unit(self.scale_denominator);
        Translation2::new(self.projected_ref_point.x, self.projected_ref_point.y).to_homogeneous()
            * Rotation2::new(-self.grid.grivation().to_radians()).to_homogeneous()
            * Matrix3::new_nonuniform_scaling(&Vector2::new(scale, -scale))
            * Translation2::new(-self.map_ref_point.x, -self.map_ref_point.y).to_homogeneous()
    }

    fn projected_to_map(&self) -> Matrix3<f64> {
        let scale = 1.0 / self.grid.projected_per_map_unit(self.scale_denominator);
        Translation2::new(self.map_ref_point.x, self.map_ref_point.y).to_homogeneous()
            * Matrix3::new_nonuniform_scaling(&Vector2::new(scale, -scale))
            * Rotation2::new(self.grid.grivation().to_radians()).to_homogeneous()
            * Translation2::new(-self.projected_ref_point.x, -self.projected_ref_point.y)
                .to_homogeneous()
    }
}

fn check_scale_factor(name: &str, value: f64) -> Result<(), GeorefError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeorefError::invalid_parameter(name, value))
    }
}
