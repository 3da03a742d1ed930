use super::distortion::Distortion;

/// Scale factors and angles relating map north and map distances to the projected CRS.
///
/// `grivation` is kept equal to `declination - convergence`. It can be set explicitly, in which
/// case `grivation_error` records the difference to that decomposition until the next change
/// of declination or convergence.
///
/// The combined scale factor is either automatic (derived from the projection at the
/// geographic reference point) or pinned by an explicit call to
/// [`GridCompensation::set_combined_scale_factor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCompensation {
    combined_scale_factor: f64,
    pinned: bool,
    auxiliary_scale_factor: f64,
    declination: f64,
    convergence: f64,
    grivation: f64,
    grivation_error: f64,
}

impl Default for GridCompensation {
    fn default() -> Self {
        Self {
            combined_scale_factor: 1.0,
            pinned: false,
            auxiliary_scale_factor: 1.0,
            declination: 0.0,
            convergence: 0.0,
            grivation: 0.0,
            grivation_error: 0.0,
        }
    }
}

impl GridCompensation {
    /// Grid scale factor.
    pub fn combined_scale_factor(&self) -> f64 {
        self.combined_scale_factor
    }

    /// Returns true if the combined scale factor was set explicitly.
    pub fn is_combined_scale_factor_pinned(&self) -> bool {
        self.pinned
    }

    /// Additional scale factor, e.g. for the elevation of the mapped area.
    pub fn auxiliary_scale_factor(&self) -> f64 {
        self.auxiliary_scale_factor
    }

    /// Angle from true north to magnetic north in degrees.
    pub fn declination(&self) -> f64 {
        self.declination
    }

    /// Angle from grid north to true north in degrees.
    pub fn convergence(&self) -> f64 {
        self.convergence
    }

    /// Angle from grid north to magnetic north in degrees.
    pub fn grivation(&self) -> f64 {
        self.grivation
    }

    /// Difference between the explicitly set grivation and `declination - convergence`.
    pub fn grivation_error(&self) -> f64 {
        self.grivation_error
    }

    /// Projected length (metres) of one map unit (millimetre) at the given scale denominator.
    pub fn projected_per_map_unit(&self, scale_denominator: u32) -> f64 {
        f64::from(scale_denominator) / 1000.0
            * self.combined_scale_factor
            * self.auxiliary_scale_factor
    }

    /// Sets and pins the combined scale factor.
    pub fn set_combined_scale_factor(&mut self, value: f64) {
        self.combined_scale_factor = value;
        self.pinned = true;
    }

    /// Unpins the combined scale factor. The value is kept until the next automatic update.
    pub fn unpin_combined_scale_factor(&mut self) {
        self.pinned = false;
    }

    /// Sets the auxiliary scale factor.
    pub fn set_auxiliary_scale_factor(&mut self, value: f64) {
        self.auxiliary_scale_factor = value;
    }

    /// Sets the declination and recomputes the grivation.
    pub fn set_declination(&mut self, value: f64) {
        self.declination = value;
        self.update_grivation();
    }

    /// Sets the convergence and recomputes the grivation.
    pub fn set_convergence(&mut self, value: f64) {
        self.convergence = value;
        self.update_grivation();
    }

    /// Sets the grivation, keeping declination and convergence.
    pub fn set_grivation(&mut self, value: f64) {
        self.grivation = value;
        self.grivation_error = value - (self.declination - self.convergence);
    }

    /// Takes over the convergence and, unless pinned, the scale factor of the projection.
    pub(crate) fn apply_distortion(&mut self, distortion: &Distortion) {
        if !self.pinned {
            self.combined_scale_factor = distortion.linear_scale();
        }
        self.set_convergence(distortion.convergence);
    }

    /// Resets everything but the auxiliary scale factor.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            auxiliary_scale_factor: self.auxiliary_scale_factor,
            ..Default::default()
        };
    }

    fn update_grivation(&mut self) {
        self.grivation = self.declination - self.convergence;
        self.grivation_error = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn distortion(scale: f64, convergence: f64) -> Distortion {
        Distortion {
            meridian_scale: scale,
            parallel_scale: scale,
            areal_scale: scale * scale,
            convergence,
        }
    }

    #[test]
    fn grivation_follows_declination_and_convergence() {
        let mut grid = GridCompensation::default();
        grid.set_declination(2.5);
        assert_eq!(grid.grivation(), 2.5);
        grid.set_convergence(1.0);
        assert_eq!(grid.grivation(), 1.5);
        assert_eq!(grid.grivation_error(), 0.0);
    }

    #[test]
    fn explicit_grivation_records_error() {
        let mut grid = GridCompensation::default();
        grid.set_declination(2.0);
        grid.set_convergence(0.5);
        grid.set_grivation(1.75);
        assert_eq!(grid.grivation(), 1.75);
        assert_eq!(grid.declination(), 2.0);
        assert_eq!(grid.convergence(), 0.5);
        assert_eq!(grid.grivation_error(), 0.25);

        grid.set_declination(3.0);
        assert_eq!(grid.grivation(), 2.5);
        assert_eq!(grid.grivation_error(), 0.0);
    }

    #[test]
    fn pinned_scale_factor_survives_distortion() {
        let mut grid = GridCompensation::default();
        grid.apply_distortion(&distortion(0.9996, 1.2));
        assert_abs_diff_eq!(grid.combined_scale_factor(), 0.9996, epsilon = 1e-15);
        assert_eq!(grid.grivation(), -1.2);

        grid.set_combined_scale_factor(1.5);
        grid.apply_distortion(&distortion(0.9996, 0.0));
        assert_eq!(grid.combined_scale_factor(), 1.5);
        assert_eq!(grid.convergence(), 0.0);

        grid.unpin_combined_scale_factor();
        grid.apply_distortion(&distortion(0.9996, 0.0));
        assert_abs_diff_eq!(grid.combined_scale_factor(), 0.9996, epsilon = 1e-15);
    }

    #[test]
    fn reset_keeps_auxiliary_scale_factor() {
        let mut grid = GridCompensation::default();
        grid.set_auxiliary_scale_factor(1.1);
        grid.set_combined_scale_factor(0.9);
        grid.set_declination(3.0);
        grid.reset();
        assert_eq!(
            grid,
            GridCompensation {
                auxiliary_scale_factor: 1.1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn projected_length_of_map_unit() {
        let mut grid = GridCompensation::default();
        assert_eq!(grid.projected_per_map_unit(1000), 1.0);
        grid.set_combined_scale_factor(2.0);
        grid.set_auxiliary_scale_factor(1.5);
        assert_eq!(grid.projected_per_map_unit(10000), 30.0);
    }
}
