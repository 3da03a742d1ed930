/// Parameters of a reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    semimajor: f64,
    inv_flattening: f64,
}

impl Datum {
    /// World Geodetic System 1984.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
        inv_flattening: 298.257223563,
    };

    /// Geodetic Reference System 1980.
    pub const GRS80: Self = Datum {
        semimajor: 6_378_137.0,
        inv_flattening: 298.257222101,
    };

    /// Bessel 1841, used by the German DHDN and the Swiss CH1903 datums.
    pub const BESSEL: Self = Datum {
        semimajor: 6_377_397.155,
        inv_flattening: 299.1528128,
    };

    /// Airy 1830, used by OSGB36.
    pub const AIRY: Self = Datum {
        semimajor: 6_377_563.396,
        inv_flattening: 299.3249646,
    };

    /// International 1924 (Hayford).
    pub const INTERNATIONAL: Self = Datum {
        semimajor: 6_378_388.0,
        inv_flattening: 297.0,
    };

    /// Clarke 1866, used by NAD27.
    pub const CLARKE_1866: Self = Datum {
        semimajor: 6_378_206.4,
        inv_flattening: 294.9786982,
    };

    /// Looks up an ellipsoid by its PROJ name (`WGS84`, `GRS80`, `bessel`, `airy`, `intl`,
    /// `clrk66`).
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "WGS84" => Some(Self::WGS84),
            "GRS80" => Some(Self::GRS80),
            "bessel" => Some(Self::BESSEL),
            "airy" => Some(Self::AIRY),
            "intl" => Some(Self::INTERNATIONAL),
            "clrk66" => Some(Self::CLARKE_1866),
            _ => None,
        }
    }

    /// Creates an ellipsoid from its semimajor axis (metres) and inverse flattening.
    pub const fn new(semimajor: f64, inv_flattening: f64) -> Self {
        Self {
            semimajor,
            inv_flattening,
        }
    }

    /// Semimajor axis in metres.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Inverse flattening.
    pub fn inv_flattening(&self) -> f64 {
        self.inv_flattening
    }

    /// Squared first eccentricity.
    pub fn eccentricity_sq(&self) -> f64 {
        let f = 1.0 / self.inv_flattening;
        f * (2.0 - f)
    }

    /// Radius of curvature in the meridian at the given latitude (radians).
    pub fn meridional_radius(&self, lat_rad: f64) -> f64 {
        let e2 = self.eccentricity_sq();
        let w = 1.0 - e2 * lat_rad.sin().powi(2);
        self.semimajor * (1.0 - e2) / w.powf(1.5)
    }

    /// Radius of curvature in the prime vertical at the given latitude (radians).
    pub fn prime_vertical_radius(&self, lat_rad: f64) -> f64 {
        let e2 = self.eccentricity_sq();
        self.semimajor / (1.0 - e2 * lat_rad.sin().powi(2)).sqrt()
    }

    /// Radius of the parallel circle at the given latitude (radians).
    pub fn parallel_radius(&self, lat_rad: f64) -> f64 {
        self.prime_vertical_radius(lat_rad) * lat_rad.cos()
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::WGS84
    }
}
