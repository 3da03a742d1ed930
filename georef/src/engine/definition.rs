//! Translation of CRS specifications into operator definitions of the `geodesy` engine.
//!
//! Specifications in PROJ syntax (`+proj=utm +zone=32 +datum=WGS84`) are rewritten into the
//! engine syntax (`utm zone=32 ellps=WGS84`). Specifications without `+` tokens are taken as
//! engine syntax and passed through.
//!
//! Geographic coordinates are always WGS84. A datum shift given by `+towgs84` or implied by
//! `+datum` becomes a pipeline in front of the projection:
//! `cart ellps=WGS84 | helmert inv ... | cart inv ellps=<ellps> | <projection>`.

use georef_types::geo::Datum;
use log::warn;

use super::resources::{init_entry, ResourceFinder};
use crate::error::GeorefError;

const MAX_INIT_DEPTH: usize = 4;

const GEOGRAPHIC_OPERATORS: [&str; 4] = ["longlat", "latlong", "lonlat", "latlon"];

const HELMERT_PARAMETERS: [&str; 7] = ["x", "y", "z", "rx", "ry", "rz", "s"];

/// Ellipsoid assumed by the engine when a definition names none.
const DEFAULT_ELLIPSOID: &str = "GRS80";

/// Operator definition ready to be handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Definition {
    /// Operator definition in engine syntax.
    pub operator: String,
    /// Projected coordinates are longitude and latitude in degrees.
    pub geographic: bool,
    /// Ellipsoid of the geographic coordinates accepted by the operator.
    pub datum: Datum,
}

#[derive(Debug, Clone, PartialEq)]
struct Param {
    key: String,
    value: Option<String>,
}

impl Param {
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim_start_matches('+');
        if token.is_empty() {
            return None;
        }

        Some(match token.split_once('=') {
            Some((key, value)) => Self {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => Self {
                key: token.to_string(),
                value: None,
            },
        })
    }

    fn value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Translates `spec` into an engine definition, resolving `+init` references with `finder`.
pub(crate) fn normalize(spec: &str, finder: &dyn ResourceFinder) -> Result<Definition, GeorefError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(GeorefError::Build("empty specification".into()));
    }

    if !spec.split_whitespace().any(|token| token.starts_with('+')) {
        return Ok(native(spec));
    }

    let params = expand(spec, finder, 0)?;
    translate(params)
}

fn native(spec: &str) -> Definition {
    match spec.split_whitespace().next() {
        Some(name) if GEOGRAPHIC_OPERATORS.contains(&name) => geographic(),
        _ => Definition {
            operator: spec.to_string(),
            geographic: false,
            datum: spec
                .split_whitespace()
                .find_map(|word| word.strip_prefix("ellps="))
                .and_then(ellipsoid_datum)
                .unwrap_or(Datum::GRS80),
        },
    }
}

fn geographic() -> Definition {
    Definition {
        operator: "noop".into(),
        geographic: true,
        datum: Datum::WGS84,
    }
}

/// Splits the specification into parameters and replaces `+init` references by the referenced
/// definitions. Parameters given explicitly take precedence over the referenced ones.
fn expand(spec: &str, finder: &dyn ResourceFinder, depth: usize) -> Result<Vec<Param>, GeorefError> {
    if depth > MAX_INIT_DEPTH {
        return Err(GeorefError::Build("too many nested +init references".into()));
    }

    let mut params = vec![];
    let mut inits = vec![];
    for param in spec.split_whitespace().filter_map(Param::parse) {
        if param.key == "init" {
            inits.push(param);
        } else {
            params.push(param);
        }
    }

    for init in inits {
        let (resource, code) = init
            .value()
            .split_once(':')
            .ok_or_else(|| GeorefError::Build(format!("invalid +init value: {}", init.value())))?;
        let text = finder
            .find(resource)
            .ok_or_else(|| GeorefError::Build(format!("resource not found: {resource}")))?;
        let entry = init_entry(&text, code).ok_or_else(|| {
            GeorefError::Build(format!("no definition for {code} in resource {resource}"))
        })?;
        params.extend(expand(&entry, finder, depth + 1)?);
    }

    let mut unique: Vec<Param> = Vec::with_capacity(params.len());
    for param in params {
        if !unique.iter().any(|p| p.key == param.key) {
            unique.push(param);
        }
    }

    Ok(unique)
}

fn translate(params: Vec<Param>) -> Result<Definition, GeorefError> {
    let proj = params
        .iter()
        .find(|p| p.key == "proj")
        .map(|p| p.value().to_string())
        .ok_or_else(|| GeorefError::Build("missing +proj parameter".into()))?;

    if GEOGRAPHIC_OPERATORS.contains(&proj.as_str()) {
        return Ok(geographic());
    }

    let has = |key: &str| params.iter().any(|p| p.key == key);
    let get = |key: &str| params.iter().find(|p| p.key == key).map(Param::value);

    let spherical_mercator = proj == "merc"
        && matches!((get("a"), get("b")), (Some(a), Some(b)) if a == b);
    let mut words = vec![if spherical_mercator {
        "webmerc".to_string()
    } else {
        proj
    }];
    let mut ellipsoid: Option<String> = None;
    let mut towgs84: Option<Vec<f64>> = None;
    let mut datum_towgs84: Option<Vec<f64>> = None;

    for param in &params {
        let key = param.key.as_str();
        match key {
            "proj" | "no_defs" | "wktext" | "type" => {}
            "units" => {
                if param.value() != "m" {
                    return Err(GeorefError::Build(format!(
                        "unsupported units: {}",
                        param.value()
                    )));
                }
            }
            "to_meter" => {
                if param.value().parse::<f64>().ok() != Some(1.0) {
                    return Err(GeorefError::Build(format!(
                        "unsupported unit factor: {}",
                        param.value()
                    )));
                }
            }
            "towgs84" => towgs84 = Some(parse_towgs84(param.value())?),
            "nadgrids" | "geoidgrids" => {
                if param.value() != "@null" {
                    warn!("Grid shift {key}={} is not supported and is ignored", param.value());
                }
            }
            "datum" => {
                let Some((ellps, shift)) = datum_parameters(param.value()) else {
                    warn!("Unknown datum {} is ignored", param.value());
                    continue;
                };
                datum_towgs84 = shift.map(parse_towgs84).transpose()?;
                if has("ellps") || has("a") {
                    continue;
                }
                words.push(format!("ellps={ellps}"));
                ellipsoid = Some(ellps.to_string());
            }
            "ellps" => {
                words.push(format!("ellps={}", param.value()));
                ellipsoid = Some(param.value().to_string());
            }
            "a" | "b" | "rf" => {
                if spherical_mercator || has("ellps") || key != "a" {
                    continue;
                }
                let axes = ellipsoid_from_axes(&params)?;
                words.push(format!("ellps={axes}"));
                ellipsoid = Some(axes);
            }
            "k" => words.push(format!("k_0={}", param.value())),
            _ => words.push(match &param.value {
                Some(value) => format!("{key}={value}"),
                None => key.to_string(),
            }),
        }
    }

    let projection = words.join(" ");
    let shift = towgs84
        .or(datum_towgs84)
        .filter(|values| values.iter().any(|value| *value != 0.0));
    let ellipsoid = ellipsoid.as_deref().unwrap_or(DEFAULT_ELLIPSOID);

    Ok(match shift {
        Some(values) => Definition {
            operator: format!(
                "cart ellps=WGS84 | {} | cart inv ellps={ellipsoid} | {projection}",
                helmert(&values)
            ),
            geographic: false,
            datum: Datum::WGS84,
        },
        None => Definition {
            operator: projection,
            geographic: false,
            datum: if spherical_mercator {
                Datum::WGS84
            } else {
                ellipsoid_datum(ellipsoid).unwrap_or(Datum::GRS80)
            },
        },
    })
}

/// Ellipsoid and shift to WGS84 (`+towgs84` values) of the datums known by name.
fn datum_parameters(datum: &str) -> Option<(&'static str, Option<&'static str>)> {
    match datum.to_ascii_lowercase().as_str() {
        "wgs84" => Some(("WGS84", None)),
        "nad83" | "etrs89" | "grs80" => Some(("GRS80", None)),
        "potsdam" => Some(("bessel", Some("598.1,73.7,418.2,0.202,0.045,-2.455,6.7"))),
        "hermannskogel" => Some((
            "bessel",
            Some("577.326,90.129,463.919,5.137,1.474,5.297,2.4232"),
        )),
        "osgb36" => Some((
            "airy",
            Some("446.448,-125.157,542.06,0.15,0.247,0.842,-20.489"),
        )),
        "nad27" => {
            warn!("NAD27 needs a grid shift, which is not supported");
            Some(("clrk66", None))
        }
        _ => None,
    }
}

fn parse_towgs84(value: &str) -> Result<Vec<f64>, GeorefError> {
    let invalid = || GeorefError::Build(format!("invalid +towgs84 value: {value}"));
    let values = value
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match values.len() {
        3 | 7 => Ok(values),
        _ => Err(invalid()),
    }
}

/// Helmert step from WGS84 to the datum described by `+towgs84` values.
///
/// `+towgs84` describes the opposite direction in the position vector convention, hence `inv`.
fn helmert(values: &[f64]) -> String {
    let mut words = vec!["helmert inv".to_string()];
    words.extend(
        HELMERT_PARAMETERS
            .iter()
            .zip(values)
            .map(|(key, value)| format!("{key}={value}")),
    );
    if values.len() == 7 {
        words.push("convention=position_vector".into());
    }
    words.join(" ")
}

/// Ellipsoid parameters of an engine `ellps` value: a name or `a,rf`.
fn ellipsoid_datum(ellps: &str) -> Option<Datum> {
    match ellps.split_once(',') {
        Some((a, rf)) => {
            let a = a.trim().parse::<f64>().ok()?;
            let rf = rf.trim().parse::<f64>().ok()?;
            // rf = 0 denotes a sphere.
            Some(Datum::new(a, if rf == 0.0 { f64::INFINITY } else { rf }))
        }
        None => Datum::named(ellps),
    }
}

/// Builds an `a, rf` ellipsoid definition from `+a` together with `+b` or `+rf`.
fn ellipsoid_from_axes(params: &[Param]) -> Result<String, GeorefError> {
    let number = |key: &str| -> Result<Option<f64>, GeorefError> {
        params
            .iter()
            .find(|p| p.key == key)
            .map(|p| {
                p.value()
                    .parse::<f64>()
                    .map_err(|_| GeorefError::Build(format!("invalid +{key} value: {}", p.value())))
            })
            .transpose()
    };

    let a = number("a")?.ok_or_else(|| GeorefError::Build("missing +a".into()))?;
    let rf = match (number("rf")?, number("b")?) {
        (Some(rf), _) => rf,
        (None, Some(b)) if b < a => a / (a - b),
        (None, Some(_)) => 0.0,
        (None, None) => 0.0,
    };

    Ok(format!("{a},{rf}"))
}
