//! Lookup of named resources referenced by `+init=RESOURCE:CODE` in CRS specifications.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

/// Locates a named resource (the equivalent of a PROJ init file) and returns its text.
///
/// The text is read as a sequence of `<CODE> definition <>` entries. Lines starting with `#`
/// are comments.
pub trait ResourceFinder: Send + Sync {
    /// Returns the content of the resource with the given name, if it is known.
    fn find(&self, name: &str) -> Option<String>;
}

impl<F> ResourceFinder for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn find(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Resources shipped with the crate.
///
/// Contains an `epsg` resource with the EPSG codes that can be expressed by the transformation
/// engine, including their seven-parameter shifts to WGS84. Codes needing operators the engine
/// lacks (Krovak, EPSG 5514) or grid shifts are not included.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledResources;

const EPSG: &str = "\
# WGS 84
<4326> +proj=longlat +datum=WGS84 +no_defs <>
# ETRS89
<4258> +proj=longlat +ellps=GRS80 +no_defs <>
# WGS 84 / Pseudo-Mercator
<3857> +proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs <>
# ETRS89 / UTM zone 32N
<25832> +proj=utm +zone=32 +ellps=GRS80 +units=m +no_defs <>
# ETRS89 / UTM zone 33N
<25833> +proj=utm +zone=33 +ellps=GRS80 +units=m +no_defs <>
# WGS 84 / UTM zone 32N
<32632> +proj=utm +zone=32 +datum=WGS84 +units=m +no_defs <>
# WGS 84 / UTM zone 33N
<32633> +proj=utm +zone=33 +datum=WGS84 +units=m +no_defs <>
# DHDN / 3-degree Gauss-Kruger zone 2
<31466> +proj=tmerc +lat_0=0 +lon_0=6 +k=1 +x_0=2500000 +y_0=0 +ellps=bessel
        +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs <>
# DHDN / 3-degree Gauss-Kruger zone 3
<31467> +proj=tmerc +lat_0=0 +lon_0=9 +k=1 +x_0=3500000 +y_0=0 +ellps=bessel
        +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs <>
# DHDN / 3-degree Gauss-Kruger zone 4
<31468> +proj=tmerc +lat_0=0 +lon_0=12 +k=1 +x_0=4500000 +y_0=0 +ellps=bessel
        +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs <>
# ETRS89-extended / LAEA Europe
<3035> +proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +units=m +no_defs <>
# RGF93 v1 / Lambert-93
<2154> +proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80
       +units=m +no_defs <>
# OSGB36 / British National Grid
<27700> +proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy
        +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs <>
# CH1903+ / LV95
<2056> +proj=somerc +lat_0=46.95240555555556 +lon_0=7.439583333333333 +k_0=1 +x_0=2600000
       +y_0=1200000 +ellps=bessel +towgs84=674.374,15.056,405.346,0,0,0,0 +units=m +no_defs <>
";

impl ResourceFinder for BundledResources {
    fn find(&self, name: &str) -> Option<String> {
        match name {
            "epsg" => Some(EPSG.to_string()),
            _ => None,
        }
    }
}

lazy_static! {
    static ref CUSTOM_FINDER: RwLock<Option<Arc<dyn ResourceFinder>>> = RwLock::new(None);
}

/// Installs a process-wide resource finder.
///
/// The finder is consulted before the [`BundledResources`] by every transformation built with
/// [`Transform::build`](super::Transform::build). It replaces any previously installed finder.
pub fn set_resource_finder(finder: impl ResourceFinder + 'static) {
    let finder: Arc<dyn ResourceFinder> = Arc::new(finder);
    *CUSTOM_FINDER.write() = Some(finder);
}

/// Removes the process-wide resource finder installed with [`set_resource_finder`].
pub fn reset_resource_finder() {
    *CUSTOM_FINDER.write() = None;
}

/// The process-wide finder followed by the bundled resources.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ProcessResources;

impl ResourceFinder for ProcessResources {
    fn find(&self, name: &str) -> Option<String> {
        // The lock is released before the bundled resources are consulted.
        let custom = CUSTOM_FINDER.read().clone();
        custom
            .and_then(|finder| finder.find(name))
            .or_else(|| BundledResources.find(name))
    }
}

/// Extracts the definition with the given code from the text of an init resource.
pub(crate) fn init_entry(text: &str, code: &str) -> Option<String> {
    let body = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ");

    let tag = format!("<{code}>");
    let start = body.find(&tag)? + tag.len();
    let rest = &body[start..];
    let end = rest.find("<>")?;

    Some(rest[..end].split_whitespace().collect::<Vec<_>>().join(" "))
}
