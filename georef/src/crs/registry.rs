use lazy_static::lazy_static;

use super::template::{CrsTemplate, ParameterKind, TemplateParameter};

lazy_static! {
    static ref GLOBAL: CrsTemplateRegistry = CrsTemplateRegistry::new();
}

/// Ordered catalog of [`CrsTemplate`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsTemplateRegistry {
    templates: Vec<CrsTemplate>,
}

impl CrsTemplateRegistry {
    /// Creates a registry with the built-in templates.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.add(CrsTemplate::new(
            "UTM",
            "UTM",
            "UTM coordinates",
            "+proj=utm +zone=%1 +datum=WGS84",
            vec![TemplateParameter::new(
                "zone",
                "UTM Zone (number north/south)",
                ParameterKind::UtmZone,
            )],
        ));

        registry.add(CrsTemplate::new(
            "Gauss-Krueger, datum: Potsdam",
            "Gauss-Krueger, datum: Potsdam",
            "Gauss-Krueger coordinates",
            "+proj=tmerc +lat_0=0 +lon_0=%1 +k=1.000000 +x_0=%2 +y_0=0 +ellps=bessel +datum=potsdam +units=m +no_defs",
            vec![TemplateParameter::new(
                "zone",
                "Zone number (1 to 119)",
                ParameterKind::IntRange {
                    min: 1,
                    max: 119,
                    outputs: vec![(3, 0), (1_000_000, 500_000)],
                },
            )],
        ));

        registry.add(CrsTemplate::new(
            "EPSG",
            "by EPSG code",
            "EPSG @code@ coordinates",
            "+init=epsg:%1",
            vec![TemplateParameter::new("code", "EPSG code", ParameterKind::EpsgCode)],
        ));

        registry.add(CrsTemplate::new(
            "Custom",
            "Custom PROJ.4",
            "Local coordinates",
            "%1",
            vec![TemplateParameter::new(
                "spec",
                "Specification",
                ParameterKind::FullSpec,
            )],
        ));

        registry
    }

    /// Creates a registry without templates.
    pub fn empty() -> Self {
        Self { templates: vec![] }
    }

    /// Process-wide registry with the built-in templates.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Adds a template. A template with the same id is replaced.
    pub fn add(&mut self, template: CrsTemplate) {
        match self.templates.iter_mut().find(|t| t.id() == template.id()) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Returns the template with the given id.
    pub fn find(&self, id: &str) -> Option<&CrsTemplate> {
        self.templates.iter().find(|t| t.id() == id)
    }

    /// Iterates over the templates in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &CrsTemplate> {
        self.templates.iter()
    }
}

impl Default for CrsTemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
