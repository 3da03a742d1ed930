use crate::error::GeorefError;

/// How a parameter turns the value entered by the user into specification values.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// UTM zone number, optionally followed by `N` or `S` ("32", "32 N", "33 S").
    UtmZone,
    /// Integer within `min..=max`. Every `(factor, offset)` pair in `outputs` produces one
    /// specification value `value * factor + offset`.
    IntRange {
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
        /// Linear mappings producing the specification values.
        outputs: Vec<(i64, i64)>,
    },
    /// Positive integer code of an EPSG CRS.
    EpsgCode,
    /// Complete specification, passed through verbatim.
    FullSpec,
}

/// Parameter of a [`CrsTemplate`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameter {
    name: String,
    description: String,
    kind: ParameterKind,
}

impl TemplateParameter {
    /// Creates a new parameter.
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }

    /// Name of the parameter, used as `@name@` placeholder in the coordinates name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Kind of the parameter.
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// Validates the value entered by the user and converts it into specification values.
    pub fn spec_values(&self, value: &str) -> Result<Vec<String>, GeorefError> {
        let value = value.trim();
        let invalid = || GeorefError::invalid_parameter(&self.name, value);

        match &self.kind {
            ParameterKind::UtmZone => {
                let (zone, south) = match value.char_indices().last() {
                    Some((i, c)) if c.eq_ignore_ascii_case(&'n') => (&value[..i], false),
                    Some((i, c)) if c.eq_ignore_ascii_case(&'s') => (&value[..i], true),
                    _ => (value, false),
                };
                let zone: u8 = zone.trim().parse().map_err(|_| invalid())?;
                if !(1..=60).contains(&zone) {
                    return Err(invalid());
                }
                Ok(vec![if south {
                    format!("{zone} +south")
                } else {
                    zone.to_string()
                }])
            }
            ParameterKind::IntRange { min, max, outputs } => {
                let number: i64 = value.parse().map_err(|_| invalid())?;
                if number < *min || number > *max {
                    return Err(invalid());
                }
                Ok(outputs
                    .iter()
                    .map(|(factor, offset)| (number * factor + offset).to_string())
                    .collect())
            }
            ParameterKind::EpsgCode => match value.parse::<u32>() {
                Ok(code) if code > 0 => Ok(vec![code.to_string()]),
                _ => Err(invalid()),
            },
            ParameterKind::FullSpec => {
                if value.is_empty() {
                    Err(invalid())
                } else {
                    Ok(vec![value.to_string()])
                }
            }
        }
    }
}

/// Parametrized CRS specification.
///
/// The specification template contains ordinal placeholders `%1`, `%2`, ... which are replaced
/// by the specification values of the parameters. The coordinates name template contains
/// `@name@` placeholders named after the parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsTemplate {
    id: String,
    name: String,
    coordinates_name: String,
    specification_template: String,
    parameters: Vec<TemplateParameter>,
}

impl CrsTemplate {
    /// Creates a new template.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        coordinates_name: impl Into<String>,
        specification_template: impl Into<String>,
        parameters: Vec<TemplateParameter>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates_name: coordinates_name.into(),
            specification_template: specification_template.into(),
            parameters,
        }
    }

    /// Unique identifier of the template.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable name of the template.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameters of the template.
    pub fn parameters(&self) -> &[TemplateParameter] {
        &self.parameters
    }

    /// Specification with `%n` placeholders.
    pub fn specification_template(&self) -> &str {
        &self.specification_template
    }

    /// Name of the coordinates of the CRS with the given parameter values.
    ///
    /// The n-th value replaces the `@name@` placeholder of the n-th parameter. Placeholders
    /// without a value are kept, so an empty `values` slice gives a generic name.
    pub fn coordinates_name(&self, values: &[&str]) -> String {
        self.parameters
            .iter()
            .zip(values)
            .fold(self.coordinates_name.clone(), |name, (param, value)| {
                name.replace(&format!("@{}@", param.name), value)
            })
    }

    /// Builds a concrete specification from the values entered by the user, one per parameter.
    pub fn specification(&self, values: &[&str]) -> Result<String, GeorefError> {
        if values.len() != self.parameters.len() {
            return Err(GeorefError::invalid_parameter(&self.id, values.join(", ")));
        }

        let mut spec_values = vec![];
        for (param, value) in self.parameters.iter().zip(values) {
            spec_values.extend(param.spec_values(value)?);
        }

        let spec_values: Vec<&str> = spec_values.iter().map(String::as_str).collect();
        Ok(substitute(&self.specification_template, &spec_values))
    }
}

/// Replaces the ordinal placeholders `%1` to `%9` in `template` by the corresponding values.
///
/// Placeholders without a corresponding value are kept.
pub fn substitute(template: &str, values: &[&str]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        let ordinal = match (c, chars.peek().and_then(|next| next.to_digit(10))) {
            ('%', Some(digit)) if digit > 0 => digit as usize,
            _ => {
                result.push(c);
                continue;
            }
        };

        match values.get(ordinal - 1) {
            Some(value) => result.push_str(value),
            None => {
                result.push('%');
                result.push_str(&ordinal.to_string());
            }
        }
        chars.next();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn code_template() -> CrsTemplate {
        CrsTemplate::new(
            "EPSG",
            "by EPSG code",
            "EPSG @code@ coordinates",
            "+init=epsg:%1",
            vec![TemplateParameter::new("code", "EPSG code", ParameterKind::EpsgCode)],
        )
    }

    #[test]
    fn ordinal_substitution() {
        assert_eq!(substitute("+init=epsg:%1", &["5514"]), "+init=epsg:5514");
        assert_eq!(substitute("%2 %1 %2", &["a", "b"]), "b a b");
        assert_eq!(substitute("%1 %3", &["a"]), "a %3");
        assert_eq!(substitute("100% %0 %", &["a"]), "100% %0 %");
    }

    #[test]
    fn coordinates_name() {
        let template = code_template();
        assert_eq!(template.coordinates_name(&[]), "EPSG @code@ coordinates");
        assert_eq!(template.coordinates_name(&["5514"]), "EPSG 5514 coordinates");
    }

    #[test]
    fn specification() {
        let template = code_template();
        assert_eq!(template.specification(&["5514"]).unwrap(), "+init=epsg:5514");
        assert_matches!(template.specification(&["abc"]), Err(GeorefError::InvalidParameter { .. }));
        assert_matches!(template.specification(&[]), Err(GeorefError::InvalidParameter { .. }));
    }

    #[test]
    fn utm_zone_values() {
        let param = TemplateParameter::new("zone", "UTM zone", ParameterKind::UtmZone);
        assert_eq!(param.spec_values("32").unwrap(), vec!["32"]);
        assert_eq!(param.spec_values("32 N").unwrap(), vec!["32"]);
        assert_eq!(param.spec_values("33s").unwrap(), vec!["33 +south"]);
        assert_matches!(param.spec_values("61"), Err(GeorefError::InvalidParameter { .. }));
        assert_matches!(param.spec_values("0 N"), Err(GeorefError::InvalidParameter { .. }));
        assert_matches!(param.spec_values("N"), Err(GeorefError::InvalidParameter { .. }));
    }

    #[test]
    fn int_range_values() {
        let param = TemplateParameter::new(
            "zone",
            "Zone number",
            ParameterKind::IntRange {
                min: 1,
                max: 119,
                outputs: vec![(3, 0), (1_000_000, 500_000)],
            },
        );
        assert_eq!(param.spec_values("3").unwrap(), vec!["9", "3500000"]);
        assert_matches!(param.spec_values("120"), Err(GeorefError::InvalidParameter { .. }));
        assert_matches!(param.spec_values("3.5"), Err(GeorefError::InvalidParameter { .. }));
    }

    #[test]
    fn full_spec_values() {
        let param = TemplateParameter::new("spec", "Specification", ParameterKind::FullSpec);
        assert_eq!(
            param.spec_values(" +proj=utm +zone=32 ").unwrap(),
            vec!["+proj=utm +zone=32"]
        );
        assert_matches!(param.spec_values("  "), Err(GeorefError::InvalidParameter { .. }));
    }
}
