//! Error type used by the crate.

use thiserror::Error;

/// Georeferencing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeorefError {
    /// The CRS specification is malformed or not supported by the transformation engine.
    #[error("invalid CRS specification: {0}")]
    Build(String),
    /// The point lies outside the valid domain of the CRS or the transformation is degenerate
    /// at that point.
    #[error("coordinates cannot be transformed")]
    Transform,
    /// A template or resource with the given name does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A value was rejected by a template parameter or a setter.
    #[error("invalid value for {name}: {value:?}")]
    InvalidParameter {
        /// Name of the parameter.
        name: String,
        /// Rejected value.
        value: String,
    },
    /// The operation requires a projected CRS, but the georeferencing is local.
    #[error("no projected coordinate reference system")]
    Local,
}

impl GeorefError {
    pub(crate) fn invalid_parameter(name: &str, value: impl ToString) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}
