//! CRS templates: parametrized specifications of frequently used coordinate reference systems,
//! and the catalog they are looked up in.

mod registry;
mod template;

pub use registry::CrsTemplateRegistry;
pub use template::{substitute, CrsTemplate, ParameterKind, TemplateParameter};
