//! Schema system - document validation and project templates

pub mod registry;
pub mod template;
pub mod validator;

pub use registry::{DocumentKind, SchemaRegistry};
pub use template::{TemplateContext, TemplateGenerator};
pub use validator::{SchemaError, Validator};
