//! Core module - formula language, errors, configuration and loading

pub mod config;
pub mod error;
pub mod formula;
pub mod loader;
pub mod project;

pub use config::Config;
pub use error::{ConfigurationError, PricingError, ValidationError};
pub use formula::{Environment, Formula, FormulaError};
pub use project::{Project, ProjectError};
