//! Opening dimensions and the formula variable environment

use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;
use crate::core::formula::Environment;

/// Variables every formula can reference
pub const BUILTIN_VARIABLES: &[&str] = &[
    "ancho",
    "alto",
    "area",
    "perimetro",
    "malla",
    "hojas",
    "divisiones_horizontales",
    "divisiones_verticales",
    "divisiones_decorativas",
];

/// Physical size of a window or door, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    #[serde(rename = "ancho")]
    pub width: f64,

    #[serde(rename = "alto")]
    pub height: f64,

    /// Horizontal splits (transoms)
    #[serde(default)]
    pub divisiones_horizontales: u32,

    /// Vertical splits (mullions); leaves = splits + 1
    #[serde(default)]
    pub divisiones_verticales: u32,

    /// Decorative muntins
    #[serde(default)]
    pub divisiones_decorativas: u32,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Result<Self, ValidationError> {
        let dims = Self {
            width,
            height,
            divisiones_horizontales: 0,
            divisiones_verticales: 0,
            divisiones_decorativas: 0,
        };
        dims.validate()?;
        Ok(dims)
    }

    /// Width and height must be finite and strictly positive
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(ValidationError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    /// Number of leaves (sashes)
    ///
    /// Computed in f64 so the largest split count still yields one more leaf.
    pub fn leaves(&self) -> f64 {
        f64::from(self.divisiones_verticales) + 1.0
    }

    /// Build the variable environment seen by material formulas
    pub fn environment(&self, with_mesh: bool) -> Environment {
        let mut env = Environment::new();
        env.insert("ancho".to_string(), self.width);
        env.insert("alto".to_string(), self.height);
        env.insert("area".to_string(), self.area());
        env.insert("perimetro".to_string(), self.perimeter());
        env.insert("malla".to_string(), if with_mesh { 1.0 } else { 0.0 });
        env.insert("hojas".to_string(), self.leaves());
        env.insert(
            "divisiones_horizontales".to_string(),
            f64::from(self.divisiones_horizontales),
        );
        env.insert(
            "divisiones_verticales".to_string(),
            f64::from(self.divisiones_verticales),
        );
        env.insert(
            "divisiones_decorativas".to_string(),
            f64::from(self.divisiones_decorativas),
        );
        env
    }
}
