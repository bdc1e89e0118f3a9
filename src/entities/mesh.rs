//! Mesh (malla) cost configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::error::ConfigurationError;

/// Which materials roll up into the mesh line, and whether mesh labor applies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshConfiguration {
    /// Materials whose line cost is also reported as mesh cost
    #[serde(default)]
    pub material_ids: BTreeSet<String>,

    #[serde(default)]
    pub includes_labor: bool,

    /// Mesh labor per square meter; when absent, the best matching active
    /// `mesh` labor rule supplies the rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_rate_per_area: Option<f64>,
}

impl MeshConfiguration {
    pub fn contributes(&self, material_id: &str) -> bool {
        self.material_ids.contains(material_id)
    }

    pub fn with_materials(mut self, ids: &[&str]) -> Self {
        self.material_ids = ids.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_labor(mut self, rate_per_area: f64) -> Self {
        self.includes_labor = true;
        self.labor_rate_per_area = Some(rate_per_area);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.labor_rate_per_area {
            Some(rate) if !rate.is_finite() || rate < 0.0 => Err(ConfigurationError::MalformedMesh(
                format!("labor_rate_per_area {} must be zero or positive", rate),
            )),
            _ => Ok(()),
        }
    }
}
